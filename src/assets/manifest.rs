//! Parses a bundle's `assets.xml` index (spec §6). Grounded verbatim in
//! `original_source/sandrock/lib/asset.py`'s `_ManifestXml`: the JSON
//! manifest path in the original is commented-out dead code, so only the
//! XML form is implemented here (DESIGN.md Open Question #1).

use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::AtlasError;

#[derive(Debug, Clone)]
pub struct AssetInfo {
    pub container: Option<String>,
    pub name: Option<String>,
    pub path_id: i64,
    pub type_name: String,
    pub type_id: i64,
}

/// Parses the `<Assets><Asset>...</Asset></Assets>` document at `path` into
/// one `AssetInfo` per `<Asset>` child, matching `_ManifestXml.__iter__`'s
/// field extraction exactly (`Container`, `Name`, `PathID`, `Type` with its
/// `id` attribute).
pub fn parse_manifest(path: &Path) -> Result<Vec<AssetInfo>, AtlasError> {
    let text = std::fs::read_to_string(path).map_err(|_| AtlasError::AssetNotFound { path: path.to_path_buf() })?;
    parse_manifest_str(&text).map_err(|message| AtlasError::ParseError { path: path.to_path_buf(), message })
}

fn parse_manifest_str(text: &str) -> Result<Vec<AssetInfo>, String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut assets = Vec::new();
    let mut buf = Vec::new();

    // Per-<Asset> accumulator state.
    let mut in_asset = false;
    let mut container = None;
    let mut name = None;
    let mut path_id = None;
    let mut type_name = None;
    let mut type_id = None;
    let mut current_tag = String::new();

    loop {
        match reader.read_event_into(&mut buf).map_err(|e| e.to_string())? {
            Event::Eof => break,
            Event::Start(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "Asset" {
                    in_asset = true;
                    container = None;
                    name = None;
                    path_id = None;
                    type_name = None;
                    type_id = None;
                } else if tag == "Type" && in_asset {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"id" {
                            let value = attr.unescape_value().map_err(|e| e.to_string())?;
                            type_id = value.parse::<i64>().ok();
                        }
                    }
                }
                current_tag = tag;
            }
            Event::Empty(e) => {
                // A self-closing <Type id="..."/> with no text child.
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "Type" && in_asset {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"id" {
                            let value = attr.unescape_value().map_err(|e| e.to_string())?;
                            type_id = value.parse::<i64>().ok();
                        }
                    }
                }
            }
            Event::Text(e) => {
                if !in_asset {
                    continue;
                }
                let text = e.unescape().map_err(|e| e.to_string())?.to_string();
                match current_tag.as_str() {
                    "Container" => container = Some(text),
                    "Name" => name = Some(text),
                    "PathID" => path_id = text.parse::<i64>().ok(),
                    "Type" => type_name = Some(text),
                    _ => {}
                }
            }
            Event::End(e) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "Asset" && in_asset {
                    let path_id = path_id.ok_or_else(|| "Asset missing PathID".to_string())?;
                    let type_name = type_name.clone().ok_or_else(|| "Asset missing Type".to_string())?;
                    assets.push(AssetInfo {
                        container: container.clone(),
                        name: name.clone(),
                        path_id,
                        type_name,
                        type_id: type_id.unwrap_or(0),
                    });
                    in_asset = false;
                }
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(assets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
    <Assets>
      <Asset>
        <Container>assets/foo.json</Container>
        <Name>FooBehavior</Name>
        <PathID>1001</PathID>
        <Type id="114">MonoBehaviour</Type>
      </Asset>
      <Asset>
        <Container>assets/bar.txt</Container>
        <Name></Name>
        <PathID>1002</PathID>
        <Type id="115">TextAsset</Type>
      </Asset>
    </Assets>"#;

    #[test]
    fn parses_two_assets() {
        let assets = parse_manifest_str(SAMPLE).unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].path_id, 1001);
        assert_eq!(assets[0].type_name, "MonoBehaviour");
        assert_eq!(assets[0].type_id, 114);
        assert_eq!(assets[1].path_id, 1002);
        assert_eq!(assets[1].type_name, "TextAsset");
    }

    #[test]
    fn missing_file_is_asset_not_found() {
        let err = parse_manifest(Path::new("/nonexistent/assets.xml")).unwrap_err();
        assert!(matches!(err, AtlasError::AssetNotFound { .. }));
    }
}
