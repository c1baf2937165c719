//! `Asset`: a single serialized object within a bundle. Grounded verbatim
//! in `original_source/sandrock/lib/asset.py`'s `Asset` class.
//!
//! Unlike the Python original, an `Asset` here does not hold a reference
//! back to its owning `Bundle` (no garbage collector to paper over the
//! cycle); instead `Bundle` exposes the graph-navigation methods
//! (`game_object_of`, `components_of`, `transform_of`) that the original
//! put on `Asset` itself. Callers write `bundle.components_of(asset)`
//! instead of `asset.components()`.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde_json::Value;

use crate::error::AtlasError;

#[derive(Debug, Clone, PartialEq)]
pub enum AssetData {
    /// `TextAsset` — raw text; also the path mission XML is read through.
    Text(String),
    /// Everything else (`MonoBehaviour` as well as `GameObject`/
    /// `Transform`/other dumped types) is parsed as JSON. `GameObject`
    /// component-graph navigation (`m_Component`, `m_GameObject`) depends
    /// on this being structured data, so the catch-all "raw dump" of
    /// spec §4.1 is JSON here, not opaque bytes.
    Json(Value),
}

#[derive(Debug)]
pub struct Asset {
    pub id: i64,
    pub type_name: String,
    pub name: Option<String>,
    data: OnceLock<AssetData>,
}

impl Asset {
    pub fn new(id: i64, type_name: String, name: Option<String>) -> Asset {
        Asset { id, type_name, name, data: OnceLock::new() }
    }

    /// `Asset.path` — the backing file's relative location, `ext` depends
    /// on type (`json` for `MonoBehaviour`, `txt` otherwise).
    pub fn relative_path(&self) -> PathBuf {
        let ext = if self.type_name == "MonoBehaviour" { "json" } else { "txt" };
        let file_name = match &self.name {
            Some(name) if !name.is_empty() => format!("{name} @{}.{ext}", self.id),
            _ => format!("{}.{ext}", self.id),
        };
        PathBuf::from(&self.type_name).join(file_name)
    }

    /// `Asset.data` — lazily reads and parses the backing file; repeated
    /// calls return the same cached value.
    pub fn load_data(&self, bundle_path: &Path) -> Result<&AssetData, AtlasError> {
        if let Some(data) = self.data.get() {
            return Ok(data);
        }
        let full_path = bundle_path.join(self.relative_path());
        let text = std::fs::read_to_string(&full_path)
            .map_err(|_| AtlasError::AssetNotFound { path: full_path.clone() })?;

        let loaded = if self.type_name == "TextAsset" {
            AssetData::Text(text)
        } else {
            let value: Value = serde_json::from_str(&text).map_err(|e| AtlasError::ParseError {
                path: full_path.clone(),
                message: e.to_string(),
            })?;
            AssetData::Json(value)
        };
        Ok(self.data.get_or_init(|| loaded))
    }

    /// `Asset.script` — only valid for `MonoBehaviour`; resolves the
    /// `m_Script.m_PathID` reference through the bundle's script side table.
    pub fn script_path_id(&self, bundle_path: &Path) -> Result<Option<i64>, AtlasError> {
        if self.type_name != "MonoBehaviour" {
            return Ok(None);
        }
        let data = self.load_data(bundle_path)?;
        let AssetData::Json(value) = data else { return Ok(None) };
        Ok(value.get("m_Script").and_then(|s| s.get("m_PathID")).and_then(Value::as_i64))
    }

    /// Extracts `m_Component[*].component.m_PathID` from a `GameObject`'s
    /// data, used by `Bundle::components_of`/`transform_of`.
    pub fn component_path_ids(&self, bundle_path: &Path) -> Result<Vec<i64>, AtlasError> {
        if self.type_name != "GameObject" {
            return Ok(Vec::new());
        }
        let data = self.load_data(bundle_path)?;
        let AssetData::Json(value) = data else { return Ok(Vec::new()) };
        let ids = value
            .get("m_Component")
            .and_then(Value::as_array)
            .map(|components| {
                components
                    .iter()
                    .filter_map(|c| c.get("component").and_then(|c| c.get("m_PathID")).and_then(Value::as_i64))
                    .collect()
            })
            .unwrap_or_default();
        Ok(ids)
    }

    /// Extracts `m_GameObject.m_PathID` from a component's data, used by
    /// `Bundle::game_object_of`.
    pub fn owning_game_object_id(&self, bundle_path: &Path) -> Result<Option<i64>, AtlasError> {
        let data = self.load_data(bundle_path)?;
        let AssetData::Json(value) = data else { return Ok(None) };
        Ok(value.get("m_GameObject").and_then(|g| g.get("m_PathID")).and_then(Value::as_i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_path_uses_name_when_present() {
        let asset = Asset::new(42, "MonoBehaviour".to_string(), Some("Foo".to_string()));
        assert_eq!(asset.relative_path(), PathBuf::from("MonoBehaviour/Foo @42.json"));
    }

    #[test]
    fn relative_path_falls_back_to_id_only() {
        let asset = Asset::new(42, "TextAsset".to_string(), None);
        assert_eq!(asset.relative_path(), PathBuf::from("TextAsset/42.txt"));
    }
}
