//! `Bundle`: a directory of serialized game assets with an XML index.
//! Grounded in `original_source/sandrock/lib/asset.py`'s `Bundle` class.

use std::path::{Path, PathBuf};

use crate::assets::asset::Asset;
use crate::assets::manifest::parse_manifest;
use crate::error::AtlasError;
use crate::helpers::FnvHashMap;

pub struct Bundle {
    pub path: PathBuf,
    pub assets: Vec<Asset>,
    /// `MonoScript`-typed manifest entries populate `path_id → script_name`,
    /// used to classify `MonoBehaviour` assets (`Asset.script`).
    pub scripts: FnvHashMap<i64, String>,
    index_by_id: FnvHashMap<i64, usize>,
}

impl Bundle {
    /// `Bundle.__init__`: reads `assets.xml`, classifies by type, and
    /// builds the `path_id → Asset` / script side-table views.
    pub fn open(path: impl Into<PathBuf>) -> Result<Bundle, AtlasError> {
        let path = path.into();
        let manifest_path = path.join("assets.xml");
        let entries = parse_manifest(&manifest_path)?;

        let mut assets = Vec::new();
        let mut scripts = FnvHashMap::default();
        let mut index_by_id = FnvHashMap::default();

        for entry in entries {
            if entry.type_name == "MonoScript" {
                if let Some(name) = entry.name {
                    scripts.insert(entry.path_id, name);
                }
            } else {
                let asset = Asset::new(entry.path_id, entry.type_name, entry.name);
                index_by_id.insert(asset.id, assets.len());
                assets.push(asset);
            }
        }

        Ok(Bundle { path, assets, scripts, index_by_id })
    }

    pub fn asset(&self, path_id: i64) -> Option<&Asset> {
        self.index_by_id.get(&path_id).map(|&i| &self.assets[i])
    }

    pub fn behaviours(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(|a| a.type_name == "MonoBehaviour")
    }

    /// Resolves a `MonoBehaviour` asset's script name through the
    /// `scripts` side table (`Asset.script`).
    pub fn script_name_of(&self, asset: &Asset) -> Result<Option<&str>, AtlasError> {
        let Some(script_id) = asset.script_path_id(&self.path)? else { return Ok(None) };
        Ok(self.scripts.get(&script_id).map(String::as_str))
    }

    /// `Asset.components` — every asset in the bundle whose path-id is
    /// among the game object's `m_Component` references.
    pub fn components_of(&self, game_object: &Asset) -> Result<Vec<&Asset>, AtlasError> {
        let comp_ids = game_object.component_path_ids(&self.path)?;
        Ok(self.assets.iter().filter(|a| comp_ids.contains(&a.id)).collect())
    }

    /// `Asset.transform` — the `Transform` component of a game object, if
    /// any.
    pub fn transform_of(&self, game_object: &Asset) -> Result<Option<&Asset>, AtlasError> {
        let comp_ids = game_object.component_path_ids(&self.path)?;
        Ok(self.assets.iter().find(|a| a.type_name == "Transform" && comp_ids.contains(&a.id)))
    }

    /// `Asset.game_object` — the `GameObject` that owns `component`, found
    /// by matching `component`'s id against every game object's
    /// `m_Component` list. A missing owner is a `DanglingReference`.
    pub fn game_object_of(&self, component: &Asset) -> Result<&Asset, AtlasError> {
        let Some(owner_id) = component.owning_game_object_id(&self.path)? else {
            return Err(AtlasError::DanglingReference {
                bundle: self.path.display().to_string(),
                path_id: component.id,
            });
        };
        self.assets
            .iter()
            .find(|a| a.type_name == "GameObject" && a.id == owner_id)
            .ok_or_else(|| AtlasError::DanglingReference {
                bundle: self.path.display().to_string(),
                path_id: owner_id,
            })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_bundle(dir: &Path) {
        fs::create_dir_all(dir.join("MonoBehaviour")).unwrap();
        fs::create_dir_all(dir.join("TextAsset")).unwrap();
        fs::write(
            dir.join("assets.xml"),
            r#"<Assets>
              <Asset><Container>c</Container><Name>Foo</Name><PathID>1</PathID><Type id="114">MonoBehaviour</Type></Asset>
              <Asset><Container>c</Container><Name>Script</Name><PathID>2</PathID><Type id="115">MonoScript</Type></Asset>
            </Assets>"#,
        )
        .unwrap();
        fs::write(dir.join("MonoBehaviour/Foo @1.json"), r#"{"m_Script":{"m_PathID":2},"value":42}"#).unwrap();
    }

    #[test]
    fn opens_and_classifies_assets() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path());
        let bundle = Bundle::open(dir.path()).unwrap();
        assert_eq!(bundle.assets.len(), 1, "MonoScript entries do not become Assets");
        assert_eq!(bundle.scripts.get(&2), Some(&"Script".to_string()));
    }

    #[test]
    fn resolves_script_name_through_side_table() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path());
        let bundle = Bundle::open(dir.path()).unwrap();
        let asset = bundle.asset(1).unwrap();
        assert_eq!(bundle.script_name_of(asset).unwrap(), Some("Script"));
    }

    #[test]
    fn missing_manifest_is_asset_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Bundle::open(dir.path()).unwrap_err();
        assert!(matches!(err, AtlasError::AssetNotFound { .. }));
    }
}
