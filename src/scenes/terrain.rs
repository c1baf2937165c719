//! Terrain tree discovery (spec §4.8 Phase 1: "terrain trees
//! (logging/quarrying)"). Grounded verbatim in
//! `original_source/sandrock/preproc/terrain_tree.py`: every `TerrainData`
//! asset's `m_DetailDatabase` carries its own `m_TreePrototypes` (indexed by
//! a `prefab` `GameObject` reference) and `m_TreeInstances` (each pointing
//! at one prototype by index, with its own placement).
//!
//! Unlike `preprocessor.rs`'s interest points, a tree instance carries no
//! behaviour script of its own to classify by — it's pure terrain-painter
//! data, so this module reads `TerrainData` assets directly rather than
//! walking `MonoBehaviour`s.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::assets::{AssetData, Bundle};
use crate::error::AtlasError;
use crate::helpers::FnvHashMap;

/// One placed tree, with the scene it was found in and the prefab
/// `GameObject`'s own name (e.g. `"Tree_Pine_01"`), which is as far as this
/// layer goes — mapping a prefab name to the item(s) it drops is the
/// resolver's job.
#[derive(Debug, Clone)]
pub struct TerrainTree {
    pub scene: String,
    pub prefab: String,
}

fn tree_prototypes(db: &Value) -> Vec<i64> {
    db.get("m_TreePrototypes")
        .and_then(|p| p.get("Array"))
        .and_then(Value::as_array)
        .map(|protos| {
            protos
                .iter()
                .filter_map(|p| p.get("prefab").and_then(|r| r.get("m_PathID")).and_then(Value::as_i64))
                .collect()
        })
        .unwrap_or_default()
}

fn tree_instance_indices(db: &Value) -> Vec<i64> {
    db.get("m_TreeInstances")
        .and_then(|i| i.get("Array"))
        .and_then(Value::as_array)
        .map(|instances| instances.iter().filter_map(|i| i.get("index").and_then(Value::as_i64)).collect())
        .unwrap_or_default()
}

/// `find_scene_trees`: every tree instance in one bundle, resolved to its
/// prototype's owning `GameObject` name.
pub fn find_scene_trees(scene_path: &Path) -> Result<Vec<TerrainTree>, AtlasError> {
    let scene_name = scene_path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
    let bundle = Bundle::open(scene_path)?;

    let mut game_object_names: FnvHashMap<i64, &str> = FnvHashMap::default();
    for asset in &bundle.assets {
        if asset.type_name == "GameObject" {
            if let Some(name) = &asset.name {
                game_object_names.insert(asset.id, name.as_str());
            }
        }
    }

    let mut trees = Vec::new();
    for asset in &bundle.assets {
        if asset.type_name != "TerrainData" {
            continue;
        }
        let AssetData::Json(data) = asset.load_data(bundle.path())? else { continue };
        let Some(db) = data.get("m_DetailDatabase") else { continue };
        let prototypes = tree_prototypes(db);

        for index in tree_instance_indices(db) {
            let Some(&prefab_id) = prototypes.get(index as usize) else { continue };
            let Some(&prefab) = game_object_names.get(&prefab_id) else { continue };
            trees.push(TerrainTree { scene: scene_name.clone(), prefab: prefab.to_string() });
        }
    }

    Ok(trees)
}

/// `find_terrain_trees`: every tree in every scene under `scene/additive`
/// and every seasonal variant under `season`, directory-sorted like
/// `find_interest_points`.
pub fn find_terrain_trees(assets_root: &Path) -> Result<Vec<TerrainTree>, AtlasError> {
    let mut trees = Vec::new();
    for root_name in ["scene/additive", "season"] {
        let root = assets_root.join(root_name);
        let Ok(entries) = std::fs::read_dir(&root) else { continue };
        let mut dirs: Vec<PathBuf> = entries.filter_map(Result::ok).map(|e| e.path()).filter(|p| p.is_dir()).collect();
        dirs.sort();
        for dir in dirs {
            trees.extend(find_scene_trees(&dir)?);
        }
    }
    Ok(trees)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_scene_with_tree(dir: &Path) {
        fs::create_dir_all(dir.join("GameObject")).unwrap();
        fs::create_dir_all(dir.join("TerrainData")).unwrap();
        fs::write(
            dir.join("assets.xml"),
            r#"<Assets>
              <Asset><Container>c</Container><Name>Tree_Pine_01</Name><PathID>5</PathID><Type id="1">GameObject</Type></Asset>
              <Asset><Container>c</Container><Name>Terrain</Name><PathID>6</PathID><Type id="156">TerrainData</Type></Asset>
            </Assets>"#,
        )
        .unwrap();
        fs::write(dir.join("GameObject/Tree_Pine_01 @5.json"), r#"{"m_Component":[]}"#).unwrap();
        fs::write(
            dir.join("TerrainData/Terrain @6.json"),
            serde_json::json!({
                "m_DetailDatabase": {
                    "m_TreePrototypes": {"Array": [{"prefab": {"m_PathID": 5}}]},
                    "m_TreeInstances": {"Array": [{"index": 0, "position": {"x": 1.0, "y": 0.0, "z": 2.0}}]},
                }
            })
            .to_string(),
        )
        .unwrap();
    }

    #[test]
    fn resolves_a_tree_instance_to_its_prefab_name() {
        let dir = tempfile::tempdir().unwrap();
        let scene_dir = dir.path().join("Scene1");
        fs::create_dir_all(&scene_dir).unwrap();
        write_scene_with_tree(&scene_dir);

        let trees = find_scene_trees(&scene_dir).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].prefab, "Tree_Pine_01");
        assert_eq!(trees[0].scene, "Scene1");
    }

    #[test]
    fn walks_every_scene_and_season_directory() {
        let dir = tempfile::tempdir().unwrap();
        let scene_dir = dir.path().join("scene").join("additive").join("Scene1");
        fs::create_dir_all(&scene_dir).unwrap();
        write_scene_with_tree(&scene_dir);

        let trees = find_terrain_trees(dir.path()).unwrap();
        assert_eq!(trees.len(), 1);
    }
}
