//! Scene Index (spec §4.4): a name ↔ id mapping built by scanning the
//! `sceneinfo` bundle's `SceneInfoObj` behaviors. Grounded verbatim in
//! `original_source/sandrock/lib/sceneinfo.py`'s `_SceneInfoEngine`.

use std::collections::BTreeSet;

use bimap::BiMap;
use serde_json::Value;

use crate::assets::Bundle;
use crate::error::AtlasError;
use crate::helpers::FnvHashMap;
use crate::model::SceneId;
use crate::scenes::overrides;

/// The four per-area-kind lists a `SceneInfoObj` payload carries, each an
/// array of records with a `scene` field. Mirrors
/// `get_scene_id_from_data`'s `data_to_check`.
const DATA_KEYS: &[&str] = &["sceneAreaDatas", "sceneDramaDatas", "sceneExtranceDatas", "scenePointDatas"];

/// Extracts the single scene id present across a `SceneInfoObj`'s area,
/// drama, entrance, and point lists. `PlayerHome` carries none of these by
/// default, so it's special-cased to id 5 exactly as the original does.
fn scene_id_from_data(data: &Value) -> Result<i64, AtlasError> {
    let mut ids: BTreeSet<i64> = BTreeSet::new();
    for key in DATA_KEYS {
        if let Some(list) = data.get(*key).and_then(Value::as_array) {
            for item in list {
                if let Some(id) = item.get("scene").and_then(Value::as_i64) {
                    ids.insert(id);
                }
            }
        }
    }
    let is_player_home = data.get("m_Name").and_then(Value::as_str).map(|s| s.eq_ignore_ascii_case("playerhome")).unwrap_or(false);
    if is_player_home {
        ids.insert(5);
    }

    match ids.len() {
        1 => Ok(*ids.iter().next().expect("checked len == 1")),
        _ => Err(AtlasError::SchemaMismatch {
            context: "SceneInfoObj scene id".to_string(),
            expected: "exactly one scene id".to_string(),
            found: format!("{ids:?}"),
        }),
    }
}

/// Normalizes a system name for case/underscore-insensitive comparison,
/// matching `scene_id`'s `key.lower().replace('_', '')`.
fn normalize(name: &str) -> String {
    name.chars().filter(|&c| c != '_').flat_map(char::to_lowercase).collect()
}

/// Bijective `system_name ↔ scene_id` mapping, plus a forward-only alias
/// table for names the manual override table folds into a shared id.
pub struct SceneIndex {
    /// Canonical name ↔ id, asserted unique in both directions.
    canonical: BiMap<String, SceneId>,
    /// Every system name seen (including overridden aliases), normalized,
    /// for `scene_id` lookups.
    aliases: FnvHashMap<String, SceneId>,
}

impl SceneIndex {
    /// Scans every `SceneInfoObj` behavior in `bundle`, builds the raw
    /// name→id map, then folds in the manual overrides before asserting
    /// the final bijection. A name collision the override table doesn't
    /// cover is `SceneAmbiguous`.
    pub fn build(bundle: &Bundle) -> Result<SceneIndex, AtlasError> {
        let mut raw: FnvHashMap<String, i64> = FnvHashMap::default();

        for behaviour in bundle.behaviours() {
            if bundle.script_name_of(behaviour)? != Some("SceneInfoObj") {
                continue;
            }
            let data = behaviour.load_data(bundle.path())?;
            let crate::assets::AssetData::Json(value) = data else { continue };
            let id = scene_id_from_data(value)?;
            let name = value
                .get("m_Name")
                .and_then(Value::as_str)
                .ok_or_else(|| AtlasError::SchemaMismatch {
                    context: "SceneInfoObj".to_string(),
                    expected: "m_Name string".to_string(),
                    found: "missing".to_string(),
                })?
                .to_string();

            if raw.insert(name.clone(), id).is_some() {
                return Err(AtlasError::SceneAmbiguous { names: vec![name], ids: vec![id] });
            }
        }

        let mut aliases: FnvHashMap<String, SceneId> = FnvHashMap::default();
        for (name, id) in &raw {
            aliases.insert(normalize(name), SceneId(*id));
        }

        let mut by_id: FnvHashMap<i64, Vec<String>> = FnvHashMap::default();
        for (name, id) in &raw {
            by_id.entry(*id).or_default().push(name.clone());
        }

        let mut canonical = BiMap::new();
        for (id, mut names) in by_id {
            names.sort();
            let chosen = if names.len() == 1 {
                names.remove(0)
            } else if let Some(forced) = overrides::canonical_name_for(SceneId(id)) {
                forced.to_string()
            } else {
                return Err(AtlasError::SceneAmbiguous { names, ids: vec![id] });
            };
            canonical.insert(chosen, SceneId(id));
        }

        Ok(SceneIndex { canonical, aliases })
    }

    /// `scene_id(name)`: case/underscore-insensitive lookup across every
    /// known system name, including overridden aliases.
    pub fn scene_id(&self, name: &str) -> Option<SceneId> {
        self.aliases.get(&normalize(name)).copied()
    }

    /// `scene_system_name(id)`: the canonical (post-override) name.
    pub fn scene_system_name(&self, id: SceneId) -> Option<&str> {
        self.canonical.get_by_right(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}
