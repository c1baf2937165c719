//! Manual overrides for scenes whose system name is not unique per id.
//! Grounded in `original_source/sandrock/lib/sceneinfo.py`'s commented-out
//! assertion and its accompanying note: ids 60 and 90 each have several
//! system names in the scene-info bundle, which the original silently
//! tolerates by never actually enforcing the bijection it claims to build.
//! We enforce it instead, by picking one canonical name per id here and
//! keeping the rest only as forward-lookup aliases.

use crate::model::SceneId;

/// `(id, canonical system name, other known aliases)`.
pub const OVERRIDES: &[(i64, &str, &[&str])] = &[
    (60, "VoxelDungeon2", &["BuriedRoomTest"]),
    (90, "InfiniteTrialDungeon", &["TrialDungeon_Infinite", "RollerCoaster"]),
];

/// Returns the canonical name forced for `id`, if any override applies.
pub fn canonical_name_for(id: SceneId) -> Option<&'static str> {
    OVERRIDES.iter().find(|(oid, _, _)| *oid == id.get()).map(|(_, name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ambiguous_ids_have_a_canonical_name() {
        assert_eq!(canonical_name_for(SceneId(60)), Some("VoxelDungeon2"));
        assert_eq!(canonical_name_for(SceneId(90)), Some("InfiniteTrialDungeon"));
        assert_eq!(canonical_name_for(SceneId(5)), None);
    }
}
