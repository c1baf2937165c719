//! Recipe unlockers (spec §4.8): for each craftable item, the set of other
//! item ids whose presence in provenance means the recipe itself is
//! unlocked. Grounded verbatim in
//! `original_source/sandrock/item_source_new/craft.py::_get_recipe_unlockers`
//! and `_find_machine`.

use std::collections::BTreeMap;

use crate::error::AtlasError;
use crate::model::ItemId;
use crate::registry::Registry;
use crate::tables::TypedTables;

/// Basic worktable recipes, unlocked by the `BLUEPRINT UNLOCK GROUP` script
/// rather than any acquirable item — item_tag `85`.
const WORKTABLE_ITEM_ID: i64 = 13000001;
/// Basic assembly-station recipes — item_tag `86`.
const ASSEMBLY_STATION_ITEM_ID: i64 = 13000004;
/// Research Center blueprints are unlocked by data discs, hardcoded in the
/// original rather than looked up.
const DATA_DISC_ITEM_ID: i64 = 19200001;

/// `item_id -> [unlocker item ids]`, any one of which being already in
/// provenance is enough to consider the recipe unlocked.
pub fn build(tables: &TypedTables, registry: &Registry) -> Result<BTreeMap<ItemId, Vec<ItemId>>, AtlasError> {
    let mut unlockers: BTreeMap<ItemId, Vec<ItemId>> = BTreeMap::new();

    for item in tables.item_prototype(registry)? {
        if item.item_tag.contains(&85) {
            unlockers.insert(item.id, vec![ItemId(WORKTABLE_ITEM_ID)]);
        }
        if item.item_tag.contains(&86) {
            unlockers.insert(item.id, vec![ItemId(ASSEMBLY_STATION_ITEM_ID)]);
        }
    }

    for machine in tables.machine(registry)? {
        for &product in &machine.unlock_blueprint_ids {
            unlockers.entry(product).or_default().push(ItemId(machine.id));
        }
    }

    let item_prototype_ids: std::collections::BTreeSet<ItemId> =
        tables.item_prototype(registry)?.iter().map(|item| item.id).collect();
    for blueprint in tables.blueprint(registry)? {
        if item_prototype_ids.contains(&ItemId(blueprint.book_id)) {
            unlockers.entry(blueprint.id).or_default().push(ItemId(blueprint.book_id));
        }
    }

    for research_item in tables.research_item(registry)? {
        unlockers.insert(research_item.blueprint_id, vec![ItemId(DATA_DISC_ITEM_ID)]);
    }

    for use_ in tables.item_use(registry)? {
        for &unlocked in &use_.unlock_ids {
            unlockers.entry(unlocked).or_default().push(use_.id);
        }
    }

    Ok(unlockers)
}

/// `_find_machine`: the machine id of the given type/level, level `0`
/// treated as level `1` (a recipe's "fromMachineLevel" of 0 still needs the
/// base machine). Returns `None` when no matching machine is configured
/// (the original falls back to a `"{type}:{level}"` placeholder string;
/// here the absence is surfaced to the caller instead of fabricating an id).
pub fn find_machine(tables: &TypedTables, registry: &Registry, machine_type: i64, level: i64) -> Result<Option<ItemId>, AtlasError> {
    let level = if level == 0 { 1 } else { level };
    for machine in tables.machine(registry)? {
        if machine.tag == machine_type && machine.level == level {
            return Ok(Some(ItemId(machine.id)));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_match_the_original_hardcoded_ids() {
        assert_eq!(WORKTABLE_ITEM_ID, 13_000_001);
        assert_eq!(ASSEMBLY_STATION_ITEM_ID, 13_000_004);
        assert_eq!(DATA_DISC_ITEM_ID, 19_200_001);
    }
}
