//! Narrow, table-specific wrappers over the generic `Registry` accessor
//! (spec §4.2, §9 "narrow accessors wrap the generic indexing primitive").
//!
//! Each wrapper deserializes the records of one named designer-config table
//! into a concrete Rust struct the first time it's asked for, and memoizes
//! the typed `Vec`. Field names/shapes are grounded directly in
//! `original_source/sandrock/item_source_new/craft.py` and
//! `designer_configs.py`.

use std::sync::OnceLock;

use serde::Deserialize;
use serde_json::Value;

use crate::error::AtlasError;
use crate::model::{Generator, GeneratorGroup, Item, ItemId};
use crate::registry::Registry;

/// A known-incorrect drop table, patched by hard-coded id (spec §4.8 Edge
/// cases; Open Question #3). Empty until a concrete offending id is
/// actually observed — see DESIGN.md Open Question resolutions.
pub const BLOCKED_GENERATOR_GROUPS: &[i64] = &[];

/// Maps a terrain tree's prefab name (exact match) to the item it drops and
/// whether that counts as `logging` or `quarrying` (spec §4.8 Phase 1).
/// Open Question: the original's own `.terrain` module (`update_terrain`,
/// imported by `sandrock/item_source/main.py`) was never retrieved, so the
/// real prefab-to-item table is unknown. Empty until a concrete prefab
/// mapping is actually observed; see DESIGN.md Open Question resolutions.
pub const TERRAIN_TREE_ITEMS: &[(&str, i64, &str)] = &[];

fn load_typed<T: for<'de> Deserialize<'de>>(registry: &Registry, table: &str) -> Result<Vec<T>, AtlasError> {
    let view = registry.table(table)?;
    view.iter()
        .map(|value| {
            serde_json::from_value(value.clone()).map_err(|e| AtlasError::SchemaMismatch {
                context: format!("table {table}"),
                expected: std::any::type_name::<T>().to_string(),
                found: e.to_string(),
            })
        })
        .collect()
}

/// `DesignerConfig.Creation` — assembly-station recipes, `craft.py::update_assembly`.
#[derive(Debug, Clone, Deserialize)]
pub struct Creation {
    pub id: i64,
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    #[serde(rename = "fromMachineLevel")]
    pub from_machine_level: i64,
    #[serde(rename = "partIds")]
    pub part_ids: Vec<i64>,
}

/// `DesignerConfig.CreationPart` — one material slot of a `Creation` recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct CreationPart {
    pub id: i64,
    pub material: MaterialRef,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaterialRef {
    pub x: ItemId,
}

/// `DesignerConfig.Synthetics` — crafting-station recipes,
/// `craft.py::update_crafting_stations`.
#[derive(Debug, Clone, Deserialize)]
pub struct Synthetics {
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    #[serde(rename = "fromMachineType")]
    pub from_machine_type: i64,
    #[serde(rename = "fromMachineLevel")]
    pub from_machine_level: i64,
    #[serde(rename = "rawMaterials")]
    pub raw_materials: Vec<MaterialRef>,
}

/// `DesignerConfig.Recycle` — `craft.py::update_recycle`.
#[derive(Debug, Clone, Deserialize)]
pub struct Recycle {
    pub id: ItemId,
    #[serde(rename = "machineLevel")]
    pub machine_level: i64,
    #[serde(rename = "backGeneratorIds")]
    pub back_generator_ids: Vec<i64>,
}

/// `DesignerConfig.CookingFormula` — `craft.py::update_cooking`.
#[derive(Debug, Clone, Deserialize)]
pub struct CookingFormula {
    pub id: i64,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    pub materials: Vec<ItemId>,
    #[serde(rename = "cookingType")]
    pub cooking_type: i64,
}

/// `DesignerConfig.Cooking` — links a formula to its output item.
#[derive(Debug, Clone, Deserialize)]
pub struct Cooking {
    #[serde(rename = "formulaId")]
    pub formula_id: i64,
    #[serde(rename = "outItemId")]
    pub out_item_id: ItemId,
}

/// `DesignerConfig.Restore` — relic restoration, `craft.py::update_restoring`.
#[derive(Debug, Clone, Deserialize)]
pub struct Restore {
    pub id: ItemId,
    #[serde(rename = "partsItemIds")]
    pub parts_item_ids: Vec<ItemId>,
}

/// `DesignerConfig.Screening` — ore refining, `craft.py::update_ore_refining`.
#[derive(Debug, Clone, Deserialize)]
pub struct Screening {
    pub id: ItemId,
    #[serde(rename = "generatorIds")]
    pub generator_ids: Vec<i64>,
}

/// `DesignerConfig.Machine` — crafting-station machines.
#[derive(Debug, Clone, Deserialize)]
pub struct Machine {
    pub id: i64,
    pub tag: i64,
    pub level: i64,
    #[serde(rename = "unlockBlueprintIds", default)]
    pub unlock_blueprint_ids: Vec<ItemId>,
    #[serde(rename = "upgradeMaterials", default)]
    pub upgrade_materials: Vec<MaterialRef>,
}

/// `DesignerConfig.Crop` — a plantable seed and the items its growth cycle
/// produces, `craft.py`-family `update_farming` (farm_fish.py counterpart
/// not present in the retrieved source; fields reconstructed in the same
/// seed-then-produce shape spec §4.8 describes; see DESIGN.md).
#[derive(Debug, Clone, Deserialize)]
pub struct Crop {
    pub id: i64,
    #[serde(rename = "seedItemId")]
    pub seed_item_id: ItemId,
    #[serde(rename = "produceItemIds", default)]
    pub produce_item_ids: Vec<ItemId>,
}

/// `DesignerConfig.FishingSpot` — a bait requirement and the generator group
/// of catchable fish, `update_fishing` (same reconstruction caveat as
/// `Crop`).
#[derive(Debug, Clone, Deserialize)]
pub struct FishingSpot {
    pub id: i64,
    #[serde(rename = "baitItemId")]
    pub bait_item_id: ItemId,
    #[serde(rename = "generatorGroupId")]
    pub generator_group_id: i64,
}

/// `DesignerConfig.Npc` — marriage-eligible NPC roster, grounded in
/// `item_source_new.py::all_spouses_in_source`/`get_npc` (spouse-gift
/// aggregation).
#[derive(Debug, Clone, Deserialize)]
pub struct Npc {
    pub id: i64,
    #[serde(rename = "canLove", default)]
    pub can_love: i64,
    #[serde(rename = "nameID", default)]
    pub name_id: i64,
    #[serde(rename = "templetID")]
    pub templet_id: i64,
}

/// The sentinel `nameID` `item_source_new.py` excludes from the marriable
/// roster (a non-romanceable NPC who otherwise has `canLove == 1`).
pub const NON_ROMANCEABLE_NPC_NAME_ID: i64 = 30020001;

/// `DesignerConfig.Actor` — gender lookup keyed by `templetID`, `0` = male,
/// `1` = female (`item_source_new.py::all_spouses_in_source`).
#[derive(Debug, Clone, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub gender: i64,
}

/// `DesignerConfig.Blueprint` — recipe books.
#[derive(Debug, Clone, Deserialize)]
pub struct Blueprint {
    pub id: ItemId,
    #[serde(rename = "bookId")]
    pub book_id: i64,
}

/// `DesignerConfig.ResearchItem` — research-center data discs.
#[derive(Debug, Clone, Deserialize)]
pub struct ResearchItem {
    #[serde(rename = "blueprintId")]
    pub blueprint_id: ItemId,
}

/// `DesignerConfig.ItemUse` — container generator groups, also a recipe
/// unlocker source (`craft.py::_get_recipe_unlockers`'s last loop).
#[derive(Debug, Clone, Deserialize)]
pub struct ItemUse {
    pub id: ItemId,
    #[serde(rename = "unLockIDs", default)]
    pub unlock_ids: Vec<ItemId>,
    #[serde(rename = "generatorGroupId")]
    pub generator_group_id: i64,
}

/// `DesignerConfig.StoreBaseData` → `SellProduct` join target for the
/// temp-item skip rule (spec §8 scenario 4).
#[derive(Debug, Clone, Deserialize)]
pub struct SellProduct {
    pub id: i64,
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    #[serde(rename = "globalStr", default)]
    pub global_str: String,
}

/// `DesignerConfig.ItemSourceData` — the game's own nominal-source hints,
/// used to split provenance into main vs. secondary (spec §4.8
/// Post-processing).
#[derive(Debug, Clone, Deserialize)]
pub struct ItemSourceData {
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    /// Free-form category strings (e.g. `"fishing"`, `"gathering"`),
    /// matched against provenance source tags via a fixed alias table
    /// (`resolver::provenance::category_aliases`).
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Thin cache over `Registry` providing typed access to every table the
/// resolver touches repeatedly. Built once per run and held by `Atlas`
/// (`src/context.rs`).
#[derive(Default)]
pub struct TypedTables {
    pub item_prototype: OnceLock<Vec<Item>>,
    pub generator_item: OnceLock<Vec<Generator>>,
    pub generator_group: OnceLock<Vec<GeneratorGroup>>,
    pub creation: OnceLock<Vec<Creation>>,
    pub creation_part: OnceLock<Vec<CreationPart>>,
    pub synthetics: OnceLock<Vec<Synthetics>>,
    pub recycle: OnceLock<Vec<Recycle>>,
    pub cooking_formula: OnceLock<Vec<CookingFormula>>,
    pub cooking: OnceLock<Vec<Cooking>>,
    pub restore: OnceLock<Vec<Restore>>,
    pub screening: OnceLock<Vec<Screening>>,
    pub machine: OnceLock<Vec<Machine>>,
    pub blueprint: OnceLock<Vec<Blueprint>>,
    pub research_item: OnceLock<Vec<ResearchItem>>,
    pub item_use: OnceLock<Vec<ItemUse>>,
    pub sell_product: OnceLock<Vec<SellProduct>>,
    pub item_source_data: OnceLock<Vec<ItemSourceData>>,
    pub crop: OnceLock<Vec<Crop>>,
    pub fishing_spot: OnceLock<Vec<FishingSpot>>,
    pub npc: OnceLock<Vec<Npc>>,
    pub actor: OnceLock<Vec<Actor>>,
}

macro_rules! accessor {
    ($name:ident, $field:ident, $ty:ty, $table:expr) => {
        pub fn $name(&self, registry: &Registry) -> Result<&[$ty], AtlasError> {
            if let Some(v) = self.$field.get() {
                return Ok(v);
            }
            let loaded = load_typed::<$ty>(registry, $table)?;
            Ok(self.$field.get_or_init(|| loaded))
        }
    };
}

impl TypedTables {
    accessor!(item_prototype, item_prototype, Item, "ItemPrototype");
    accessor!(generator_item, generator_item, Generator, "Generator_Item");
    accessor!(generator_group, generator_group, GeneratorGroup, "GeneratorGroup");
    accessor!(creation, creation, Creation, "Creation");
    accessor!(creation_part, creation_part, CreationPart, "CreationPart");
    accessor!(synthetics, synthetics, Synthetics, "Synthetics");
    accessor!(recycle, recycle, Recycle, "Recycle");
    accessor!(cooking_formula, cooking_formula, CookingFormula, "CookingFormula");
    accessor!(cooking, cooking, Cooking, "Cooking");
    accessor!(restore, restore, Restore, "Restore");
    accessor!(screening, screening, Screening, "Screening");
    accessor!(machine, machine, Machine, "Machine");
    accessor!(blueprint, blueprint, Blueprint, "Blueprint");
    accessor!(research_item, research_item, ResearchItem, "ResearchItem");
    accessor!(item_use, item_use, ItemUse, "ItemUse");
    accessor!(sell_product, sell_product, SellProduct, "SellProduct");
    accessor!(item_source_data, item_source_data, ItemSourceData, "ItemSourceData");
    accessor!(crop, crop, Crop, "Crop");
    accessor!(fishing_spot, fishing_spot, FishingSpot, "FishingSpot");
    accessor!(npc, npc, Npc, "Npc");
    accessor!(actor, actor, Actor, "Actor");
}

/// Looks up a field by name on a raw JSON record as an `i64`, for the
/// looser-schema phase-1 extractions in `resolver/phase1.rs` that don't
/// warrant a dedicated struct (mirrors the original's own dynamic-dict
/// indexing for one-off tables).
pub fn field_i64(record: &Value, field: &str) -> Option<i64> {
    record.get(field).and_then(Value::as_i64)
}

pub fn field_str<'a>(record: &'a Value, field: &str) -> Option<&'a str> {
    record.get(field).and_then(Value::as_str)
}

pub fn field_array<'a>(record: &'a Value, field: &str) -> Option<&'a Vec<Value>> {
    record.get(field).and_then(Value::as_array)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_generator_groups_defaults_empty() {
        assert!(BLOCKED_GENERATOR_GROUPS.is_empty());
    }

    #[test]
    fn field_helpers_read_loose_json() {
        let record: Value = serde_json::json!({"scene": 60, "name": "X", "ids": [1, 2]});
        assert_eq!(field_i64(&record, "scene"), Some(60));
        assert_eq!(field_str(&record, "name"), Some("X"));
        assert_eq!(field_array(&record, "ids").unwrap().len(), 2);
    }
}
