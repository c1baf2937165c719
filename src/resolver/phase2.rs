//! Phase 2: the crafting/farming/fishing/container fixpoint (spec §4.8).
//! Grounded in `original_source/sandrock/item_source_new/craft.py`'s
//! `update_crafting` family and `item_source_new/main.py::update_containers`.
//! The outer loop shape (`prev_total = -1; while len(results) > prev_total`)
//! is the older `item_source/main.py::get_item_sources`'s driver, which is
//! the only place the full fixpoint is wired together explicitly.

use crate::context::Atlas;
use crate::diagnostics::{self, FindingKey};
use crate::error::AtlasError;
use crate::model::ItemId;
use crate::tables::TypedTables;

use super::provenance::{add_generator, add_source, Provenance};
use super::unlockers;

/// Runs every dependent extraction repeatedly until provenance stops
/// growing, per spec §4.8's "loop until fixpoint" contract.
pub fn run(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let mut previous_total = -1_i64;
    while (results.len() as i64) > previous_total {
        previous_total = results.len() as i64;
        update_crafting(atlas, results)?;
        update_farming(atlas, results)?;
        update_fishing(atlas, results)?;
        update_containers(atlas, results)?;
        update_machine_upgrades(atlas, results)?;
    }
    Ok(())
}

fn update_crafting(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    update_assembly(atlas, results)?;
    update_crafting_stations(atlas, results)?;
    update_recycle(atlas, results)?;
    update_cooking(atlas, results)?;
    update_restoring(atlas, results)?;
    update_ore_refining(atlas, results)?;
    Ok(())
}

fn has(results: &Provenance, item_id: ItemId) -> bool {
    results.contains_key(&item_id)
}

/// `update_assembly`: every material part of an `Creation` recipe must
/// already be a known source before the crafted item becomes one too.
fn update_assembly(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let tables = &atlas.tables;
    let registry = &atlas.registry;
    let parts_by_id: std::collections::BTreeMap<i64, &crate::tables::CreationPart> =
        tables.creation_part(registry)?.iter().map(|p| (p.id, p)).collect();

    for recipe in tables.creation(registry)? {
        let ready = recipe.part_ids.iter().all(|part_id| {
            parts_by_id.get(part_id).map(|part| has(results, part.material.x)).unwrap_or(false)
        });
        if ready {
            add_source(results, recipe.item_id, &["crafting", "assemble", &recipe.from_machine_level.to_string()]);
        }
    }
    Ok(())
}

/// `update_crafting_stations`: a `Synthetics` recipe is ready once every raw
/// material is available AND at least one recipe unlocker is available.
fn update_crafting_stations(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let tables = &atlas.tables;
    let registry = &atlas.registry;
    let unlocker_table = unlockers::build(tables, registry)?;

    for recipe in tables.synthetics(registry)? {
        let materials_ready = recipe.raw_materials.iter().all(|mat| has(results, mat.x));
        if !materials_ready {
            continue;
        }
        let unlock_ready = unlocker_table
            .get(&recipe.item_id)
            .map(|ids| ids.iter().any(|id| has(results, *id)))
            .unwrap_or(false);
        if !unlock_ready {
            continue;
        }
        let machine = unlockers::find_machine(tables, registry, recipe.from_machine_type, recipe.from_machine_level)?;
        let tag = match machine {
            Some(machine_id) => format!("item:{}", machine_id.get()),
            None => {
                diagnostics::warn(FindingKey::MissingMachine)
                    .msg(format!(
                        "no machine found for type {} level {} (recipe item {})",
                        recipe.from_machine_type,
                        recipe.from_machine_level,
                        recipe.item_id.get()
                    ))
                    .push();
                format!("{}:{}", recipe.from_machine_type, recipe.from_machine_level)
            }
        };
        add_source(results, recipe.item_id, &["crafting", &tag]);
    }
    Ok(())
}

/// `update_recycle`: the item being recycled must itself already be a known
/// source; its generator groups then contribute their own outcomes.
fn update_recycle(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let tables = &atlas.tables;
    let registry = &atlas.registry;
    let recipes: Vec<_> = tables.recycle(registry)?.to_vec();
    for recipe in recipes {
        if !has(results, recipe.id) {
            continue;
        }
        let tag = format!("item:{}", recipe.id.get());
        for &group in &recipe.back_generator_ids {
            add_generator(results, registry, &["recycle", &tag], group);
        }
    }
    Ok(())
}

/// `update_cooking`.
fn update_cooking(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let tables = &atlas.tables;
    let registry = &atlas.registry;
    let formulas_by_id: std::collections::BTreeMap<i64, &crate::tables::CookingFormula> =
        tables.cooking_formula(registry)?.iter().map(|f| (f.id, f)).collect();

    for cook in tables.cooking(registry)? {
        let Some(recipe) = formulas_by_id.get(&cook.formula_id) else { continue };
        if !recipe.is_active {
            continue;
        }
        let ready = recipe.materials.iter().all(|&mat| has(results, mat));
        if ready {
            add_source(results, cook.out_item_id, &["crafting", "cooking", &recipe.cooking_type.to_string()]);
        }
    }
    Ok(())
}

/// `update_restoring`: relic restoration.
fn update_restoring(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let tables = &atlas.tables;
    let registry = &atlas.registry;
    for recipe in tables.restore(registry)? {
        let ready = recipe.parts_item_ids.iter().all(|&part| has(results, part));
        if ready {
            add_source(results, recipe.id, &["relic"]);
        }
    }
    Ok(())
}

/// `update_ore_refining`.
fn update_ore_refining(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let tables = &atlas.tables;
    let registry = &atlas.registry;
    let recipes: Vec<_> = tables.screening(registry)?.to_vec();
    for recipe in recipes {
        if !has(results, recipe.id) {
            continue;
        }
        let tag = format!("item:{}", recipe.id.get());
        for &group in &recipe.generator_ids {
            add_generator(results, registry, &["ore_refining", &tag], group);
        }
    }
    Ok(())
}

/// `update_containers`: run last within each fixpoint round so containers
/// that only just became available aren't skipped (spec §4.8's explicit
/// "do this last" ordering note, carried from the original's own comment).
fn update_containers(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let tables = &atlas.tables;
    let registry = &atlas.registry;
    let containers: Vec<_> = tables.item_use(registry)?.to_vec();
    for container in containers {
        if !has(results, container.id) {
            continue;
        }
        add_generator(results, registry, &["container", &format!("item:{}", container.id.get())], container.generator_group_id);
    }
    Ok(())
}

/// `update_farming`: a crop's produce becomes a source once its seed item
/// is itself a known source (spec §4.8 Phase 2 step 2).
fn update_farming(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let tables = &atlas.tables;
    let registry = &atlas.registry;
    let crops: Vec<_> = tables.crop(registry)?.to_vec();
    for crop in crops {
        if !has(results, crop.seed_item_id) {
            continue;
        }
        let tag = format!("crop:{}", crop.id);
        for &produced in &crop.produce_item_ids {
            add_source(results, produced, &["farming", &tag]);
        }
    }
    Ok(())
}

/// `update_fishing`: a fishing spot's catchable fish become sources once
/// its bait item is itself a known source (spec §4.8 Phase 2 step 3).
fn update_fishing(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let tables = &atlas.tables;
    let registry = &atlas.registry;
    let spots: Vec<_> = tables.fishing_spot(registry)?.to_vec();
    for spot in spots {
        if !has(results, spot.bait_item_id) {
            continue;
        }
        let tag = format!("spot:{}", spot.id);
        add_generator(results, registry, &["fishing", &tag], spot.generator_group_id);
    }
    Ok(())
}

/// `update_machine_upgrades`: a tier-2+ machine becomes a source once its
/// previous tier and every one of its upgrade materials are themselves
/// known sources (spec §4.8 Phase 2 step 5). The original's own
/// `update_machine_upgrades` only checks the previous tier ("being lazy and
/// not checking if the upgrade materials exist"); spec §4.8 is explicit
/// that materials must also be known, so this implementation follows the
/// spec rather than the original's laxer shortcut (see DESIGN.md).
fn update_machine_upgrades(atlas: &Atlas, results: &mut Provenance) -> Result<(), AtlasError> {
    let tables = &atlas.tables;
    let registry = &atlas.registry;
    let machines: Vec<_> = tables.machine(registry)?.to_vec();
    for machine in &machines {
        if machine.level <= 1 {
            continue;
        }
        if machine.upgrade_materials.is_empty() {
            continue;
        }
        let previous = machines.iter().find(|m| m.tag == machine.tag && m.level == machine.level - 1);
        let Some(previous) = previous else { continue };
        if !has(results, ItemId(previous.id)) {
            continue;
        }
        let materials_ready = machine.upgrade_materials.iter().all(|mat| has(results, mat.x));
        if materials_ready {
            add_source(results, ItemId(machine.id), &["machine_upgrade"]);
        }
    }
    Ok(())
}
