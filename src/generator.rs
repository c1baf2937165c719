//! Generator Expander (spec §4.6). Grounded verbatim in
//! `original_source/sandrock/lib/generator.py`: `expand_generator`,
//! `find_item_generators`, `_group_generator_ids`.

use std::collections::BTreeSet;

use crate::model::{Generator, GeneratorGroup, GeneratorGroupId, ItemId, RandomKind};
use crate::registry::Registry;

/// One fully-resolved outcome of a generator group's expansion, carrying
/// the probability and inclusive count range spec §4.6 asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outcome {
    pub item_id: ItemId,
    pub probability: f64,
    pub count_min: i64,
    pub count_max: i64,
}

/// `_group_generator_ids`: every non-inert-by-weight id in a group's
/// elements, preserving iteration order element by element.
fn group_generator_ids(group: &GeneratorGroup) -> Vec<i64> {
    let mut ids = Vec::new();
    for element in &group.elements {
        for id_weight in &element.id_weights {
            if id_weight.weight <= 0.0 {
                continue;
            }
            ids.push(id_weight.id.get());
        }
    }
    ids
}

fn load_group(registry: &Registry, group_id: GeneratorGroupId) -> Option<GeneratorGroup> {
    let table = registry.table("GeneratorGroup").ok()?;
    let value = table.get(group_id.get())?;
    serde_json::from_value(value.clone()).ok()
}

fn load_generator(registry: &Registry, generator_id: i64) -> Option<Generator> {
    let table = registry.table("Generator_Item").ok()?;
    let value = table.get(generator_id)?;
    serde_json::from_value(value.clone()).ok()
}

/// `expand_generator`: the union of non-inert outcomes' item ids across
/// every element of `group_id`.
pub fn expand(registry: &Registry, group_id: GeneratorGroupId) -> BTreeSet<ItemId> {
    let Some(group) = load_group(registry, group_id) else { return BTreeSet::new() };
    let mut item_ids = BTreeSet::new();
    for gen_id in group_generator_ids(&group) {
        let Some(generator) = load_generator(registry, gen_id) else { continue };
        if generator.is_inert() {
            continue;
        }
        item_ids.insert(generator.item_id);
    }
    item_ids
}

/// Full expansion with probability and count-range metadata, one
/// `Outcome` per non-inert id-weight per element. Probabilities are
/// computed per-element (each element's positive weights are normalized
/// against that element's own total), matching spec §4.6's "each element
/// contributes independently".
pub fn expand_with_metadata(registry: &Registry, group_id: GeneratorGroupId) -> Vec<Outcome> {
    let Some(group) = load_group(registry, group_id) else { return Vec::new() };
    let mut outcomes = Vec::new();

    for element in &group.elements {
        let total_weight: f64 = element.id_weights.iter().filter(|iw| iw.weight > 0.0).map(|iw| iw.weight).sum();
        if total_weight <= 0.0 {
            continue;
        }

        for id_weight in &element.id_weights {
            if id_weight.weight <= 0.0 {
                continue;
            }
            let Some(generator) = load_generator(registry, id_weight.id.get()) else { continue };
            if generator.is_inert() {
                continue;
            }

            let probability = id_weight.weight / total_weight;
            let (count_min, count_max) = count_range(&generator);
            outcomes.push(Outcome { item_id: generator.item_id, probability, count_min, count_max });
        }
    }

    outcomes
}

/// Count range by random-kind, per spec §4.6: fixed is `[p0, p0]`,
/// normal-symmetric is `[p0 - p1, p0 + p1]`, uniform is `[p0, p1]`. Min
/// floors toward 0, max ceilings away from 0.
fn count_range(generator: &Generator) -> (i64, i64) {
    let p0 = generator.parameters.first().copied().unwrap_or(0.0);
    let p1 = generator.parameters.get(1).copied().unwrap_or(0.0);

    let (raw_min, raw_max) = match generator.random_kind() {
        RandomKind::Fixed => (p0, p0),
        RandomKind::Normal => (p0 - p1, p0 + p1),
        RandomKind::UniformInt | RandomKind::UniformFloat => (p0, p1),
    };

    (floor_toward_zero(raw_min), ceil_away_from_zero(raw_max))
}

fn floor_toward_zero(value: f64) -> i64 {
    if value >= 0.0 { value.floor() as i64 } else { value.ceil() as i64 }
}

fn ceil_away_from_zero(value: f64) -> i64 {
    if value >= 0.0 { value.ceil() as i64 } else { value.floor() as i64 }
}

/// `find_item_generators` + the group reverse-lookup: every group that can
/// produce `item_id` through at least one of its generators.
pub fn find_generators_for(registry: &Registry, item_id: ItemId) -> BTreeSet<GeneratorGroupId> {
    let Ok(gen_table) = registry.table("Generator_Item") else { return BTreeSet::new() };
    let matching_gen_ids: BTreeSet<i64> = gen_table
        .iter()
        .filter_map(|v| serde_json::from_value::<Generator>(v.clone()).ok())
        .filter(|g| g.item_id == item_id)
        .map(|g| g.id.get())
        .collect();

    if matching_gen_ids.is_empty() {
        return BTreeSet::new();
    }

    let Ok(group_table) = registry.table("GeneratorGroup") else { return BTreeSet::new() };
    let mut group_ids = BTreeSet::new();
    for value in group_table.iter() {
        let Ok(group) = serde_json::from_value::<GeneratorGroup>(value.clone()) else { continue };
        if group_generator_ids(&group).iter().any(|id| matching_gen_ids.contains(id)) {
            group_ids.insert(group.id);
        }
    }
    group_ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeneratorGroupElement, IdWeight};

    fn group(elements: Vec<GeneratorGroupElement>) -> GeneratorGroup {
        GeneratorGroup { id: GeneratorGroupId(1), elements }
    }

    #[test]
    fn single_outcome_group_has_probability_one() {
        let g = group(vec![GeneratorGroupElement {
            id_weights: vec![IdWeight { id: crate::model::GeneratorId(1), weight: 100.0, luck_factor: 0.0 }],
        }]);
        let ids = group_generator_ids(&g);
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn zero_weight_id_weights_are_excluded() {
        let g = group(vec![GeneratorGroupElement {
            id_weights: vec![
                IdWeight { id: crate::model::GeneratorId(1), weight: 0.0, luck_factor: 0.0 },
                IdWeight { id: crate::model::GeneratorId(2), weight: 5.0, luck_factor: 0.0 },
            ],
        }]);
        assert_eq!(group_generator_ids(&g), vec![2]);
    }

    #[test]
    fn fixed_count_range_is_a_single_point() {
        let gen = Generator { id: crate::model::GeneratorId(1), item_id: ItemId(1), random_type: 0, parameters: vec![3.0] };
        assert_eq!(count_range(&gen), (3, 3));
    }

    #[test]
    fn normal_count_range_is_symmetric_around_p0() {
        let gen = Generator { id: crate::model::GeneratorId(1), item_id: ItemId(1), random_type: 1, parameters: vec![5.0, 2.0] };
        assert_eq!(count_range(&gen), (3, 7));
    }

    #[test]
    fn uniform_count_range_floors_min_and_ceils_max() {
        let gen = Generator { id: crate::model::GeneratorId(1), item_id: ItemId(1), random_type: 2, parameters: vec![1.4, 3.6] };
        assert_eq!(count_range(&gen), (1, 4));
    }
}
