//! Provenance accumulation and the main/secondary split (spec §3, §4.8
//! Post-processing). Grounded in `original_source/sandrock/item_source_new/*`'s
//! `defaultdict(set)` of tuple-of-strings sources, and in
//! `DesignerConfig.ItemSourceData`'s own nominal-category hints for deciding
//! which of an item's sources is its "main" one.

use std::collections::{BTreeMap, BTreeSet};

use crate::generator::expand_with_metadata;
use crate::model::{GeneratorGroupId, ItemId};
use crate::registry::Registry;
use crate::tables::TypedTables;

/// One provenance path, e.g. `["store", "store:3"]` — a tuple of tags in the
/// original's own order, joined only at output time.
pub type ItemSource = Vec<String>;

/// Every source discovered for every item, across both resolver phases.
pub type Provenance = BTreeMap<ItemId, BTreeSet<ItemSource>>;

fn source_of(tags: &[&str]) -> ItemSource {
    tags.iter().map(|t| t.to_string()).collect()
}

/// `results[item_id].add(source)`.
pub fn add_source(results: &mut Provenance, item_id: ItemId, tags: &[&str]) {
    results.entry(item_id).or_default().insert(source_of(tags));
}

/// `update_generator`: expands a generator group and attaches `tags` as the
/// source of every non-inert outcome.
pub fn add_generator(results: &mut Provenance, registry: &Registry, tags: &[&str], group_id: i64) {
    if crate::tables::BLOCKED_GENERATOR_GROUPS.contains(&group_id) {
        return;
    }
    for outcome in expand_with_metadata(registry, GeneratorGroupId(group_id)) {
        add_source(results, outcome.item_id, tags);
    }
}

/// `update_mail`'s item-attachment walk: a `MailTemplate` entry's `attachData`
/// list, type `1` attachments being items.
pub fn add_mail_items(results: &mut Provenance, mail: &serde_json::Value, tags: &[&str]) {
    let Some(attachments) = mail.get("attachData").and_then(serde_json::Value::as_array) else { return };
    for attach in attachments {
        if crate::tables::field_i64(attach, "type") != Some(1) {
            continue;
        }
        if let Some(item_id) = attach.get("data").and_then(|d| d.get("id")).and_then(serde_json::Value::as_i64) {
            add_source(results, ItemId(item_id), tags);
        }
    }
}

/// Fixed category-alias table matching a provenance source's leading tag
/// against `ItemSourceData.categories`' free-form strings, used to decide
/// which of an item's several sources is the game's own nominal "main"
/// source (spec §4.8 Post-processing; Open Question: no exhaustive alias
/// list survives in the retrieved source, so this is a representative,
/// honestly partial mapping rather than a fabricated complete one).
fn category_aliases(tag: &str) -> &'static [&'static str] {
    match tag {
        "store" => &["store", "shop"],
        "crafting" => &["crafting", "craft", "assemble"],
        "monster" => &["monster", "combat"],
        "gathering" => &["gathering", "resource"],
        "salvaging" => &["salvaging", "resource"],
        "fishing" => &["fishing"],
        "farming" => &["farming"],
        "mission" => &["mission", "quest"],
        "recycle" => &["recycle"],
        "ore_refining" => &["refining", "ore"],
        "container" => &["container"],
        _ => &[],
    }
}

/// Every source whose leading tag matches one of the item's own
/// `ItemSourceData.categories` entries, grounded in `item_source.py`'s
/// `find_matches`.
fn matching_sources(sources: &BTreeSet<ItemSource>, categories: &[String]) -> BTreeSet<ItemSource> {
    sources
        .iter()
        .filter(|source| {
            let Some(tag) = source.first() else { return false };
            categories.iter().any(|cat| category_aliases(tag).contains(&cat.as_str()))
        })
        .cloned()
        .collect()
}

/// `get_main_sources`: the set of sources that count as "main" for an item.
/// When at least one source matches a nominal category, main is that match
/// set plus every `store` source unconditionally (`item_source.py`: "Stores
/// are important sources; I say we always treat them as main sources").
/// When nothing matches, main is the *entire* source set — the original's
/// `if not main_sources: main_sources = formatted` fallback, not an empty
/// set.
fn main_sources(sources: &BTreeSet<ItemSource>, categories: &[String]) -> BTreeSet<ItemSource> {
    let matched = matching_sources(sources, categories);
    if matched.is_empty() {
        return sources.clone();
    }
    let mut main = matched;
    main.extend(sources.iter().filter(|s| s.first().map(String::as_str) == Some("store")).cloned());
    main
}

/// Marriable-NPC rosters (all, female-only, male-only), grounded in
/// `item_source_new.py::all_spouses_in_source`: `canLove == 1`, excluding
/// the one non-romanceable NPC whose `nameID` is hardcoded as an exception.
struct SpouseRosters {
    all: BTreeSet<i64>,
    female: BTreeSet<i64>,
    male: BTreeSet<i64>,
}

fn spouse_rosters(tables: &TypedTables, registry: &Registry) -> Result<SpouseRosters, crate::error::AtlasError> {
    let actors_by_templet: BTreeMap<i64, i64> =
        tables.actor(registry)?.iter().map(|a| (a.id, a.gender)).collect();

    let mut all = BTreeSet::new();
    let mut female = BTreeSet::new();
    let mut male = BTreeSet::new();

    for npc in tables.npc(registry)? {
        if npc.can_love != 1 || npc.name_id == crate::tables::NON_ROMANCEABLE_NPC_NAME_ID {
            continue;
        }
        all.insert(npc.id);
        match actors_by_templet.get(&npc.templet_id) {
            Some(1) => {
                female.insert(npc.id);
            }
            Some(0) => {
                male.insert(npc.id);
            }
            _ => {}
        }
    }

    Ok(SpouseRosters { all, female, male })
}

/// Collapses, for each item, an `("npc", "spouse_gift" | "spouse_gift_expecting",
/// "npc:<id>")` source set that exactly covers one of the marriable rosters
/// into a single `"all_spouses"` / `"all_female_spouses"` /
/// `"all_male_spouses"` source (spec §4.8 Edge cases: spouse-gift
/// aggregation), grounded in `item_source_new.py::get_npc`.
pub fn aggregate_spouse_gifts(
    provenance: &mut Provenance,
    tables: &TypedTables,
    registry: &Registry,
) -> Result<(), crate::error::AtlasError> {
    let rosters = spouse_rosters(tables, registry)?;

    for sources in provenance.values_mut() {
        for event in ["spouse_gift", "spouse_gift_expecting"] {
            let npc_ids: BTreeSet<i64> = sources
                .iter()
                .filter(|s| s.len() == 3 && s[0] == "npc" && s[1] == event)
                .filter_map(|s| s[2].strip_prefix("npc:").and_then(|id| id.parse::<i64>().ok()))
                .collect();
            if npc_ids.is_empty() {
                continue;
            }

            let collapsed = if npc_ids == rosters.all {
                Some("all_spouses")
            } else if npc_ids == rosters.female {
                Some("all_female_spouses")
            } else if npc_ids == rosters.male {
                Some("all_male_spouses")
            } else {
                None
            };

            if let Some(token) = collapsed {
                sources.retain(|s| !(s.len() == 3 && s[0] == "npc" && s[1] == event));
                sources.insert(source_of(&["npc", event, token]));
            }
        }
    }
    Ok(())
}

/// Splits every item's provenance into its main sources (the set matching
/// its nominal category plus every store source, or the whole set when
/// nothing matches) and its secondary sources (everything left over), per
/// spec §4.8 Post-processing.
pub struct SplitProvenance {
    pub main: Provenance,
    pub secondary: Provenance,
}

pub fn split(provenance: &Provenance, tables: &TypedTables, registry: &Registry) -> Result<SplitProvenance, crate::error::AtlasError> {
    let item_source_data = tables.item_source_data(registry)?;
    let categories: BTreeMap<ItemId, &[String]> =
        item_source_data.iter().map(|d| (d.item_id, d.categories.as_slice())).collect();

    let mut main = Provenance::new();
    let mut secondary = Provenance::new();

    for (&item_id, sources) in provenance {
        let cats = categories.get(&item_id).copied().unwrap_or(&[]);
        let chosen = main_sources(sources, cats);
        let rest: BTreeSet<ItemSource> = sources.difference(&chosen).cloned().collect();
        if !chosen.is_empty() {
            main.insert(item_id, chosen);
        }
        if !rest.is_empty() {
            secondary.insert(item_id, rest);
        }
    }

    Ok(SplitProvenance { main, secondary })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_source_dedupes_identical_tuples() {
        let mut results = Provenance::new();
        add_source(&mut results, ItemId(1), &["store", "store:3"]);
        add_source(&mut results, ItemId(1), &["store", "store:3"]);
        assert_eq!(results[&ItemId(1)].len(), 1);
    }

    #[test]
    fn main_sources_includes_every_category_match() {
        let mut sources = BTreeSet::new();
        sources.insert(source_of(&["crafting", "assemble"]));
        sources.insert(source_of(&["store", "store:3"]));
        let categories = vec!["store".to_string()];
        let chosen = main_sources(&sources, &categories);
        assert!(chosen.contains(&source_of(&["store", "store:3"])));
        assert!(!chosen.contains(&source_of(&["crafting", "assemble"])));
    }

    /// Spec §4.8 Post-processing: a store source is always main, even when
    /// a *different*, matching nominal category would otherwise "win".
    #[test]
    fn store_source_is_main_unconditionally_alongside_a_category_match() {
        let mut sources = BTreeSet::new();
        sources.insert(source_of(&["fishing", "spot:1"]));
        sources.insert(source_of(&["store", "store:3"]));
        let categories = vec!["fishing".to_string()];
        let chosen = main_sources(&sources, &categories);
        assert!(chosen.contains(&source_of(&["fishing", "spot:1"])));
        assert!(chosen.contains(&source_of(&["store", "store:3"])));
    }

    /// Spec §4.8 Post-processing: when nothing matches any nominal
    /// category, every source is main (not, as a naive reading might
    /// suggest, none of them).
    #[test]
    fn no_category_match_means_everything_is_main() {
        let mut sources = BTreeSet::new();
        sources.insert(source_of(&["crafting", "assemble"]));
        sources.insert(source_of(&["monster", "drop:1"]));
        let categories = vec!["fishing".to_string()];
        let chosen = main_sources(&sources, &categories);
        assert_eq!(chosen, sources);
    }

    #[test]
    fn split_puts_store_and_matching_category_in_main_and_rest_in_secondary() {
        let dir = tempfile::tempdir().unwrap();
        write_table(dir.path(), "ItemSourceData", serde_json::json!([{"itemId": 42, "categories": ["fishing"]}]));
        let registry = Registry::new(dir.path());
        let tables = TypedTables::default();

        let mut provenance = Provenance::new();
        add_source(&mut provenance, ItemId(42), &["fishing", "spot:1"]);
        add_source(&mut provenance, ItemId(42), &["store", "store:3"]);
        add_source(&mut provenance, ItemId(42), &["crafting", "assemble"]);

        let split_result = split(&provenance, &tables, &registry).unwrap();
        let main = &split_result.main[&ItemId(42)];
        assert!(main.contains(&source_of(&["fishing", "spot:1"])));
        assert!(main.contains(&source_of(&["store", "store:3"])));
        assert!(!main.contains(&source_of(&["crafting", "assemble"])));

        let secondary = &split_result.secondary[&ItemId(42)];
        assert_eq!(secondary.len(), 1);
        assert!(secondary.contains(&source_of(&["crafting", "assemble"])));
    }

    #[test]
    fn split_with_no_category_match_puts_everything_in_main() {
        let dir = tempfile::tempdir().unwrap();
        write_table(dir.path(), "ItemSourceData", serde_json::json!([{"itemId": 42, "categories": ["fishing"]}]));
        let registry = Registry::new(dir.path());
        let tables = TypedTables::default();

        let mut provenance = Provenance::new();
        add_source(&mut provenance, ItemId(42), &["crafting", "assemble"]);
        add_source(&mut provenance, ItemId(42), &["monster", "drop:1"]);

        let split_result = split(&provenance, &tables, &registry).unwrap();
        assert_eq!(split_result.main[&ItemId(42)], provenance[&ItemId(42)]);
        assert!(!split_result.secondary.contains_key(&ItemId(42)));
    }

    fn write_table(dir: &std::path::Path, table: &str, config_list: serde_json::Value) {
        std::fs::write(
            dir.join(format!("{table}.json")),
            serde_json::json!({"configList": config_list}).to_string(),
        )
        .unwrap();
    }

    /// Spec §4.8 Edge cases: when every marriable NPC of a gender gives the
    /// same item via the same event, the per-NPC sources collapse to one
    /// token; a partial match (one NPC missing) is left alone.
    #[test]
    fn spouse_gift_aggregation_collapses_a_complete_gendered_roster() {
        let dir = tempfile::tempdir().unwrap();
        write_table(
            dir.path(),
            "Npc",
            serde_json::json!([
                {"id": 1, "canLove": 1, "nameID": 1, "templetID": 10},
                {"id": 2, "canLove": 1, "nameID": 2, "templetID": 10},
                {"id": 3, "canLove": 1, "nameID": 3, "templetID": 20},
            ]),
        );
        write_table(dir.path(), "Actor", serde_json::json!([{"id": 10, "gender": 1}, {"id": 20, "gender": 0}]));

        let registry = Registry::new(dir.path());
        let tables = TypedTables::default();

        let mut provenance = Provenance::new();
        add_source(&mut provenance, ItemId(500), &["npc", "spouse_gift", "npc:1"]);
        add_source(&mut provenance, ItemId(500), &["npc", "spouse_gift", "npc:2"]);
        add_source(&mut provenance, ItemId(600), &["npc", "spouse_gift", "npc:1"]);

        aggregate_spouse_gifts(&mut provenance, &tables, &registry).unwrap();

        let item_500 = &provenance[&ItemId(500)];
        assert_eq!(item_500.len(), 1);
        assert_eq!(item_500.iter().next().unwrap()[2], "all_female_spouses");

        let item_600 = &provenance[&ItemId(600)];
        assert_eq!(item_600.len(), 1);
        assert_eq!(item_600.iter().next().unwrap()[2], "npc:1");
    }
}
