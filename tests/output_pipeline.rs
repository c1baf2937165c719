//! End-to-end artifact rendering: a resolved, split provenance map goes
//! through categorization and both serializers, and the resulting text
//! obeys spec §6's escaping/quoting/float-rounding rules.

use std::collections::BTreeMap;

use harvestlore_atlas::model::ItemId;
use harvestlore_atlas::output::{categorize, lua, yaml};
use harvestlore_atlas::resolver::{Provenance, SplitProvenance};

fn tags(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

fn sample_split() -> SplitProvenance {
    let mut main = Provenance::new();
    main.entry(ItemId(9001)).or_default().insert(tags(&["store", "store:1"]));
    main.entry(ItemId(9002)).or_default().insert(tags(&["crafting", "item:13000001"]));

    let mut secondary = Provenance::new();
    secondary.entry(ItemId(9001)).or_default().insert(tags(&["container", "item:500"]));

    SplitProvenance { main, secondary }
}

#[test]
fn categories_each_render_as_independent_lua_and_yaml_artifacts() {
    let split = sample_split();
    let categories = categorize::categorize(&split);

    let store_category = categories.iter().find(|c| c.tag == "store").expect("store category present");
    assert_eq!(store_category.items, vec![ItemId(9001)]);

    let config_list = serde_json::json!([
        {"id": 9001, "mainSources": ["store:store:1"], "secondarySources": ["container:item:500"]},
    ]);

    let lua_text = lua::render("1.0.0", &store_category.tag, &config_list);
    assert!(lua_text.starts_with("return {"));
    assert!(lua_text.contains("key = \"store\""));
    assert!(lua_text.contains("id = 9001"));
    assert!(lua_text.contains("mainSources = {"));
    assert!(lua_text.contains("\"store:store:1\""));

    let yaml_text = yaml::render(&config_list);
    assert!(yaml_text.contains("id: 9001"));
    assert!(yaml_text.contains("mainSources:"));
    assert!(yaml_text.contains("store:store:1"));
}

#[test]
fn lua_output_escapes_special_characters_in_string_values() {
    let config_list = serde_json::json!([{"description": "a \"quoted\"\nvalue\\here"}]);
    let text = lua::render("1.0.0", "Weird", &config_list);
    assert!(text.contains("\\\"quoted\\\""));
    assert!(text.contains("\\n"));
    assert!(text.contains("\\\\here"));
}

#[test]
fn items_with_only_secondary_sources_land_in_uncategorized() {
    let mut secondary = Provenance::new();
    secondary.entry(ItemId(42)).or_default().insert(tags(&["recycle", "item:1"]));
    let split = SplitProvenance { main: BTreeMap::new(), secondary };

    let categories = categorize::categorize(&split);
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].tag, categorize::UNCATEGORIZED);
    assert_eq!(categories[0].items, vec![ItemId(42)]);
}
