//! Groups a resolved, split provenance map into wiki-ready categories
//! (spec §4.9; mirrors `sandrock/script/item_source*.py`'s final grouping
//! step, which bins items by the leading tag of their nominal source before
//! handing the result to the page-writing scripts).

use std::collections::BTreeMap;

use crate::model::ItemId;
use crate::resolver::SplitProvenance;

/// One output category: a leading source tag (`"store"`, `"crafting"`, …)
/// and the items whose main source carries it, in ascending item-id order.
#[derive(Debug, Clone)]
pub struct Category {
    pub tag: String,
    pub items: Vec<ItemId>,
}

/// The tag used for items with no main source at all (only secondary
/// sources, or none discovered) — the original leaves these for manual
/// wiki-editor attention rather than guessing.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Groups every item by the leading tag of its first main source (in
/// `BTreeSet` order, so deterministic even when several main sources carry
/// different leading tags), falling back to [`UNCATEGORIZED`] when an item
/// has no main source at all. Categories are returned in alphabetical tag
/// order; items within a category in ascending id order, matching the
/// deterministic `BTreeMap` iteration already used throughout provenance.
pub fn categorize(split: &SplitProvenance) -> Vec<Category> {
    let mut by_tag: BTreeMap<String, Vec<ItemId>> = BTreeMap::new();

    for (&item_id, sources) in &split.main {
        let tag = sources.iter().next().and_then(|s| s.first().cloned()).unwrap_or_else(|| UNCATEGORIZED.to_string());
        by_tag.entry(tag).or_default().push(item_id);
    }

    let all_ids: std::collections::BTreeSet<ItemId> =
        split.main.keys().copied().chain(split.secondary.keys().copied()).collect();
    for item_id in all_ids {
        if !split.main.contains_key(&item_id) {
            by_tag.entry(UNCATEGORIZED.to_string()).or_default().push(item_id);
        }
    }

    by_tag.into_iter().map(|(tag, mut items)| {
        items.sort();
        items.dedup();
        Category { tag, items }
    }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Provenance;

    fn source(tags: &[&str]) -> Vec<String> {
        tags.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn items_with_no_main_source_fall_back_to_uncategorized() {
        let mut secondary = Provenance::new();
        secondary.entry(ItemId(1)).or_default().insert(source(&["crafting", "assemble"]));
        let split = SplitProvenance { main: BTreeMap::new(), secondary };
        let categories = categorize(&split);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].tag, UNCATEGORIZED);
        assert_eq!(categories[0].items, vec![ItemId(1)]);
    }

    #[test]
    fn items_group_by_main_source_leading_tag() {
        let mut main = Provenance::new();
        main.entry(ItemId(1)).or_default().insert(source(&["store", "store:3"]));
        main.entry(ItemId(2)).or_default().insert(source(&["store", "store:4"]));
        let split = SplitProvenance { main, secondary: Provenance::new() };
        let categories = categorize(&split);
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].tag, "store");
        assert_eq!(categories[0].items, vec![ItemId(1), ItemId(2)]);
    }
}
