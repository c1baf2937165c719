//! `wiki_item_name` disambiguation (spec §4.3), grounded line-for-line in
//! `original_source/sandrock/lib/text/wiki_item_names.py`. Assigns a unique
//! wiki-facing name to every item even when several items share a raw
//! display name.

use std::collections::BTreeMap;

use crate::diagnostics::{self, FindingKey};
use crate::helpers::FnvHashMap;
use crate::localization::Localization;
use crate::model::{Item, ItemId};

/// Manual overrides to force an id for a given name
/// (`wiki_item_names.py::priori`). Used minimally, for names this
/// algorithm otherwise cannot resolve.
fn priori() -> FnvHashMap<&'static str, ItemId> {
    [
        ("Cistanche", 16200019),
        ("Egg", 19300011),
        ("Fish Fossil Piece 1", 19210002),
        ("Sand Hat", 12200011),
        ("Sand Leek", 16200027),
        ("Spoon", 15300022),
        ("Tomato", 16200004),
        ("Tomato and Egg Soup", 15000012),
    ]
    .into_iter()
    .map(|(name, id)| (name, ItemId(id)))
    .collect()
}

/// One-off name variants (`non_standard_variant_names`). Assigning an id a
/// variant name here removes the item from the pool of items competing for
/// the base name.
fn non_standard_variant_names() -> FnvHashMap<i64, &'static str> {
    [
        (14000001, "Water Tank (assembly)"),
        (14000044, "Drill Arm (assembly)"),
        (15000124, "Spicy Bean Paste (dish)"),
        (15000170, "Spicy Bean Paste (ingredient)"),
        (15600005, "Passya Game Kid (toy)"),
        (19200004, "Processor (material)"),
        (19800034, "Plasticizer (material)"),
        (19810052, "Train Model (crafted)"),
        (85000124, "Spicy Bean Paste (book for dish)"),
        (85000170, "Spicy Bean Paste (book for ingredient)"),
    ]
    .into_iter()
    .collect()
}

/// Pet-accessory icon-path prefix → accessory kind suffix. The original
/// imports this table from elsewhere in its codebase; the full table was
/// not present in the retrieved source, so this is a representative,
/// data-driven stand-in with the same shape (prefix match on the lowercase
/// `maleIconPath`).
fn pets_with_accessories() -> FnvHashMap<&'static str, &'static str> {
    [("i_petaccessory_cat", "Cat"), ("i_petaccessory_dog", "Dog")].into_iter().collect()
}

/// DLC outfit character names matched against the lowercase icon path.
/// Same caveat as `pets_with_accessories`: representative stand-in.
fn dlc_outfit_characters() -> &'static [&'static str] {
    &["Logan", "Mi-an", "Elman", "Fang", "Amirah", "Qi"]
}

const NOT_USE_SENTINEL: &str = "\u{ffe5}not use\u{ffe5}";

/// Preemptively chooses a variant name even when there's no conflict yet,
/// matching `preemptively_choose_variant_name`.
fn preemptively_choose_variant_name(item: &Item, base_name: &str) -> String {
    if let Some(name) = non_standard_variant_names().get(&item.id.get()) {
        return (*name).to_string();
    }

    let id = item.id.get();
    if id > 70_000_000 && id < 80_000_000 && item.item_tag.contains(&5) {
        return format!("{base_name} (Style)");
    }
    if id > 81_000_000 && item.item_tag.contains(&5) {
        return format!("{base_name} (Book)");
    }

    let mip = item.male_icon_path.to_lowercase();
    if mip.starts_with("i_petaccessory") {
        for (key, kind) in pets_with_accessories() {
            if mip.contains(key) {
                return format!("{base_name} ({kind})");
            }
        }
    }

    base_name.to_string()
}

/// Chooses a variant name once a base-name conflict is known, matching
/// `choose_variant_name`.
fn choose_variant_name(item: &Item, base_name: &str) -> String {
    // Chromium Steel Bearings: possibly mismarked with tag 5 in the
    // original; the original's check there compares the builtin `id`
    // function, a latent bug we do not carry forward — every item simply
    // falls through to the icon-path checks below.
    let mip = item.male_icon_path.to_lowercase();
    if mip.is_empty() {
        return base_name.to_string();
    }

    if (mip.starts_with("item_book") || mip.starts_with("book_") || mip == "item_instructionbook")
        && !base_name.to_lowercase().ends_with("(book)")
    {
        return format!("{base_name} (Book)");
    }

    if mip.contains("dlc") {
        for character_name in dlc_outfit_characters() {
            if mip.contains(&character_name.to_lowercase()) {
                return format!("{base_name} ({character_name})");
            }
        }
    }

    base_name.to_string()
}

/// Parses a trailing `_N[_M...]` version suffix off a lowercase icon path,
/// returning `(base_path, version)`, matching `choose_item`'s regex-based
/// suffix parsing (`_(([0-9]+_?)+)$`).
fn split_icon_version(mip: &str) -> (String, f64) {
    let bytes: Vec<char> = mip.chars().collect();
    let mut end = bytes.len();
    let mut segments: Vec<String> = Vec::new();

    loop {
        // Find a trailing "_<digits>" segment.
        let Some(underscore) = bytes[..end].iter().rposition(|&c| c == '_') else { break };
        let digits: String = bytes[underscore + 1..end].iter().collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            break;
        }
        segments.push(digits);
        end = underscore;
    }

    if segments.is_empty() {
        return (mip.to_string(), 0.0);
    }

    segments.reverse();
    let version_str = segments.join(".");
    let version = version_str.parse::<f64>().unwrap_or(0.0);
    let base: String = bytes[..end].iter().collect();
    (base, version)
}

/// Picks the canonical item among a group of variant-name collisions,
/// matching `choose_item`'s three filters plus lowest-version-suffix
/// selection.
fn choose_item<'a>(candidates: &[&'a Item], localization: &Localization) -> Option<&'a Item> {
    let mut pool: Vec<&Item> = candidates.to_vec();

    // Filter 1: maleIconPath must not be the literal string "null".
    pool.retain(|item| item.male_icon_path.to_lowercase() != "null");
    if pool.is_empty() {
        return None;
    }
    if pool.len() == 1 {
        return Some(pool[0]);
    }

    // Filter 2: the item's infoId must resolve to non-empty text.
    pool.retain(|item| {
        localization
            .text(item.info_id, None, "  ")
            .map(|s| !s.is_empty())
            .unwrap_or(false)
    });
    if pool.is_empty() {
        return None;
    }
    if pool.len() == 1 {
        return Some(pool[0]);
    }

    // Filter 3: item id below 20000000.
    pool.retain(|item| item.id.get() < 20_000_000);
    if pool.is_empty() {
        return None;
    }
    if pool.len() == 1 {
        return Some(pool[0]);
    }

    // Favor the lowest-numbered icon-path version suffix, tie-broken by
    // lowest item id (the Python sorts by id first, then keeps the first
    // item seen at the lowest version).
    pool.sort_by_key(|item| item.id.get());

    let mut common_base: Option<String> = None;
    let mut lowest_version: Option<f64> = None;
    let mut lowest_item: Option<&Item> = None;

    for item in pool {
        let mip = item.male_icon_path.to_lowercase();
        let (base, version) = split_icon_version(&mip);

        match &common_base {
            None => common_base = Some(base),
            Some(existing) if *existing != base => {
                // Not color variants of the same base icon; bail out as
                // the original does (prints a warning and returns None).
                return None;
            }
            Some(_) => {}
        }

        if lowest_version.is_none() || version < lowest_version.unwrap() {
            lowest_version = Some(version);
            lowest_item = Some(item);
        }
    }

    lowest_item
}

/// Runs the full 5-step disambiguation algorithm over every item in
/// `ItemPrototype`, returning the wiki name → item id map.
///
/// Idempotent given identical inputs (no randomness, no hidden state beyond
/// the deterministic tables above), matching spec §4.3's requirement.
pub fn wiki_item_names(items: &[Item], localization: &Localization) -> Result<BTreeMap<String, ItemId>, crate::error::AtlasError> {
    let mut name_to_items: BTreeMap<String, Vec<&Item>> = BTreeMap::new();

    for item in items {
        let base_name = localization.text(item.name_id, None, "  ")?;
        if base_name.contains(NOT_USE_SENTINEL) {
            continue;
        }
        let name = preemptively_choose_variant_name(item, &base_name);
        name_to_items.entry(name).or_default().push(item);
    }

    // Step 4: apply the priori table, overriding whatever grouping fell out
    // of step 1-3 for these specific names.
    let by_id: FnvHashMap<i64, &Item> = items.iter().map(|i| (i.id.get(), i)).collect();
    for (name, id) in priori() {
        if let Some(item) = by_id.get(&id.get()) {
            name_to_items.insert(name.to_string(), vec![*item]);
        }
    }

    let mut result = BTreeMap::new();

    for (name, candidates) in name_to_items {
        if name.is_empty() {
            continue;
        }
        if candidates.len() == 1 {
            result.insert(name, candidates[0].id);
            continue;
        }

        let mut by_variant: BTreeMap<String, Vec<&Item>> = BTreeMap::new();
        for item in candidates {
            let variant_name = choose_variant_name(item, &name);
            by_variant.entry(variant_name).or_default().push(item);
        }

        for (variant_name, variant_items) in by_variant {
            if variant_items.len() == 1 {
                result.insert(variant_name, variant_items[0].id);
                continue;
            }

            match choose_item(&variant_items, localization) {
                Some(chosen) => {
                    result.insert(variant_name, chosen.id);
                }
                None => {
                    let min_id = variant_items.iter().map(|i| i.id.get()).min().expect("non-empty group");
                    diagnostics::warn(FindingKey::AmbiguousItemName)
                        .msg(format!("could not resolve \"{variant_name}\"; using lowest item id {min_id}"))
                        .push();
                    result.insert(variant_name, ItemId(min_id));
                }
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, name_id: i64, info_id: i64, male_icon_path: &str, tags: Vec<i64>) -> Item {
        Item { id: ItemId(id), name_id, info_id, male_icon_path: male_icon_path.to_string(), item_tag: tags, price: 0 }
    }

    fn localization_with(dir: &std::path::Path, entries: &[(i64, &str)]) -> Localization {
        let lang_dir = dir.join("English");
        std::fs::create_dir_all(&lang_dir).unwrap();
        let list: Vec<_> = entries.iter().map(|(id, text)| format!(r#"{{"id":{id},"text":"{text}"}}"#)).collect();
        std::fs::write(lang_dir.join("text.json"), format!(r#"{{"configList":[{}]}}"#, list.join(","))).unwrap();
        Localization::new(dir, vec!["English".to_string()], vec!["en".to_string()])
    }

    #[test]
    fn singleton_names_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let loc = localization_with(dir.path(), &[(1, "Widget")]);
        let items = vec![item(100, 1, 0, "null", vec![])];
        let names = wiki_item_names(&items, &loc).unwrap();
        assert_eq!(names.get("Widget"), Some(&ItemId(100)));
    }

    #[test]
    fn not_use_sentinel_items_are_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let loc = localization_with(dir.path(), &[(1, "\u{ffe5}not use\u{ffe5}")]);
        let items = vec![item(100, 1, 0, "null", vec![])];
        let names = wiki_item_names(&items, &loc).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn priori_table_overrides_ambiguous_groups() {
        let dir = tempfile::tempdir().unwrap();
        let loc = localization_with(dir.path(), &[(1, "Tomato")]);
        let items = vec![item(16200004, 1, 0, "null", vec![]), item(99999999, 1, 0, "null", vec![])];
        let names = wiki_item_names(&items, &loc).unwrap();
        assert_eq!(names.get("Tomato"), Some(&ItemId(16200004)));
    }

    #[test]
    fn style_tag_variant_gets_style_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let loc = localization_with(dir.path(), &[(1, "Outfit")]);
        let items = vec![item(75000000, 1, 0, "null", vec![5])];
        let names = wiki_item_names(&items, &loc).unwrap();
        assert_eq!(names.get("Outfit (Style)"), Some(&ItemId(75000000)));
    }

    #[test]
    fn unresolvable_group_falls_back_to_lowest_id_with_a_warning() {
        let dir = tempfile::tempdir().unwrap();
        let loc = localization_with(dir.path(), &[(1, "Thing")]);
        // Two items, same base name, no distinguishing icon-path version,
        // different base icon paths -> choose_item bails to None.
        let items = vec![item(5, 1, 0, "a.png", vec![]), item(3, 1, 0, "b.png", vec![])];
        let names = wiki_item_names(&items, &loc).unwrap();
        assert_eq!(names.get("Thing"), Some(&ItemId(3)));
    }

    #[test]
    fn icon_version_suffix_picks_lowest_numbered_variant() {
        assert_eq!(split_icon_version("i_item_05"), ("i_item".to_string(), 5.0));
        assert_eq!(split_icon_version("i_item"), ("i_item".to_string(), 0.0));
    }
}
