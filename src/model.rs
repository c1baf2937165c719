//! Shared identifier newtypes and the core entities of spec §3 that are not
//! owned by a more specific subsystem (scenes, missions, and provenance
//! tuples get their own modules; this holds the id types everyone shares
//! plus `Item`/`Generator`/`GeneratorGroup`).

use serde::Deserialize;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                $name(value)
            }
        }
    };
}

id_newtype!(ItemId);
id_newtype!(SceneId);
id_newtype!(MissionId);
id_newtype!(GeneratorGroupId);
id_newtype!(GeneratorId);

/// `Item` per spec §3: uniquely identified by `item_id`, carries tags,
/// name-text-id, icon-path, prices. An item exists iff it appears in the
/// `ItemPrototype` table (`src/tables.rs::ItemPrototype`).
///
/// Field names/shapes (`maleIconPath`, `itemTag`, `nameId`) are grounded
/// directly in `original_source/sandrock/lib/text/wiki_item_names.py` and
/// `item_source_new/craft.py`.
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "nameId")]
    pub name_id: i64,
    #[serde(rename = "infoId", default)]
    pub info_id: i64,
    #[serde(rename = "maleIconPath", default)]
    pub male_icon_path: String,
    #[serde(rename = "itemTag", default)]
    pub item_tag: Vec<i64>,
    #[serde(default)]
    pub price: i64,
}

/// Random-outcome kind for a single `Generator`, spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomKind {
    Fixed,
    Normal,
    UniformInt,
    UniformFloat,
}

impl RandomKind {
    pub fn from_raw(raw: i64) -> RandomKind {
        match raw {
            0 => RandomKind::Fixed,
            1 => RandomKind::Normal,
            2 => RandomKind::UniformInt,
            _ => RandomKind::UniformFloat,
        }
    }
}

/// A single weighted outcome, `DesignerConfig.Generator_Item[gen_id]` in the
/// original. `random_type == 0 && parameters[0] <= 0` is inert (checked by
/// `generator.rs::expand`, matching `expand_generator`'s `continue`).
#[derive(Debug, Clone, Deserialize)]
pub struct Generator {
    pub id: GeneratorId,
    #[serde(rename = "itemId")]
    pub item_id: ItemId,
    #[serde(rename = "randomType")]
    pub random_type: i64,
    pub parameters: Vec<f64>,
}

impl Generator {
    pub fn random_kind(&self) -> RandomKind {
        RandomKind::from_raw(self.random_type)
    }

    /// Mirrors `expand_generator`'s inert check: `randomType == 0` (fixed)
    /// and a non-positive first parameter.
    pub fn is_inert(&self) -> bool {
        self.random_type == 0 && self.parameters.first().copied().unwrap_or(0.0) <= 0.0
    }
}

/// One `(generator_id, weight, luck_factor)` tuple, `idWeights` per
/// `_group_generator_ids` in `generator.py`.
#[derive(Debug, Clone, Deserialize)]
pub struct IdWeight {
    pub id: GeneratorId,
    pub weight: f64,
    #[serde(rename = "luckFactor", default)]
    pub luck_factor: f64,
}

/// One element of a `GeneratorGroup`: a set of id-weights that independently
/// contribute to the expansion, normalized within the element.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorGroupElement {
    #[serde(rename = "idWeights")]
    pub id_weights: Vec<IdWeight>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorGroup {
    pub id: GeneratorGroupId,
    pub elements: Vec<GeneratorGroupElement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_is_inert_for_zero_weight_fixed_outcome() {
        let gen = Generator { id: GeneratorId(1), item_id: ItemId(1), random_type: 0, parameters: vec![0.0] };
        assert!(gen.is_inert());
    }

    #[test]
    fn generator_is_not_inert_for_positive_fixed_outcome() {
        let gen = Generator { id: GeneratorId(1), item_id: ItemId(1), random_type: 0, parameters: vec![1.0] };
        assert!(!gen.is_inert());
    }

    #[test]
    fn generator_with_nonzero_random_type_is_never_inert_by_the_zero_weight_check() {
        let gen = Generator { id: GeneratorId(1), item_id: ItemId(1), random_type: 2, parameters: vec![0.0] };
        assert!(!gen.is_inert());
    }
}
