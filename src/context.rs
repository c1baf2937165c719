//! The `Everything`-equivalent immutable context (spec §5, §9: "global
//! mutable singletons ... accept as a single immutable context object
//! threaded through all components"). Grounded on
//! `amtep-ck3-tiger/src/everything.rs` and `src/game.rs`'s `OnceLock<Game>`
//! lazy-singleton idiom, generalized here to several independently lazy
//! fields rather than one.

use std::sync::OnceLock;

use crate::config::Config;
use crate::error::AtlasError;
use crate::localization::Localization;
use crate::mission::{xml, Mission, Story};
use crate::registry::Registry;
use crate::scenes::{cache, InterestPoint, SceneIndex};
use crate::tables::TypedTables;
use crate::wiki_names::{self};

/// Everything a run needs, built once and read-only from then on. Every
/// subsystem that used to be a global singleton in the original
/// (`DesignerConfig`, `text`, `wiki`, `sceneinfo`) is a field here instead.
pub struct Atlas {
    pub config: Config,
    pub registry: Registry,
    pub tables: TypedTables,
    pub localization: Localization,
    scene_index: OnceLock<SceneIndex>,
    interest_points: OnceLock<Vec<InterestPoint>>,
    story: OnceLock<Story>,
    wiki_names: OnceLock<std::collections::BTreeMap<String, crate::model::ItemId>>,
}

impl Atlas {
    pub fn new(config: Config) -> Atlas {
        let registry = Registry::new(config.assets_root.join("designer_config"));
        let localization =
            Localization::new(config.assets_root.join("localization"), config.languages.clone(), config.language_codes.clone());
        Atlas {
            config,
            registry,
            tables: TypedTables::default(),
            localization,
            scene_index: OnceLock::new(),
            interest_points: OnceLock::new(),
            story: OnceLock::new(),
            wiki_names: OnceLock::new(),
        }
    }

    /// Builds (once) the bijective scene index from the `sceneinfo` bundle.
    pub fn scene_index(&self) -> Result<&SceneIndex, AtlasError> {
        if let Some(index) = self.scene_index.get() {
            return Ok(index);
        }
        let bundle = crate::assets::Bundle::open(self.config.assets_root.join("sceneinfo"))?;
        let index = SceneIndex::build(&bundle)?;
        Ok(self.scene_index.get_or_init(|| index))
    }

    /// Runs (or reads from the on-disk cache) the scene preprocessor, per
    /// spec §4.5/§5's cache lifecycle. `purge` forces a fresh scan even if
    /// a matching cache entry exists.
    pub fn interest_points(&self, purge: bool) -> Result<&[InterestPoint], AtlasError> {
        if let Some(points) = self.interest_points.get() {
            return Ok(points);
        }

        if !purge {
            if let Some(points) = cache::read(&self.config.cache_root, &self.config.version) {
                return Ok(self.interest_points.get_or_init(|| points));
            }
        }

        let scenes_root = self.config.assets_root.join("scene").join("additive");
        let points = crate::scenes::find_interest_points(&scenes_root)?;
        cache::write(&self.config.cache_root, &self.config.version, &points)?;
        Ok(self.interest_points.get_or_init(|| points))
    }

    /// Builds (once) the full mission/story graph by scanning the
    /// `story_script` bundle's `TextAsset` entries, matching
    /// `preproc/mission.py::find_mission_names`'s bundle walk. Each
    /// mission's XML is parsed independently, so the per-asset parse work
    /// fans out over `rayon`, mirroring the teacher's `db.rs`/`fileset.rs`
    /// parallel-load-then-insert shape (`par_iter` to collect, then a
    /// sequential fold into the owning map).
    pub fn story(&self) -> Result<&Story, AtlasError> {
        use rayon::prelude::*;

        if let Some(story) = self.story.get() {
            return Ok(story);
        }
        let bundle = crate::assets::Bundle::open(self.config.assets_root.join("story_script"))?;
        let missions: Result<Vec<Mission>, AtlasError> = bundle
            .assets
            .par_iter()
            .filter(|asset| asset.type_name == "TextAsset")
            .map(|asset| {
                let data = asset.load_data(bundle.path())?;
                let crate::assets::AssetData::Text(text) = data else { return Ok(None) };
                let raw = xml::parse_mission_xml(text)?;
                Ok(Some(Mission::from_raw(&raw)))
            })
            .filter_map(Result::transpose)
            .collect();

        let mut story = Story::new();
        for mission in missions? {
            story.insert(mission);
        }
        Ok(self.story.get_or_init(|| story))
    }

    /// Builds (once) the wiki-facing name table over every known item.
    pub fn wiki_names(&self) -> Result<&std::collections::BTreeMap<String, crate::model::ItemId>, AtlasError> {
        if let Some(names) = self.wiki_names.get() {
            return Ok(names);
        }
        let items = self.tables.item_prototype(&self.registry)?;
        let names = wiki_names::wiki_item_names(items, &self.localization)?;
        Ok(self.wiki_names.get_or_init(|| names))
    }

    /// A mission's localized "is only known by convention" status (spec
    /// GLOSSARY event definition), wired through `Localization` so
    /// `mission::Story::is_event` stays free of a localization dependency.
    pub fn is_event_mission(&self, id: crate::model::MissionId) -> Result<bool, AtlasError> {
        let story = self.story()?;
        let languages = self.config.languages.clone();
        let localization = &self.localization;
        Ok(story.is_event(id, |name_id| {
            languages.iter().all(|lang| localization.text_in(name_id, lang).map(|s| s == "XX").unwrap_or(true))
        }))
    }
}
