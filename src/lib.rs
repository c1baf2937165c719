//! Cross-referenced data-resolution engine for a life-simulation/crafting
//! game's exported asset bundles: builds the item/recipe/monster/scene/
//! mission graph and resolves per-item provenance.
//!
//! The top-level entry point is [`driver::run`]; [`context::Atlas`] is the
//! immutable context threaded through every subsystem once built.

pub mod assets;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod loc;
pub mod localization;
pub mod mission;
pub mod model;
pub mod output;
pub mod registry;
pub mod resolver;
pub mod scenes;
pub mod tables;
pub mod wiki_names;

pub use config::Config;
pub use context::Atlas;
pub use error::{AtlasError, AtlasResult};
