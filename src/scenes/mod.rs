//! Scene Index and Preprocessor (spec §4.4, §4.5).

pub mod cache;
pub mod index;
pub mod overrides;
pub mod preprocessor;
pub mod terrain;

pub use index::SceneIndex;
pub use preprocessor::{find_interest_points, find_scene_interests, InterestKind, InterestPoint};
pub use terrain::{find_terrain_trees, TerrainTree};
