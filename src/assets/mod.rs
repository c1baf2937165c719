//! Asset Manifest and Bundle Loader (spec §4.1): uniform access to
//! manifest-indexed bundles and their typed asset views.

pub mod asset;
pub mod bundle;
pub mod manifest;

pub use asset::{Asset, AssetData};
pub use bundle::Bundle;
pub use manifest::AssetInfo;
