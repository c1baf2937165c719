//! Preprocessor cache (spec §4.5): the interest-point scan is expensive
//! (it opens every scene bundle), so its result is cached to disk keyed by
//! the asset root's recorded version string. Grounded in the teacher's
//! plain-file-plus-rename approach to on-disk caches (`fileset.rs`).

use std::hash::Hasher;
use std::path::{Path, PathBuf};

use ahash::AHasher;
use serde::{Deserialize, Serialize};

use crate::error::AtlasError;
use crate::scenes::preprocessor::{InterestKind, InterestPoint};

#[derive(Debug, Serialize, Deserialize)]
struct CachedInterestPoint {
    scene: String,
    object_id: i64,
    kind: String,
    behaviour_path: PathBuf,
    transform_path: Option<PathBuf>,
    scene_area_path: Option<PathBuf>,
}

impl From<&InterestPoint> for CachedInterestPoint {
    fn from(point: &InterestPoint) -> CachedInterestPoint {
        let kind_str: &'static str = point.kind.into();
        CachedInterestPoint {
            scene: point.scene.clone(),
            object_id: point.object_id,
            kind: kind_str.to_string(),
            behaviour_path: point.behaviour_path.clone(),
            transform_path: point.transform_path.clone(),
            scene_area_path: point.scene_area_path.clone(),
        }
    }
}

/// Derives the cache file name from the asset root's version string, so a
/// new game version never reads a stale cache.
pub fn cache_key(version: &str) -> String {
    let mut hasher = AHasher::default();
    hasher.write(version.as_bytes());
    format!("interest_points-{:016x}.json", hasher.finish())
}

fn cache_path(cache_root: &Path, version: &str) -> PathBuf {
    cache_root.join(cache_key(version))
}

/// Reads the cached interest-point list for `version`, if present. A
/// missing or unparseable cache file is not an error — it just means the
/// caller must rebuild it.
pub fn read(cache_root: &Path, version: &str) -> Option<Vec<InterestPoint>> {
    let path = cache_path(cache_root, version);
    let text = std::fs::read_to_string(path).ok()?;
    let cached: Vec<CachedInterestPoint> = serde_json::from_str(&text).ok()?;
    let mut points = Vec::with_capacity(cached.len());
    for c in cached {
        let kind: InterestKind = c.kind.parse().ok()?;
        points.push(InterestPoint {
            scene: c.scene,
            object_id: c.object_id,
            kind,
            behaviour_path: c.behaviour_path,
            transform_path: c.transform_path,
            scene_area_path: c.scene_area_path,
        });
    }
    Some(points)
}

/// Writes the interest-point list to the cache, atomically: write to a
/// sibling temp file, then `rename` over the final path so a reader never
/// observes a half-written cache.
pub fn write(cache_root: &Path, version: &str, points: &[InterestPoint]) -> Result<(), AtlasError> {
    std::fs::create_dir_all(cache_root)?;
    let path = cache_path(cache_root, version);
    let tmp_path = path.with_extension("json.tmp");

    let cached: Vec<CachedInterestPoint> = points.iter().map(CachedInterestPoint::from).collect();
    let text = serde_json::to_string(&cached).map_err(|e| AtlasError::ParseError { path: path.clone(), message: e.to_string() })?;

    std::fs::write(&tmp_path, text)?;
    std::fs::rename(&tmp_path, &path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::preprocessor::InterestKind;

    fn sample_point() -> InterestPoint {
        InterestPoint {
            scene: "Scene1".to_string(),
            object_id: 3,
            kind: InterestKind::SpawnMonoPoint,
            behaviour_path: PathBuf::from("behaviour.json"),
            transform_path: Some(PathBuf::from("transform.json")),
            scene_area_path: None,
        }
    }

    #[test]
    fn cache_key_is_stable_for_the_same_version() {
        assert_eq!(cache_key("1.0.0"), cache_key("1.0.0"));
        assert_ne!(cache_key("1.0.0"), cache_key("1.0.1"));
    }

    #[test]
    fn write_then_read_round_trips_file_paths() {
        let dir = tempfile::tempdir().unwrap();
        let points = vec![sample_point()];
        write(dir.path(), "1.0.0", &points).unwrap();
        let read_back = read(dir.path(), "1.0.0").unwrap();
        assert_eq!(read_back.len(), 1);
        assert_eq!(read_back[0].scene, "Scene1");
        assert_eq!(read_back[0].object_id, 3);
    }

    #[test]
    fn missing_cache_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read(dir.path(), "nonexistent").is_none());
    }
}
