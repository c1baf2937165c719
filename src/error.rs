//! The fatal error taxonomy. Every variant here aborts the run before any
//! output is written, matching the propagation policy in spec §7: the
//! resolver never partially commits.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("asset not found: {path}")]
    AssetNotFound { path: PathBuf },

    #[error("dangling reference: path-id {path_id} in bundle {bundle}")]
    DanglingReference { bundle: String, path_id: i64 },

    #[error("parse error in {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("schema mismatch in {context}: expected {expected}, found {found}")]
    SchemaMismatch { context: String, expected: String, found: String },

    #[error("scene name collision not covered by the override table: {names:?} all map to distinct ids {ids:?}")]
    SceneAmbiguous { names: Vec<String>, ids: Vec<i64> },

    #[error("unknown table: {0}")]
    UnknownTable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type AtlasResult<T> = Result<T, AtlasError>;
