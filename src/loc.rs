//! Lightweight source-location tracking for diagnostics.
//!
//! Unlike the teacher's `token.rs`, we don't lex raw script text, so there is
//! no string interning here: locations just point at a file path (and
//! optionally a line) recorded when an asset, config record, or mission
//! statement was read.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Loc {
    pub path: Arc<PathBuf>,
    /// 0 means "the whole file", matching the teacher's `token.rs` convention.
    pub line: u32,
}

impl Loc {
    pub fn for_file(path: impl Into<PathBuf>) -> Self {
        Loc { path: Arc::new(path.into()), line: 0 }
    }

    pub fn for_line(path: impl Into<PathBuf>, line: u32) -> Self {
        Loc { path: Arc::new(path.into()), line }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.path.display())
        } else {
            write!(f, "{}:{}", self.path.display(), self.line)
        }
    }
}

/// Implemented by anything that carries (or can be converted into) a `Loc`,
/// mirroring `amtep-ck3-tiger/src/report/error_loc.rs`.
pub trait ErrorLoc {
    fn into_loc(self) -> Loc;
}

impl ErrorLoc for Loc {
    fn into_loc(self) -> Loc {
        self
    }
}

impl ErrorLoc for &Loc {
    fn into_loc(self) -> Loc {
        self.clone()
    }
}

impl ErrorLoc for &Path {
    fn into_loc(self) -> Loc {
        Loc::for_file(self)
    }
}

impl ErrorLoc for PathBuf {
    fn into_loc(self) -> Loc {
        Loc::for_file(self)
    }
}

impl ErrorLoc for &PathBuf {
    fn into_loc(self) -> Loc {
        Loc::for_file(self.clone())
    }
}
