//! Read-only filesystem operations trait.

use crate::HalResult;
use std::path::{Path, PathBuf};

/// What a stat call found at the end of a (fully followed) path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Dir,
    BlockDevice,
    Other,
}

/// Read-only view of the device namespace.
///
/// Implementations must never mutate the filesystem. Not-found conditions are reported as
/// `HalError::Io` with `ErrorKind::NotFound` so callers can tell "not there yet" apart from
/// a broken system (see [`crate::HalError::is_not_found`]).
pub trait FsOps: Send + Sync {
    /// Stat a path, following symlinks.
    fn stat(&self, path: &Path) -> HalResult<FileKind>;

    /// Resolve every symlink hop and return the absolute canonical path.
    fn canonicalize(&self, path: &Path) -> HalResult<PathBuf>;

    /// List entry names of a directory in lexical order.
    fn read_dir_names(&self, dir: &Path) -> HalResult<Vec<String>>;

    /// Expand a shell-style glob pattern. Matches are returned in lexical order.
    ///
    /// A malformed pattern is `HalError::Pattern`.
    fn glob(&self, pattern: &str) -> HalResult<Vec<PathBuf>>;

    /// Read a whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> HalResult<String>;
}
