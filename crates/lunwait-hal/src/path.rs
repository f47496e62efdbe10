use std::path::{Path, PathBuf};

/// Re-root an absolute path under `root`. A root of `/` leaves the path unchanged.
pub fn rebase(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix("/") {
        Ok(rel) => root.join(rel),
        Err(_) => root.join(path),
    }
}
