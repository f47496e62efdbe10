//! Linux filesystem backend using real syscalls.

use super::{FileKind, FsOps};
use crate::{HalError, HalResult};
use std::fs;
use std::io;
#[cfg(unix)]
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

/// Real filesystem backend for Linux hosts.
#[derive(Debug, Clone, Default)]
pub struct LinuxFs;

impl LinuxFs {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn is_block_device(ft: &fs::FileType) -> bool {
    ft.is_block_device()
}

#[cfg(not(unix))]
fn is_block_device(_ft: &fs::FileType) -> bool {
    false
}

fn file_kind(meta: &fs::Metadata) -> FileKind {
    let ft = meta.file_type();
    if is_block_device(&ft) {
        FileKind::BlockDevice
    } else if ft.is_dir() {
        FileKind::Dir
    } else if ft.is_file() {
        FileKind::File
    } else {
        FileKind::Other
    }
}

impl FsOps for LinuxFs {
    fn stat(&self, path: &Path) -> HalResult<FileKind> {
        let meta = fs::metadata(path)?;
        Ok(file_kind(&meta))
    }

    fn canonicalize(&self, path: &Path) -> HalResult<PathBuf> {
        Ok(fs::canonicalize(path)?)
    }

    fn read_dir_names(&self, dir: &Path) -> HalResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    fn glob(&self, pattern: &str) -> HalResult<Vec<PathBuf>> {
        let paths = glob::glob(pattern).map_err(|e| HalError::Pattern(e.to_string()))?;
        let mut out = Vec::new();
        for entry in paths {
            match entry {
                Ok(path) => out.push(path),
                Err(err) => {
                    let err = io::Error::from(err);
                    // A directory vanished between listing and descending into it.
                    if err.kind() == io::ErrorKind::NotFound {
                        continue;
                    }
                    return Err(HalError::Io(err));
                }
            }
        }
        Ok(out)
    }

    fn read_to_string(&self, path: &Path) -> HalResult<String> {
        Ok(fs::read_to_string(path)?)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    #[test]
    fn canonicalize_follows_chained_symlinks() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::write(root.join("sdc"), "").unwrap();
        symlink(root.join("sdc"), root.join("hop1")).unwrap();
        symlink("hop1", root.join("hop2")).unwrap();

        let fs_ops = LinuxFs::new();
        assert_eq!(fs_ops.canonicalize(&root.join("hop2")).unwrap(), root.join("sdc"));
    }

    #[test]
    fn stat_reports_missing_as_not_found() {
        let tmp = tempdir().unwrap();
        let err = LinuxFs::new().stat(&tmp.path().join("nope")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn stat_on_dangling_symlink_is_not_found() {
        let tmp = tempdir().unwrap();
        symlink(tmp.path().join("gone"), tmp.path().join("lun0")).unwrap();
        let err = LinuxFs::new().stat(&tmp.path().join("lun0")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn read_dir_names_are_sorted() {
        let tmp = tempdir().unwrap();
        for name in ["b", "c", "a"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        assert_eq!(
            LinuxFs::new().read_dir_names(tmp.path()).unwrap(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn glob_expands_nested_wildcards_in_order() {
        let tmp = tempdir().unwrap();
        for ctrl in ["nvme1", "nvme0"] {
            let dir = tmp.path().join(ctrl).join(format!("{ctrl}n1/device"));
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("serial"), "x\n").unwrap();
        }
        let pattern = format!(
            "{}/nvme*/nvme*n1/device/serial",
            glob::Pattern::escape(&tmp.path().to_string_lossy())
        );
        let found = LinuxFs::new().glob(&pattern).unwrap();
        assert_eq!(
            found,
            vec![
                tmp.path().join("nvme0/nvme0n1/device/serial"),
                tmp.path().join("nvme1/nvme1n1/device/serial"),
            ]
        );
    }

    #[test]
    fn glob_rejects_malformed_pattern() {
        let err = LinuxFs::new().glob("/sys/class/nvme/[").unwrap_err();
        assert!(matches!(err, HalError::Pattern(_)));
    }
}
