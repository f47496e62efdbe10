use lunwait_error::{ProbeError, ProbeOp, ProbeResult};
use lunwait_hal::FsOps;
use std::path::{Path, PathBuf};

/// Stat `link` and, if something is there, dereference it fully.
///
/// `Ok(None)` when the link (or what it points at) does not exist.
pub(super) fn check_link(fs: &dyn FsOps, link: &Path) -> ProbeResult<Option<PathBuf>> {
    match fs.stat(link) {
        Ok(_) => {}
        Err(err) if err.is_not_found() => return Ok(None),
        Err(err) => {
            return Err(ProbeError::new(
                ProbeOp::Stat,
                link.display().to_string(),
                err,
            ))
        }
    }
    dereference(fs, link)
}

/// Resolve every symlink hop of `link`.
///
/// A link that disappears while being resolved (udev tearing it down between our stat and
/// realpath) is `Ok(None)`; every other failure is a hard error.
pub(super) fn dereference(fs: &dyn FsOps, link: &Path) -> ProbeResult<Option<PathBuf>> {
    match fs.canonicalize(link) {
        Ok(real) => Ok(Some(real)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(ProbeError::new(
            ProbeOp::EvalSymlink,
            link.display().to_string(),
            err,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lunwait_hal::{FakeFs, FsCall};
    use std::io;

    #[test]
    fn missing_link_is_none() {
        let fs = FakeFs::new();
        assert_eq!(check_link(&fs, Path::new("/dev/disk/azure/lun0")).unwrap(), None);
    }

    #[test]
    fn present_link_is_dereferenced() {
        let fs = FakeFs::new();
        fs.add_block_device("/dev/sdc")
            .add_symlink("/dev/disk/azure/lun0", "../../sdc");
        assert_eq!(
            check_link(&fs, Path::new("/dev/disk/azure/lun0")).unwrap(),
            Some(PathBuf::from("/dev/sdc"))
        );
    }

    #[test]
    fn stat_failure_other_than_missing_is_hard_error() {
        let fs = FakeFs::new();
        fs.fail(
            FsCall::Stat,
            "/dev/disk/azure/lun0",
            io::ErrorKind::PermissionDenied,
        );
        let err = check_link(&fs, Path::new("/dev/disk/azure/lun0")).unwrap_err();
        assert_eq!(err.op, ProbeOp::Stat);
        assert_eq!(err.path, "/dev/disk/azure/lun0");
    }

    #[test]
    fn vanished_during_realpath_is_none() {
        let fs = FakeFs::new();
        fs.add_block_device("/dev/sdc")
            .add_symlink("/dev/disk/azure/lun0", "/dev/sdc")
            .fail(
                FsCall::Canonicalize,
                "/dev/disk/azure/lun0",
                io::ErrorKind::NotFound,
            );
        assert_eq!(check_link(&fs, Path::new("/dev/disk/azure/lun0")).unwrap(), None);
    }

    #[test]
    fn realpath_failure_is_hard_error() {
        let fs = FakeFs::new();
        fs.add_block_device("/dev/sdc")
            .add_symlink("/dev/disk/azure/lun0", "/dev/sdc")
            .fail(
                FsCall::Canonicalize,
                "/dev/disk/azure/lun0",
                io::ErrorKind::PermissionDenied,
            );
        let err = check_link(&fs, Path::new("/dev/disk/azure/lun0")).unwrap_err();
        assert_eq!(err.op, ProbeOp::EvalSymlink);
        assert!(err.to_string().starts_with("eval symlink /dev/disk/azure/lun0:"));
    }
}
