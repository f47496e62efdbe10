//! Where each naming scheme lives in the device namespace.

use crate::lun::Lun;
use lunwait_hal::path::rebase;
use lunwait_hal::sysfs::nvme;
use std::path::{Path, PathBuf};

pub const AZURE_ALIAS_DIR: &str = "/dev/disk/azure";
pub const BY_PATH_DIR: &str = "/dev/disk/by-path";
pub const NVME_CLASS_DIR: &str = "/sys/class/nvme";
pub const DEV_DIR: &str = "/dev";

/// Directory under the Azure alias dir that legacy SCSI enumeration uses for data disks.
const LEGACY_SCSI_HOST: &str = "scsi1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceLayout {
    /// udev rules from the Azure guest agent (`/dev/disk/azure`).
    pub azure_alias_dir: PathBuf,
    /// udev topology links (`/dev/disk/by-path`).
    pub by_path_dir: PathBuf,
    /// NVMe controllers in sysfs (`/sys/class/nvme`).
    pub nvme_class_dir: PathBuf,
    /// Block device nodes (`/dev`).
    pub dev_dir: PathBuf,
}

impl Default for DeviceLayout {
    fn default() -> Self {
        Self {
            azure_alias_dir: PathBuf::from(AZURE_ALIAS_DIR),
            by_path_dir: PathBuf::from(BY_PATH_DIR),
            nvme_class_dir: PathBuf::from(NVME_CLASS_DIR),
            dev_dir: PathBuf::from(DEV_DIR),
        }
    }
}

impl DeviceLayout {
    /// Standard Linux locations re-rooted under `root` (`/` for the live system).
    pub fn with_root(root: &Path) -> Self {
        let std = Self::default();
        Self {
            azure_alias_dir: rebase(root, &std.azure_alias_dir),
            by_path_dir: rebase(root, &std.by_path_dir),
            nvme_class_dir: rebase(root, &std.nvme_class_dir),
            dev_dir: rebase(root, &std.dev_dir),
        }
    }

    /// `/dev/disk/azure/scsi1`
    pub fn legacy_scsi_dir(&self) -> PathBuf {
        self.azure_alias_dir.join(LEGACY_SCSI_HOST)
    }

    /// `/dev/disk/azure/scsi1/lun{N}`
    pub fn legacy_scsi_link(&self, lun: Lun) -> PathBuf {
        self.legacy_scsi_dir().join(lun.token())
    }

    /// `/dev/disk/azure/lun{N}`
    pub fn alias_link(&self, lun: Lun) -> PathBuf {
        self.azure_alias_dir.join(lun.token())
    }

    /// `/sys/class/nvme/nvme*/nvme*n1/device/serial`
    pub fn nvme_serial_glob(&self) -> String {
        nvme::serial_glob(&self.nvme_class_dir)
    }

    pub fn dev_node(&self, name: &str) -> PathBuf {
        self.dev_dir.join(name)
    }
}
