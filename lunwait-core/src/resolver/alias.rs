//! Fixed udev alias links keyed only by LUN.

use super::links::check_link;
use super::{DeviceMatch, Resolution, Strategy, StrategyKind};
use crate::layout::DeviceLayout;
use crate::lun::Lun;
use lunwait_error::ProbeResult;
use lunwait_hal::FsOps;
use std::path::PathBuf;

/// Looks for `<dir>/lun{N}` and dereferences it.
#[derive(Debug, Clone)]
pub struct AliasLinkStrategy {
    kind: StrategyKind,
    dir: PathBuf,
}

impl AliasLinkStrategy {
    /// `/dev/disk/azure/scsi1/lun{N}`, created by the Azure agent's udev rules on SCSI hosts.
    pub fn legacy_scsi(layout: &DeviceLayout) -> Self {
        Self {
            kind: StrategyKind::LegacyScsi,
            dir: layout.legacy_scsi_dir(),
        }
    }

    /// `/dev/disk/azure/lun{N}`, the newer rules that name SCSI and NVMe disks alike.
    pub fn legacy_alias(layout: &DeviceLayout) -> Self {
        Self {
            kind: StrategyKind::LegacyAlias,
            dir: layout.azure_alias_dir.clone(),
        }
    }

    pub fn link(&self, lun: Lun) -> PathBuf {
        self.dir.join(lun.token())
    }
}

impl Strategy for AliasLinkStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn candidate(&self, lun: Lun) -> String {
        self.link(lun).display().to_string()
    }

    fn probe(&self, fs: &dyn FsOps, lun: Lun) -> ProbeResult<Resolution> {
        Ok(match check_link(fs, &self.link(lun))? {
            Some(real) => Resolution::Found(DeviceMatch::new(real, self.kind)),
            None => Resolution::NotFound,
        })
    }
}
