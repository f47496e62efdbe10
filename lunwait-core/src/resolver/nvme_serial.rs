//! NVMe disks matched by controller serial.
//!
//! Direct-attached NVMe data disks get no LUN in their device name. The controller serial
//! exposed in sysfs ends with the slot number, which observed hosts count from 1, so a
//! serial ending in `N + 1` is taken as LUN `N`.
//!
//! This is a suffix match on decimal text: LUN 0 (`"1"`) also matches a serial ending in
//! `"11"`. The first controller in glob order wins.

use super::{DeviceMatch, Resolution, Strategy, StrategyKind};
use crate::layout::DeviceLayout;
use crate::lun::Lun;
use lunwait_error::{ProbeError, ProbeOp, ProbeResult};
use lunwait_hal::sysfs::nvme::namespace_name;
use lunwait_hal::FsOps;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct NvmeSerialStrategy {
    pattern: String,
    dev_dir: PathBuf,
}

/// Does a controller serial belong to `lun`? Surrounding whitespace (the sysfs trailing
/// newline, padding) is ignored.
pub fn serial_matches(serial: &str, lun: Lun) -> bool {
    serial.trim().ends_with(&lun.nvme_serial_suffix())
}

impl NvmeSerialStrategy {
    pub fn new(layout: &DeviceLayout) -> Self {
        Self {
            pattern: layout.nvme_serial_glob(),
            dev_dir: layout.dev_dir.clone(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Strategy for NvmeSerialStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::NvmeSerial
    }

    fn candidate(&self, _lun: Lun) -> String {
        self.pattern.clone()
    }

    fn probe(&self, fs: &dyn FsOps, lun: Lun) -> ProbeResult<Resolution> {
        let serial_files = fs
            .glob(&self.pattern)
            .map_err(|e| ProbeError::new(ProbeOp::Glob, self.pattern.clone(), e))?;

        for serial_path in serial_files {
            let raw = match fs.read_to_string(&serial_path) {
                Ok(raw) => raw,
                Err(err) if err.is_not_found() => continue,
                Err(err) => {
                    return Err(ProbeError::new(
                        ProbeOp::ReadFile,
                        serial_path.display().to_string(),
                        err,
                    ))
                }
            };
            if !serial_matches(&raw, lun) {
                continue;
            }
            let Some(name) = namespace_name(&serial_path) else {
                continue;
            };
            let device = self.dev_dir.join(name);
            return Ok(Resolution::Found(DeviceMatch::new(
                device,
                StrategyKind::NvmeSerial,
            )));
        }
        Ok(Resolution::NotFound)
    }
}
