//! udev `by-path` topology links.

use super::links::dereference;
use super::{DeviceMatch, Resolution, Strategy, StrategyKind};
use crate::layout::DeviceLayout;
use crate::lun::Lun;
use lunwait_error::{ProbeError, ProbeOp, ProbeResult};
use lunwait_hal::FsOps;
use std::path::PathBuf;

/// Scans `/dev/disk/by-path` for the first entry whose name contains `lun{N}`.
///
/// Entries are visited in lexical order and only the first match is dereferenced. The match
/// is a plain substring test, so `lun1` also selects an entry named `...lun12` when it sorts
/// first. If that entry vanishes before it can be dereferenced the LUN is not found yet; a
/// later entry (such as a `-part1` link) is never taken in its place.
#[derive(Debug, Clone)]
pub struct ByPathStrategy {
    dir: PathBuf,
}

impl ByPathStrategy {
    pub fn new(layout: &DeviceLayout) -> Self {
        Self {
            dir: layout.by_path_dir.clone(),
        }
    }
}

impl Strategy for ByPathStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ScsiByPath
    }

    fn candidate(&self, _lun: Lun) -> String {
        self.dir.display().to_string()
    }

    fn probe(&self, fs: &dyn FsOps, lun: Lun) -> ProbeResult<Resolution> {
        let names = match fs.read_dir_names(&self.dir) {
            Ok(names) => names,
            // No udev by-path tree on this host: strategy does not apply.
            Err(err) if err.is_not_found() => return Ok(Resolution::NotFound),
            Err(err) => {
                return Err(ProbeError::new(
                    ProbeOp::ReadDir,
                    self.dir.display().to_string(),
                    err,
                ))
            }
        };

        let token = lun.token();
        let Some(name) = names.iter().find(|name| name.contains(&token)) else {
            return Ok(Resolution::NotFound);
        };
        Ok(match dereference(fs, &self.dir.join(name))? {
            Some(real) => Resolution::Found(DeviceMatch::new(real, StrategyKind::ScsiByPath)),
            None => Resolution::NotFound,
        })
    }
}
