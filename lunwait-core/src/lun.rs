use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Logical unit number: the attachment slot a virtual disk occupies on the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lun(u32);

impl Lun {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// The `lun{N}` token used in udev alias names.
    pub fn token(self) -> String {
        format!("lun{}", self.0)
    }

    /// Trailing text an NVMe controller serial carries for this LUN.
    ///
    /// Observed controllers number their serials from 1, so this is `LUN + 1`. The offset is
    /// hypervisor-generation specific and is kept as-is rather than guessed at.
    pub fn nvme_serial_suffix(self) -> String {
        (u64::from(self.0) + 1).to_string()
    }
}

impl From<u32> for Lun {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Lun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Lun {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Self)
    }
}
