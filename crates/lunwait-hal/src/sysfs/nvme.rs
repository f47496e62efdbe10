//! Helpers related to NVMe controllers and namespaces in sysfs.
//!
//! Layout under `/sys/class/nvme`:
//!
//! ```text
//! nvme0/               controller
//!   nvme0n1/           namespace (block device name)
//!     device/serial    controller serial, one line
//! ```

use std::path::Path;

/// Glob, relative to the NVMe class directory, matching every first-namespace serial file.
pub const SERIAL_GLOB: &str = "nvme*/nvme*n1/device/serial";

/// Full glob pattern for serial files under `class_dir` (normally `/sys/class/nvme`).
///
/// `class_dir` is escaped so a sysroot containing glob metacharacters is taken literally.
pub fn serial_glob(class_dir: &Path) -> String {
    let base = glob::Pattern::escape(&class_dir.to_string_lossy());
    format!("{}/{}", base.trim_end_matches('/'), SERIAL_GLOB)
}

/// Returns the namespace directory name (e.g. `nvme0n1`) owning a serial attribute file.
///
/// The attribute sits in the namespace's `device/` link, so that component is skipped.
pub fn namespace_name(serial_path: &Path) -> Option<String> {
    serial_path
        .ancestors()
        .skip(1)
        .filter_map(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .find(|name| name != "device")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn serial_glob_joins_class_dir() {
        assert_eq!(
            serial_glob(Path::new("/sys/class/nvme")),
            "/sys/class/nvme/nvme*/nvme*n1/device/serial"
        );
        assert_eq!(
            serial_glob(Path::new("/")),
            "/nvme*/nvme*n1/device/serial".to_string()
        );
    }

    #[test]
    fn serial_glob_escapes_metacharacters_in_root() {
        assert_eq!(
            serial_glob(Path::new("/tmp/[x]")),
            "/tmp/[[]x[]]/nvme*/nvme*n1/device/serial"
        );
    }

    #[test]
    fn namespace_name_skips_device_link() {
        let p = PathBuf::from("/sys/class/nvme/nvme0/nvme0n1/device/serial");
        assert_eq!(namespace_name(&p), Some("nvme0n1".to_string()));
    }

    #[test]
    fn namespace_name_without_device_component() {
        let p = PathBuf::from("/sys/class/nvme/nvme2/nvme2n1/serial");
        assert_eq!(namespace_name(&p), Some("nvme2n1".to_string()));
    }
}
