#![cfg(unix)]

use lunwait_core::{
    AttachmentWaiter, CancelToken, DeviceLayout, DeviceMatch, Lun, LunResolver, NoopObserver,
    Resolution, StrategyKind,
};
use lunwait_hal::LinuxFs;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tempfile::{tempdir, TempDir};

struct Fixture {
    _tmp: TempDir,
    root: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let tmp = tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("dev/disk")).unwrap();
        Self { _tmp: tmp, root }
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Regular file standing in for a block device node.
    fn device(&self, name: &str) -> PathBuf {
        let path = self.path(&format!("dev/{name}"));
        fs::write(&path, "").unwrap();
        path
    }

    fn link(&self, rel: &str, target: impl AsRef<Path>) {
        let link = self.path(rel);
        fs::create_dir_all(link.parent().unwrap()).unwrap();
        symlink(target, link).unwrap();
    }

    fn serial(&self, ctrl: &str, value: &str) {
        let dir = self.path(&format!("sys/class/nvme/{ctrl}/{ctrl}n1/device"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("serial"), value).unwrap();
    }

    fn resolver(&self) -> LunResolver {
        LunResolver::with_layout(Arc::new(LinuxFs::new()), &DeviceLayout::with_root(&self.root))
            .with_observer(Arc::new(NoopObserver))
    }
}

#[test]
fn bare_host_is_not_found() {
    let fx = Fixture::new();
    assert_eq!(fx.resolver().resolve(Lun::new(0)).unwrap(), Resolution::NotFound);
}

#[test]
fn legacy_scsi_relative_link_is_canonicalized() {
    let fx = Fixture::new();
    let sdc = fx.device("sdc");
    fx.link("dev/disk/azure/scsi1/lun0", "../../../sdc");

    assert_eq!(
        fx.resolver().resolve(Lun::new(0)).unwrap(),
        Resolution::Found(DeviceMatch::new(sdc, StrategyKind::LegacyScsi))
    );
}

#[test]
fn dangling_alias_link_falls_through_to_by_path() {
    let fx = Fixture::new();
    let sdb = fx.device("sdb");
    fx.link("dev/disk/azure/lun1", fx.path("dev/sdz"));
    fx.link("dev/disk/by-path/acpi-VMBUS:00-scsi-0:0:0:lun1", "../../sdb");

    assert_eq!(
        fx.resolver().resolve(Lun::new(1)).unwrap(),
        Resolution::Found(DeviceMatch::new(sdb, StrategyKind::ScsiByPath))
    );
}

#[test]
fn nvme_serial_maps_to_dev_node_under_root() {
    let fx = Fixture::new();
    fx.serial("nvme0", "7868c2d5-0001\n");
    fx.serial("nvme1", "7868c2d5-0003\n");

    assert_eq!(
        fx.resolver().resolve(Lun::new(2)).unwrap(),
        Resolution::Found(DeviceMatch::new(
            fx.path("dev/nvme1n1"),
            StrategyKind::NvmeSerial
        ))
    );
}

#[test]
fn symlink_loop_is_a_hard_error() {
    let fx = Fixture::new();
    fx.link("dev/disk/azure/lun0", "lun0");

    // stat itself fails with ELOOP, which is not "not found".
    let err = fx.resolver().resolve(Lun::new(0)).unwrap_err();
    assert!(err.to_string().contains("dev/disk/azure/lun0"));
}

#[test]
fn waiter_sees_link_created_on_disk() {
    let fx = Fixture::new();
    let sdd = fx.device("sdd");
    let waiter = AttachmentWaiter::new(Arc::new(fx.resolver()));

    let link = fx.path("dev/disk/azure/scsi1/lun3");
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(120));
        fs::create_dir_all(link.parent().unwrap()).unwrap();
        symlink("../../../sdd", link).unwrap();
    });

    let device = waiter
        .wait_for_device(
            Lun::new(3),
            &CancelToken::with_timeout(Duration::from_secs(10)),
        )
        .unwrap();
    handle.join().unwrap();
    assert_eq!(device, sdd);
}
