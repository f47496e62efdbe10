//! Helpers for the kernel's sysfs device hierarchy.

pub mod nvme;
