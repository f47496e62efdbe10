//! lunwait filesystem abstraction layer.
//!
//! Everything that touches the live device namespace (`/dev`, `/sys`) goes through
//! [`FsOps`] so resolution logic can be exercised against an in-memory tree.

pub mod hal;
pub mod path;
pub mod sysfs;

pub use hal::{FakeFs, FileKind, FsCall, FsOps, LinuxFs, Operation};
pub use lunwait_error::{HalError, HalResult};
