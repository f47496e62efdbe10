//! Filesystem trait definitions and implementations.
//!
//! Provides both the real (`LinuxFs`) and in-memory (`FakeFs`) backends.

pub mod fake_fs;
pub mod fs_ops;
pub mod linux_fs;

pub use fake_fs::{FakeFs, FsCall, Operation};
pub use fs_ops::{FileKind, FsOps};
pub use linux_fs::LinuxFs;
