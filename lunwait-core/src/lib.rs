//! lunwait core library.
//!
//! Maps a LUN (the attachment slot of a virtual disk) to the block device the guest kernel
//! created for it, and waits for that device to appear while the attach is still in flight.
//!
//! The [`resolver`] probes the device namespace once; the [`waiter`] polls it until a device
//! shows up, a hard error occurs, or the caller's [`CancelToken`] fires.

pub mod cancel;
pub mod config;
pub mod layout;
pub mod logging;
pub mod lun;
pub mod observer;
pub mod resolver;
pub mod waiter;

pub use cancel::CancelToken;
pub use config::LunwaitConfig;
pub use layout::DeviceLayout;
pub use lun::Lun;
pub use lunwait_error::{CancelReason, ProbeError, ProbeOp, ProbeResult, WaitError};
pub use observer::{LogObserver, NoopObserver, ProbeEvent, ProbeObserver, RecordingObserver};
pub use resolver::{DeviceMatch, LunResolver, Resolution, Strategy, StrategyKind};
pub use waiter::{wait_for_device, AttachmentWaiter, WaitOutcome, WaitTarget, DEFAULT_POLL_INTERVAL};
