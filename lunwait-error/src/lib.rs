use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type HalResult<T> = Result<T, HalError>;
pub type ProbeResult<T> = Result<T, ProbeError>;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(String),

    #[error("Too many levels of symbolic links: {}", .0.display())]
    SymlinkLoop(PathBuf),

    #[error("{0}")]
    Other(String),
}

impl HalError {
    /// True when the error means "nothing there (yet)" rather than a broken system.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HalError::Io(err) if err.kind() == io::ErrorKind::NotFound)
    }
}

/// Filesystem operation that a probe was performing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOp {
    Stat,
    EvalSymlink,
    Glob,
    ReadFile,
    ReadDir,
}

impl fmt::Display for ProbeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOp::Stat => write!(f, "stat"),
            ProbeOp::EvalSymlink => write!(f, "eval symlink"),
            ProbeOp::Glob => write!(f, "glob"),
            ProbeOp::ReadFile => write!(f, "read file"),
            ProbeOp::ReadDir => write!(f, "read dir"),
        }
    }
}

/// Hard failure while probing for a device. Never retried.
#[derive(Error, Debug)]
#[error("{op} {path}: {source}")]
pub struct ProbeError {
    pub op: ProbeOp,
    pub path: String,
    #[source]
    pub source: HalError,
}

impl ProbeError {
    pub fn new(op: ProbeOp, path: impl Into<String>, source: HalError) -> Self {
        Self {
            op,
            path: path.into(),
            source,
        }
    }
}

/// Why a wait stopped before a device showed up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => write!(f, "wait cancelled"),
            CancelReason::DeadlineExceeded => write!(f, "wait deadline exceeded"),
        }
    }
}

#[derive(Error, Debug)]
pub enum WaitError {
    #[error("{0}")]
    Cancelled(CancelReason),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl WaitError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitError::Cancelled(_))
    }
}
