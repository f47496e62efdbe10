//! CLI argument parsing for lunwait.

use clap::{Args, Parser, Subcommand};
use lunwait_core::Lun;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lunwait")]
#[command(about = "Find the Linux block device behind an Azure data disk LUN")]
#[command(long_about = "Find the Linux block device behind an Azure data disk LUN.\n\n\
    Checks /dev/disk/azure aliases, NVMe controller serials and /dev/disk/by-path, in that\n\
    order. Prints the resolved device path on stdout.\n\n\
    Exit status: 0 found, 1 error, 2 not found / timed out.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Read /dev and /sys under this sysroot instead of /
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Delay between probes while waiting
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// error, warn, info, debug or trace (RUST_LOG still wins)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Print a JSON report instead of a bare path
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Probe once and print the device for a LUN
    Resolve(LunArgs),

    /// Wait for the device of a LUN to appear
    Wait(WaitArgs),

    /// Wait for the device of a LUN to go away
    WaitDetach(WaitArgs),
}

#[derive(Args, Debug)]
pub struct LunArgs {
    /// Attachment slot of the data disk
    #[arg(long)]
    pub lun: Lun,
}

#[derive(Args, Debug)]
pub struct WaitArgs {
    /// Attachment slot of the data disk
    #[arg(long)]
    pub lun: Lun,

    /// Give up after this many seconds (default: wait until interrupted)
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}
