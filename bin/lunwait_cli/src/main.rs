use anyhow::{Context, Result};
use clap::Parser;
use lunwait_core::{
    logging, AttachmentWaiter, CancelReason, CancelToken, DeviceMatch, Lun, LunResolver,
    LunwaitConfig, WaitError, WaitOutcome,
};
use lunwait_hal::LinuxFs;
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

mod cancel;
mod cli;

use cli::{Cli, Command};

const EXIT_NOT_FOUND: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
enum Status {
    Found,
    NotFound,
    Detached,
    Cancelled,
    DeadlineExceeded,
}

impl From<CancelReason> for Status {
    fn from(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Cancelled => Status::Cancelled,
            CancelReason::DeadlineExceeded => Status::DeadlineExceeded,
        }
    }
}

#[derive(Debug, Serialize)]
struct Report {
    lun: Lun,
    status: Status,
    #[serde(flatten)]
    device: Option<DeviceMatch>,
}

impl Report {
    fn exit_code(&self) -> ExitCode {
        match self.status {
            Status::Found | Status::Detached => ExitCode::SUCCESS,
            _ => ExitCode::from(EXIT_NOT_FOUND),
        }
    }

    fn print(&self, json: bool) -> Result<()> {
        if json {
            println!("{}", serde_json::to_string(self).context("failed to encode report")?);
        } else if let Some(found) = &self.device {
            println!("{}", found.path.display());
        } else if self.status != Status::Detached {
            log::warn!("lun {}: no device ({:?})", self.lun, self.status);
        }
        Ok(())
    }
}

/// Config file (or defaults) with command line overrides applied.
fn load_config(cli: &Cli) -> Result<LunwaitConfig> {
    let mut cfg = match &cli.config {
        Some(path) => LunwaitConfig::load(path)?,
        None => LunwaitConfig::default(),
    };
    if let Some(root) = &cli.root {
        cfg.root = root.clone();
    }
    if let Some(ms) = cli.poll_interval_ms {
        cfg.poll_interval_ms = ms;
    }
    if let Some(level) = &cli.log_level {
        cfg.log_level = level.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

/// Token for the command's wait, carrying its `--timeout-secs` deadline if any.
fn wait_token(command: &Command) -> CancelToken {
    let timeout_secs = match command {
        Command::Wait(args) | Command::WaitDetach(args) => args.timeout_secs,
        Command::Resolve(_) => None,
    };
    match timeout_secs {
        Some(secs) => CancelToken::with_timeout(Duration::from_secs(secs)),
        None => CancelToken::new(),
    }
}

fn run(cli: &Cli, waiter: &AttachmentWaiter, token: &CancelToken) -> Result<Report> {
    match &cli.command {
        Command::Resolve(args) => {
            let res = waiter
                .resolver()
                .resolve(args.lun)
                .with_context(|| format!("failed to resolve lun {}", args.lun))?;
            let device = res.device().cloned();
            Ok(Report {
                lun: args.lun,
                status: if device.is_some() {
                    Status::Found
                } else {
                    Status::NotFound
                },
                device,
            })
        }
        Command::Wait(args) => match waiter.wait(args.lun, token) {
            WaitOutcome::Resolved(found) => Ok(Report {
                lun: args.lun,
                status: Status::Found,
                device: Some(found),
            }),
            WaitOutcome::Cancelled(reason) => Ok(Report {
                lun: args.lun,
                status: reason.into(),
                device: None,
            }),
            WaitOutcome::Failed(err) => {
                Err(err).with_context(|| format!("failed waiting for lun {}", args.lun))
            }
        },
        Command::WaitDetach(args) => {
            match waiter.wait_for_detach(args.lun, token) {
                Ok(()) => Ok(Report {
                    lun: args.lun,
                    status: Status::Detached,
                    device: None,
                }),
                Err(WaitError::Cancelled(reason)) => Ok(Report {
                    lun: args.lun,
                    status: reason.into(),
                    device: None,
                }),
                Err(WaitError::Probe(err)) => {
                    Err(err).with_context(|| format!("failed waiting for lun {} detach", args.lun))
                }
            }
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;
    logging::init(cfg.level_filter()?, cfg.log_file.as_deref())?;
    log::debug!("lunwait config: {:?}", cfg);

    let resolver = LunResolver::with_layout(Arc::new(LinuxFs::new()), &cfg.layout());
    let waiter = AttachmentWaiter::new(Arc::new(resolver)).with_poll_interval(cfg.poll_interval());

    let token = wait_token(&cli.command);
    cancel::install_ctrlc_handler(&token)?;

    let report = run(&cli, &waiter, &token)?;
    report.print(cli.json)?;
    Ok(report.exit_code())
}
