//! Ctrl+C cancellation handling.

use lunwait_core::CancelToken;
use std::sync::OnceLock;

static HANDLER_SET: OnceLock<()> = OnceLock::new();

/// Fire `token` on SIGINT/SIGTERM so an open-ended wait ends with a `cancelled` report.
pub fn install_ctrlc_handler(token: &CancelToken) -> anyhow::Result<()> {
    if HANDLER_SET.get().is_some() {
        return Ok(());
    }

    let token = token.clone();
    ctrlc::set_handler(move || {
        token.cancel();
        log::info!("Cancellation requested (Ctrl+C).");
    })?;

    let _ = HANDLER_SET.set(());
    Ok(())
}
