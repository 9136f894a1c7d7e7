//! Default command: the interactive consent gate.

use anyhow::Result;
use tunestat_core::config::Config;

use super::{MountOptions, build_gate};

#[cfg(feature = "tui")]
pub async fn run(config: &Config, options: MountOptions) -> Result<()> {
    let (mut gate, detector) = build_gate(config, &options)?;
    let login_url = gate.login_url().clone();
    let mount = async move { gate.mount(&detector).await.clone() };

    let state = tunestat_tui::run_consent_gate(login_url, mount).await?;
    tracing::debug!(state = state.label(), "gate closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
pub async fn run(config: &Config, options: MountOptions) -> Result<()> {
    // Validate the config so misconfiguration is reported the same way.
    build_gate(config, &options)?;
    anyhow::bail!("TUI support is disabled in this build (feature \"tui\"). Use `tunestat status`.");
}
