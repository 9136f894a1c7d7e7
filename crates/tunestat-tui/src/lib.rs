//! Full-screen consent gate for tunestat.
//!
//! Shows a loading indicator until the core gate resolves, then exactly one
//! of: login prompt, tracking-warning dialog, or protected content.

pub mod effects;
pub mod events;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::future::Future;
use std::io::{IsTerminal, stdout};

use anyhow::Result;
pub use runtime::GateRuntime;
use tunestat_core::session::ConsentState;
use url::Url;

/// Runs the gate UI until the user quits and returns the resolved state.
///
/// Must be called from within a multi-threaded tokio runtime: the mount
/// future is spawned while this thread drives the terminal.
///
/// # Errors
/// Returns an error if stdout is not a terminal or the UI fails.
pub async fn run_consent_gate<F>(login_url: Url, mount: F) -> Result<ConsentState>
where
    F: Future<Output = ConsentState> + Send + 'static,
{
    if !stdout().is_terminal() {
        anyhow::bail!(
            "The gate UI requires a terminal.\n\
             Use `tunestat status` for non-interactive output."
        );
    }

    let mut runtime = GateRuntime::new(login_url, mount)?;
    runtime.run()?;
    Ok(runtime.state.consent.clone())
}
