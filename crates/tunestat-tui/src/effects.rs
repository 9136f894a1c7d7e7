//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! The reducer never performs I/O or spawns tasks directly.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Spawn the one-time gate mount (probe, reconcile, persist).
    MountGate,
    /// Navigate to the backend login endpoint in the system browser.
    OpenBrowser { url: Url },
}
