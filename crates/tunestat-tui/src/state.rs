//! Gate UI state.
//!
//! `consent` is the resolved state from the core gate and changes at most
//! once. Everything else is presentation: dismissing the tracking warning,
//! the spinner, and a one-line notice.

use tunestat_core::gate::GateView;
use tunestat_core::session::ConsentState;
use url::Url;

/// Full state of the gate UI.
#[derive(Debug)]
pub struct AppState {
    pub consent: ConsentState,
    pub login_url: Url,
    /// Tracking dialog closed by the user. Cosmetic only.
    pub warning_dismissed: bool,
    /// Mount has been requested; it is never requested twice.
    pub mount_requested: bool,
    pub should_quit: bool,
    pub spinner_frame: usize,
    pub notice: Option<Notice>,
}

/// Transient message under the active view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl AppState {
    pub fn new(login_url: Url) -> Self {
        Self {
            consent: ConsentState::Unresolved,
            login_url,
            warning_dismissed: false,
            mount_requested: false,
            should_quit: false,
            spinner_frame: 0,
            notice: None,
        }
    }

    pub fn view(&self) -> GateView {
        GateView::select(&self.consent, self.warning_dismissed, &self.login_url)
    }
}
