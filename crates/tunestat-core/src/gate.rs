//! Consent gate controller.
//!
//! Gathers the session signals once per mount, reconciles them, and persists
//! a freshly confirmed token. This is the only place that writes the fallback
//! store during a mount.

use url::Url;

use crate::session::{
    ConsentState, CredentialSource, ReturnPathDetector, SessionProbe, TokenFallbackStore,
    mask_token, reconcile,
};

/// The single view to present for a consent state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateView {
    /// Reconciliation has not finished; nothing else renders.
    Loading,
    /// No session: offer navigation to the backend login endpoint.
    LoginPrompt { login_url: Url },
    /// Likely blocked cookie after returning from the auth provider.
    TrackingWarning,
    /// Tracking warning closed by the user. Consent is unchanged.
    TrackingWarningDismissed,
    /// Authenticated content.
    Protected {
        token: String,
        source: CredentialSource,
    },
}

impl GateView {
    /// Selects the view for `state`. `dismissed` only affects the tracking warning.
    pub fn select(state: &ConsentState, dismissed: bool, login_url: &Url) -> Self {
        match state {
            ConsentState::Unresolved => GateView::Loading,
            ConsentState::Authenticated { token, source } => GateView::Protected {
                token: token.clone(),
                source: *source,
            },
            ConsentState::NeedsLogin => GateView::LoginPrompt {
                login_url: login_url.clone(),
            },
            ConsentState::NeedsTrackingFix if dismissed => GateView::TrackingWarningDismissed,
            ConsentState::NeedsTrackingFix => GateView::TrackingWarning,
        }
    }
}

/// Remediation steps shown with the tracking warning.
pub const TRACKING_FIX_STEPS: &[&str] = &[
    "Your browser blocked the login cookie after sign-in.",
    "Allow third-party cookies for the tunestat backend,",
    "or turn off cross-site tracking prevention for it,",
    "then log in again.",
];

/// Runs reconciliation once and holds the result for the rest of the mount.
#[derive(Debug)]
pub struct ConsentGate<P, S> {
    probe: P,
    store: S,
    login_url: Url,
    state: ConsentState,
    mounted: bool,
    dismissed: bool,
}

impl<P, S> ConsentGate<P, S>
where
    P: SessionProbe,
    S: TokenFallbackStore,
{
    pub fn new(probe: P, store: S, login_url: Url) -> Self {
        Self {
            probe,
            store,
            login_url,
            state: ConsentState::Unresolved,
            mounted: false,
            dismissed: false,
        }
    }

    /// Resolves consent for this mount.
    ///
    /// The store and detector are read before the probe is awaited. Later
    /// calls return the existing state without probing again.
    pub async fn mount(&mut self, detector: &impl ReturnPathDetector) -> &ConsentState {
        if self.mounted {
            return &self.state;
        }
        self.mounted = true;

        let fallback = self.store.read();
        let returned = detector.was_referred_from_auth_domain();
        let probe = self.probe.probe().await;
        if let Err(err) = &probe {
            tracing::warn!(kind = %err.kind, error = %err.message, "session probe failed");
        }

        let state = reconcile(&probe, fallback.as_ref(), returned);
        if let ConsentState::Authenticated {
            token,
            source: CredentialSource::Cookie,
        } = &state
        {
            self.store.write(token);
        }

        match &state {
            ConsentState::Authenticated { token, source } => tracing::info!(
                state = state.label(),
                source = ?source,
                token = %mask_token(token),
                "consent resolved"
            ),
            other => tracing::info!(
                state = other.label(),
                has_fallback = fallback.is_some(),
                returned,
                "consent resolved"
            ),
        }

        self.state = state;
        &self.state
    }

    pub fn state(&self) -> &ConsentState {
        &self.state
    }

    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    pub fn view(&self) -> GateView {
        GateView::select(&self.state, self.dismissed, &self.login_url)
    }

    /// Closes the tracking dialog. Consent is unchanged.
    pub fn dismiss_warning(&mut self) {
        self.dismissed = true;
    }

    pub fn into_state(self) -> ConsentState {
        self.state
    }
}
