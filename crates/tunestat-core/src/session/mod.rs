//! Session signals and consent reconciliation.
//!
//! Three unreliable signals decide whether the user is logged in:
//! - `probe`: the backend's view of the session cookie (`/auth-status`)
//! - `store`: a locally persisted fallback credential
//! - `referrer`: whether this load follows a redirect from the auth provider
//!
//! `reconcile` folds them into a single [`ConsentState`].

pub mod probe;
pub mod reconcile;
pub mod referrer;
pub mod store;

use serde::Serialize;

pub use probe::{HttpSessionProbe, ProbeError, ProbeErrorKind, SessionProbe};
pub use reconcile::reconcile;
pub use referrer::{ReferrerDetector, ReturnPathDetector};
pub use store::{LocalStorage, MemoryFallbackStore, TokenFallbackStore};

/// The backend's answer to a session probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub authenticated: bool,
    pub token: Option<String>,
}

impl ProbeResult {
    pub fn authenticated(token: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            token: Some(token.into()),
        }
    }

    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            token: None,
        }
    }
}

/// A token previously confirmed by the backend and kept in local storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackCredential {
    pub token: String,
}

impl FallbackCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// Where an authenticated token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialSource {
    /// Confirmed by the backend during this mount.
    Cookie,
    /// Read from local storage without server confirmation.
    Fallback,
}

/// Resolved consent state for one mount.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConsentState {
    /// Nothing resolved yet.
    #[default]
    Unresolved,
    /// A usable token exists. The token is never empty.
    Authenticated {
        token: String,
        source: CredentialSource,
    },
    /// No session and no sign of a failed return from the auth provider.
    NeedsLogin,
    /// No session, but the user just returned from the auth provider, so the
    /// browser most likely dropped the session cookie.
    NeedsTrackingFix,
}

impl ConsentState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ConsentState::Unresolved)
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            ConsentState::Authenticated { token, .. } => Some(token),
            _ => None,
        }
    }

    /// Stable lowercase label for logs and machine-readable output.
    pub fn label(&self) -> &'static str {
        match self {
            ConsentState::Unresolved => "unresolved",
            ConsentState::Authenticated { .. } => "authenticated",
            ConsentState::NeedsLogin => "needs_login",
            ConsentState::NeedsTrackingFix => "needs_tracking_fix",
        }
    }
}

/// Masks a token for display. Tokens are never logged or shown in full.
pub fn mask_token(token: &str) -> String {
    if token.chars().count() <= 16 {
        return "***".to_string();
    }
    let prefix: String = token.chars().take(12).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_tokens_are_fully_masked() {
        assert_eq!(mask_token("abc"), "***");
        assert_eq!(mask_token("0123456789abcdef"), "***");
    }

    #[test]
    fn long_tokens_keep_a_prefix() {
        assert_eq!(mask_token("BQDh3k2lKs9aZZZZZZZZZZZ"), "BQDh3k2lKs9a...");
    }

    #[test]
    fn only_authenticated_carries_a_token() {
        let state = ConsentState::Authenticated {
            token: "abc".to_string(),
            source: CredentialSource::Cookie,
        };
        assert_eq!(state.token(), Some("abc"));
        assert_eq!(ConsentState::NeedsLogin.token(), None);
        assert!(!ConsentState::Unresolved.is_resolved());
        assert!(ConsentState::NeedsTrackingFix.is_resolved());
    }
}
