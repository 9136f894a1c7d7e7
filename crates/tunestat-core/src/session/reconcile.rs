//! Consent reconciliation.

use super::{ConsentState, CredentialSource, FallbackCredential, ProbeError, ProbeResult};

/// Folds the three session signals into one [`ConsentState`].
///
/// Precedence, first match wins:
/// 1. backend confirms the session -> `Authenticated(Cookie)`; the caller persists the token
/// 2. a stored credential exists -> `Authenticated(Fallback)`
/// 3. the user just returned from the auth provider -> `NeedsTrackingFix`
/// 4. otherwise -> `NeedsLogin`
///
/// A probe error counts as "not confirmed". Never returns `Unresolved`.
pub fn reconcile(
    probe: &Result<ProbeResult, ProbeError>,
    fallback: Option<&FallbackCredential>,
    returned: bool,
) -> ConsentState {
    if let Ok(ProbeResult {
        authenticated: true,
        token: Some(token),
    }) = probe
        && !token.is_empty()
    {
        return ConsentState::Authenticated {
            token: token.clone(),
            source: CredentialSource::Cookie,
        };
    }

    if let Some(credential) = fallback.filter(|c| !c.token.is_empty()) {
        return ConsentState::Authenticated {
            token: credential.token.clone(),
            source: CredentialSource::Fallback,
        };
    }

    if returned {
        ConsentState::NeedsTrackingFix
    } else {
        ConsentState::NeedsLogin
    }
}
