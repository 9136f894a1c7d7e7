//! `tunestat status`: resolve once, print the outcome.

use anyhow::Result;
use serde::Serialize;
use tunestat_core::config::Config;
use tunestat_core::gate::{GateView, TRACKING_FIX_STEPS};
use tunestat_core::session::{ConsentState, CredentialSource, mask_token};
use url::Url;

use super::{MountOptions, resolve};

/// Machine-readable status. Tokens are masked.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<CredentialSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login_url: Option<String>,
}

impl StatusReport {
    pub fn new(state: &ConsentState, login_url: &Url) -> Self {
        let (source, token) = match state {
            ConsentState::Authenticated { token, source } => (Some(*source), Some(mask_token(token))),
            _ => (None, None),
        };
        let login_url = matches!(
            state,
            ConsentState::NeedsLogin | ConsentState::NeedsTrackingFix
        )
        .then(|| login_url.to_string());
        Self {
            state: state.label(),
            source,
            token,
            login_url,
        }
    }
}

pub async fn run(config: &Config, options: MountOptions, json: bool) -> Result<()> {
    let (state, login_url) = resolve(config, &options).await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&StatusReport::new(&state, &login_url))?
        );
    } else {
        print_human(&state, &login_url);
    }
    Ok(())
}

pub fn print_human(state: &ConsentState, login_url: &Url) {
    match GateView::select(state, false, login_url) {
        GateView::Loading => println!("Session unresolved."),
        GateView::Protected { token, source } => {
            let via = match source {
                CredentialSource::Cookie => "session cookie",
                CredentialSource::Fallback => "saved credential",
            };
            println!("Logged in via {via} (token: {})", mask_token(&token));
        }
        GateView::LoginPrompt { login_url } => {
            println!("Not logged in.");
            println!("Run `tunestat login` or visit {login_url}");
        }
        GateView::TrackingWarning | GateView::TrackingWarningDismissed => {
            println!("Login blocked by browser.");
            for step in TRACKING_FIX_STEPS {
                println!("  {step}");
            }
            println!("Login page: {login_url}");
        }
    }
}
