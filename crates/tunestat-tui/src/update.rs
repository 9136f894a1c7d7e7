//! Gate reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tunestat_core::gate::GateView;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{AppState, Notice};

pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Init => {
            if app.mount_requested || app.consent.is_resolved() {
                return vec![];
            }
            app.mount_requested = true;
            vec![UiEffect::MountGate]
        }
        UiEvent::Tick => {
            app.spinner_frame = app.spinner_frame.wrapping_add(1);
            vec![]
        }
        UiEvent::GateResolved(state) => {
            // One transition per mount.
            if app.consent.is_resolved() {
                tracing::debug!(state = state.label(), "ignoring late gate result");
            } else {
                app.consent = state;
            }
            vec![]
        }
        UiEvent::BrowserOpened(result) => {
            app.notice = Some(match result {
                Ok(()) => Notice::Info("Opened the login page in your browser.".to_string()),
                Err(err) => Notice::Error(format!(
                    "Could not open a browser ({err}). Visit {}",
                    app.login_url
                )),
            });
            vec![]
        }
        UiEvent::Terminal(Event::Key(key)) if key.kind == KeyEventKind::Press => {
            handle_key(app, key)
        }
        UiEvent::Terminal(_) => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
    if ctrl_c || key.code == KeyCode::Char('q') {
        app.should_quit = true;
        return vec![];
    }

    match (app.view(), key.code) {
        (GateView::LoginPrompt { login_url }, KeyCode::Enter | KeyCode::Char('l')) => {
            vec![UiEffect::OpenBrowser { url: login_url }]
        }
        (GateView::TrackingWarning, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('d')) => {
            app.warning_dismissed = true;
            vec![]
        }
        (GateView::TrackingWarning | GateView::TrackingWarningDismissed, KeyCode::Char('l')) => {
            vec![UiEffect::OpenBrowser {
                url: app.login_url.clone(),
            }]
        }
        _ => vec![],
    }
}
