//! Gate runtime - owns the terminal, runs the event loop, executes effects.
//!
//! All side effects happen here. Async results come back through the inbox
//! channel and are drained once per loop iteration.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use tokio::sync::mpsc;
use tunestat_core::config::ENV_NO_BROWSER;
use tunestat_core::session::ConsentState;
use url::Url;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::terminal::{self, GateTerminal};
use crate::{render, update};

/// Tick cadence; also the longest the loop blocks on terminal input.
pub const TICK_DURATION: Duration = Duration::from_millis(120);

type MountFuture = Pin<Box<dyn Future<Output = ConsentState> + Send>>;

pub struct GateRuntime {
    terminal: GateTerminal,
    pub state: AppState,
    inbox_tx: mpsc::UnboundedSender<UiEvent>,
    inbox_rx: mpsc::UnboundedReceiver<UiEvent>,
    /// Taken exactly once by `UiEffect::MountGate`.
    pending_mount: Option<MountFuture>,
    last_tick: Instant,
}

impl GateRuntime {
    /// Creates the runtime. `mount` resolves consent and is spawned on the
    /// first loop iteration.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up.
    pub fn new<F>(login_url: Url, mount: F) -> Result<Self>
    where
        F: Future<Output = ConsentState> + Send + 'static,
    {
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        Ok(Self {
            terminal,
            state: AppState::new(login_url),
            inbox_tx,
            inbox_rx,
            pending_mount: Some(Box::pin(mount)),
            last_tick: Instant::now(),
        })
    }

    /// Runs the event loop until the user quits, then restores the terminal.
    ///
    /// # Errors
    /// Returns an error if drawing or reading terminal input fails.
    pub fn run(&mut self) -> Result<()> {
        let result = self.event_loop();
        let restored = terminal::restore_terminal();
        result.and(restored)
    }

    fn event_loop(&mut self) -> Result<()> {
        self.dispatch(UiEvent::Init);
        let mut dirty = true;

        while !self.state.should_quit {
            for event in self.collect_events()? {
                self.dispatch(event);
                dirty = true;
            }

            if dirty {
                self.terminal.draw(|frame| render::render(&self.state, frame))?;
                dirty = false;
            }
        }
        Ok(())
    }

    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();
        while let Ok(ev) = self.inbox_rx.try_recv() {
            events.push(ev);
        }

        let poll = if events.is_empty() {
            TICK_DURATION.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };
        if event::poll(poll)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= TICK_DURATION {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }
        Ok(events)
    }

    fn dispatch(&mut self, event: UiEvent) {
        for effect in update::update(&mut self.state, event) {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::MountGate => {
                let Some(mount) = self.pending_mount.take() else {
                    tracing::debug!("gate already mounted");
                    return;
                };
                let tx = self.inbox_tx.clone();
                tokio::spawn(async move {
                    let state = mount.await;
                    let _ = tx.send(UiEvent::GateResolved(state));
                });
            }
            UiEffect::OpenBrowser { url } => {
                let tx = self.inbox_tx.clone();
                tokio::task::spawn_blocking(move || {
                    let _ = tx.send(UiEvent::BrowserOpened(open_browser(&url)));
                });
            }
        }
    }
}

/// Opens `url` in the system browser unless disabled via `TUNESTAT_NO_BROWSER`.
///
/// # Errors
/// Returns the launcher's error message.
pub fn open_browser(url: &Url) -> std::result::Result<(), String> {
    if std::env::var_os(ENV_NO_BROWSER).is_some() {
        return Err(format!("{ENV_NO_BROWSER} is set"));
    }
    tracing::info!(%url, "opening login page");
    open::that(url.as_str()).map_err(|e| e.to_string())
}
