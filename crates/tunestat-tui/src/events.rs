//! Events consumed by the reducer.

use crossterm::event::Event;
use tunestat_core::session::ConsentState;

#[derive(Debug)]
pub enum UiEvent {
    /// First event of the loop.
    Init,
    /// Animation tick.
    Tick,
    Terminal(Event),
    /// The mount task finished reconciliation.
    GateResolved(ConsentState),
    /// Result of opening the login page.
    BrowserOpened(Result<(), String>),
}
