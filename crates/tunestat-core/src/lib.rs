//! Core library for tunestat.
//!
//! Config, logging, session reconciliation and the consent gate controller,
//! plus the typed client for the backend's track endpoints.

pub mod config;
pub mod gate;
pub mod logging;
pub mod session;
pub mod tracks;
