//! CLI command handlers.

pub mod config;
pub mod gate;
pub mod login;
pub mod logout;
pub mod status;
pub mod tracks;

use anyhow::Result;
use tunestat_core::config::Config;
use tunestat_core::gate::ConsentGate;
use tunestat_core::session::{
    ConsentState, HttpSessionProbe, LocalStorage, MemoryFallbackStore, ReferrerDetector,
    TokenFallbackStore,
};

pub type Store = Box<dyn TokenFallbackStore + Send + Sync>;
pub type Gate = ConsentGate<HttpSessionProbe, Store>;

/// Inputs shared by every command that mounts the gate.
#[derive(Debug, Clone, Default)]
pub struct MountOptions {
    pub referrer: Option<String>,
    pub ephemeral: bool,
}

pub fn open_store(config: &Config, ephemeral: bool) -> Result<Store> {
    if ephemeral {
        return Ok(Box::new(MemoryFallbackStore::default()));
    }
    Ok(Box::new(LocalStorage::from_config(config)?))
}

/// Builds an unmounted gate and the detector for this load.
pub fn build_gate(config: &Config, options: &MountOptions) -> Result<(Gate, ReferrerDetector)> {
    let probe = HttpSessionProbe::from_config(config)?;
    let store = open_store(config, options.ephemeral)?;
    let gate = ConsentGate::new(probe, store, config.endpoint("login")?);
    let detector = ReferrerDetector::from_config(config, options.referrer.clone());
    Ok((gate, detector))
}

/// Mounts a gate without a UI and returns the resolved state with its login URL.
pub async fn resolve(config: &Config, options: &MountOptions) -> Result<(ConsentState, url::Url)> {
    let (mut gate, detector) = build_gate(config, options)?;
    gate.mount(&detector).await;
    let login_url = gate.login_url().clone();
    Ok((gate.into_state(), login_url))
}
