//! `tunestat logout`: forget the fallback credential for this backend.

use anyhow::Result;
use tunestat_core::config::Config;
use tunestat_core::session::{LocalStorage, TokenFallbackStore};

pub fn run(config: &Config) -> Result<()> {
    let store = LocalStorage::from_config(config)?;
    if store.read().is_none() {
        println!("No saved credential for {}", config.storage_origin()?);
        return Ok(());
    }
    store.clear();
    println!("Removed saved credential for {}", config.storage_origin()?);
    println!("The backend session cookie, if any, is not affected.");
    Ok(())
}
