pub mod config;
pub mod digest;
pub mod profile;
pub mod suggest;

use std::sync::Arc;

use serendipity_core::{
    EngineConfig, HttpFetcher, JsonProfileStore, ProfileStore, SelectorExtractor,
    SerendipityEngine,
};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Engine over the on-disk profile store, fetching sources over HTTP.
pub fn open_engine() -> Result<SerendipityEngine, Box<dyn std::error::Error>> {
    let store: Arc<dyn ProfileStore> = Arc::new(JsonProfileStore::open()?);
    Ok(SerendipityEngine::new(
        store,
        Arc::new(HttpFetcher::new()),
        Arc::new(SelectorExtractor::new()),
        EngineConfig::load()?,
    ))
}

pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread().enable_all().build()
}
