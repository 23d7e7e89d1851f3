use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, realtime::ChangeFeed, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Config,
    pub feed: ChangeFeed,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let feed = ChangeFeed::new(config.feed_capacity);
        Self { store, config, feed }
    }
}

impl FromRef<AppState> for Arc<dyn Store> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for ChangeFeed {
    fn from_ref(state: &AppState) -> Self {
        state.feed.clone()
    }
}
