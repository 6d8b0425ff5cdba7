use std::sync::Arc;

use tokio::sync::broadcast;

use crate::config::Config;
use crate::directory::InMemoryDirectory;
use crate::dispatch::DispatchApi;
use crate::engine::matching::MatchingEngine;
use crate::ledger::RequestLedger;
use crate::location::LocationStore;
use crate::models::event::AssignmentEvent;
use crate::observability::metrics::Metrics;
use crate::store::memory::{InMemoryLocations, InMemoryRequests};

pub struct AppState {
    pub directory: Arc<InMemoryDirectory>,
    pub dispatch: DispatchApi,
    pub assignment_events_tx: broadcast::Sender<AssignmentEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let (assignment_events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);
        let metrics = Metrics::new();

        let directory = Arc::new(InMemoryDirectory::new());
        let locations = LocationStore::new(Arc::new(InMemoryLocations::new(
            config.history_capacity,
        )));
        let ledger = RequestLedger::new(
            Arc::new(InMemoryRequests::new()),
            directory.clone(),
            locations.clone(),
        );
        let matching = MatchingEngine::new(
            ledger.clone(),
            locations.clone(),
            directory.clone(),
            config.matching(),
        );
        let dispatch = DispatchApi::new(
            directory.clone(),
            locations,
            ledger,
            matching,
            assignment_events_tx.clone(),
            metrics.clone(),
            config.history_default_limit,
        );

        Self {
            directory,
            dispatch,
            assignment_events_tx,
            metrics,
        }
    }
}
