use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{info, warn};

use crate::state::AppState;

/// One-way feed of lifecycle events for notification collaborators.
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.assignment_events_tx.subscribe();
    info!("event subscriber connected");

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => match Event::default().event(event.kind.as_str()).json_data(&event) {
            Ok(sse_event) => Some(Ok(sse_event)),
            Err(err) => {
                warn!(error = %err, "failed to serialize assignment event");
                None
            }
        },
        Err(err) => {
            warn!(error = %err, "event subscriber lagged; skipping");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
