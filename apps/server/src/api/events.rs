use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::Stream;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::warn;

use crate::main_lib::AppState;

/// Stream of server events; a lagging client skips what it missed.
async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream =
        BroadcastStream::new(state.event_bus.subscribe()).filter_map(|message| match message {
            Ok(event) => {
                let data = event
                    .payload
                    .map(|payload| payload.to_string())
                    .unwrap_or_default();
                Some(Ok(Event::default().event(event.name).data(data)))
            }
            Err(err) => {
                warn!("Event subscriber lagged: {}", err);
                None
            }
        });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/events", get(stream_events))
}
