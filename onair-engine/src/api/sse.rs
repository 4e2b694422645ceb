//! Server-Sent Events (SSE) broadcaster
//!
//! Streams on-air events to connected clients.

use crate::api::server::AppContext;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::{Stream, StreamExt};
use onair_common::events::OnAirEvent;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// GET /events - SSE event stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!("New SSE client connected");

    let rx = ctx.shared.subscribe_events();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => {
                    let event_type = event_type_str(&event);
                    Some(Ok(Event::default().event(event_type).data(json)))
                }
                Err(e) => {
                    warn!("Failed to serialize event: {}", e);
                    None
                }
            },
            Err(e) => {
                // BroadcastStream error (lagged or closed)
                warn!("SSE stream error: {:?}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Extract event type string from OnAirEvent
fn event_type_str(event: &OnAirEvent) -> &'static str {
    match event {
        OnAirEvent::FieldVisibilityChanged { .. } => "FieldVisibilityChanged",
        OnAirEvent::FieldAdopted { .. } => "FieldAdopted",
        OnAirEvent::RemoteCorrected { .. } => "RemoteCorrected",
        OnAirEvent::CountdownStarted { .. } => "CountdownStarted",
        OnAirEvent::CountdownTick { .. } => "CountdownTick",
        OnAirEvent::CountdownCancelled { .. } => "CountdownCancelled",
        OnAirEvent::WentLive { .. } => "WentLive",
        OnAirEvent::WriteFailed { .. } => "WriteFailed",
    }
}
