use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    dto::sse::{Handshake, ServerEvent, SystemStatus},
    state::{SaveStatus, SharedState},
};

const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_SAVE_STATUS: &str = "save_status";
const EVENT_SYSTEM_STATUS: &str = "system_status";

/// Follow save-status and degraded-mode changes, starting with a handshake carrying both.
///
/// The forwarder task ends as soon as the returned receiver is dropped.
pub fn subscribe_status(state: &SharedState) -> mpsc::Receiver<ServerEvent> {
    let mut save_status = state.save_status().subscribe();
    let mut degraded = state.degraded_watcher();
    let (tx, rx) = mpsc::channel::<ServerEvent>(8);

    let handshake = Handshake {
        message: "save status stream connected".into(),
        degraded: *degraded.borrow_and_update(),
        save_status: save_status.borrow_and_update().clone(),
    };

    tokio::spawn(async move {
        if let Some(event) = encode(EVENT_HANDSHAKE, &handshake) {
            if tx.send(event).await.is_err() {
                return;
            }
        }

        loop {
            let event = tokio::select! {
                _ = tx.closed() => break,
                changed = save_status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let status: SaveStatus = save_status.borrow_and_update().clone();
                    encode(EVENT_SAVE_STATUS, &status)
                }
                changed = degraded.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let degraded = *degraded.borrow_and_update();
                    encode(EVENT_SYSTEM_STATUS, &SystemStatus { degraded })
                }
            };

            if let Some(event) = event {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        }

        info!("save status SSE stream disconnected");
    });

    rx
}

fn encode<T: serde::Serialize>(name: &str, payload: &T) -> Option<ServerEvent> {
    match ServerEvent::json(Some(name.to_string()), payload) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event = name, error = %err, "failed to serialise SSE payload");
            None
        }
    }
}

/// Convert queued server events into an SSE response with periodic keep-alives.
pub fn to_sse_stream(
    receiver: mpsc::Receiver<ServerEvent>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = ReceiverStream::new(receiver).map(|payload| {
        let mut event = Event::default().data(payload.data);
        if let Some(name) = payload.event {
            event = event.event(name);
        }
        Ok(event)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
