use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;

use crate::auth::extractor::AuthUser;
use crate::state::SharedState;

/// Live events for the caller: its own user topic and its roles.
/// Events published while the client is disconnected are not replayed.
pub async fn stream(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let user_id = auth.user_id;
    let roles = auth.roles;
    tracing::debug!(user_id = %user_id, "Live event stream opened");

    let events = BroadcastStream::new(state.events.subscribe()).filter_map(move |received| {
        let event = match received {
            Ok(event) => event,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(user_id = %user_id, skipped, "Live event stream lagged");
                return None;
            }
        };
        if !event.topic.admits(user_id, &roles) {
            return None;
        }
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event(event.name.as_str()).data(data)))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
