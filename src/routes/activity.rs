use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::activity::ActivityEntry;
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<ActivityEntry>,
    pub total: usize,
    pub limit: usize,
}

/// GET /activity/history: newest first.
pub async fn activity_history(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let entries = state.activity.history().await;
    let total = entries.len();
    let entries = entries.into_iter().rev().take(query.limit).collect();

    Json(HistoryResponse {
        entries,
        total,
        limit: query.limit,
    })
}

/// GET /activity/stream: SSE stream of activity as it happens.
pub async fn activity_stream(
    State(state): State<SharedState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.activity.subscribe());

    // Lagged receivers skip what they missed.
    let event_stream = stream.filter_map(|result| {
        let entry = result.ok()?;
        let data = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().event("activity").data(data)))
    });

    Sse::new(event_stream).keep_alive(KeepAlive::default())
}
