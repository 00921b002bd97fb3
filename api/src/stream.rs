//! Server-sent event decoding for the `events/streamData` push channel.

use crate::Game;
use crate::client::{ApiError, ApiResult};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Event envelope: `{ value: { games: { schedule: Game[] } } }`
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default)]
struct StreamEnvelope {
    value: Option<StreamValue>,
}

#[derive(Debug, Deserialize, Default)]
struct StreamValue {
    games: Option<StreamGames>,
}

#[derive(Debug, Deserialize, Default)]
struct StreamGames {
    #[serde(default)]
    schedule: Vec<Game>,
}

/// Pull the snapshot for `game_id` out of one event payload.
///
/// `Ok(None)` when the event carries no games or not this one.
pub fn find_game(payload: &str, game_id: &str) -> ApiResult<Option<Game>> {
    let envelope: StreamEnvelope = serde_json::from_str(payload)
        .map_err(|e| ApiError::Stream(format!("invalid stream event: {e}")))?;
    Ok(envelope
        .value
        .and_then(|v| v.games)
        .and_then(|g| g.schedule.into_iter().find(|game| game.id == game_id)))
}

// ---------------------------------------------------------------------------
// SSE framing
// ---------------------------------------------------------------------------

/// Incremental `text/event-stream` decoder.
///
/// Feed raw body chunks with [`push`](Self::push); each completed event's
/// `data` lines come back joined with `\n`. Only `data` fields are kept,
/// `event`/`id`/`retry` and comments are skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            if field == "data" {
                self.data.push(value.to_string());
            }
        }
        events
    }
}
