//! Terminal cells for text output and the JSON reply written for `--format json`.
//!
//! Every JSON reply carries the same header (`envelope_version`, `ts`,
//! `event_id`, `cmd`, `status`) with the command payload flattened beside it.

use crate::core::time::now_epoch_z;
use serde::Serialize;
use ulid::Ulid;

pub const ENVELOPE_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Ok,
    NotFound,
}

impl ReplyStatus {
    pub fn found(present: bool) -> Self {
        if present {
            ReplyStatus::Ok
        } else {
            ReplyStatus::NotFound
        }
    }
}

/// One command's JSON reply. `payload` must serialize to an object.
#[derive(Debug, Serialize)]
pub struct Reply<'a, T: Serialize> {
    pub envelope_version: &'static str,
    pub ts: String,
    pub event_id: String,
    pub cmd: &'a str,
    pub status: ReplyStatus,
    #[serde(flatten)]
    pub payload: T,
}

impl<'a, T: Serialize> Reply<'a, T> {
    pub fn new(cmd: &'a str, status: ReplyStatus, payload: T) -> Self {
        Self {
            envelope_version: ENVELOPE_VERSION,
            ts: now_epoch_z(),
            event_id: Ulid::new().to_string(),
            cmd,
            status,
            payload,
        }
    }
}

/// Squeeze runs of whitespace to one space and cut at `max_chars`, marking the cut with `...`.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let squeezed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    match squeezed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &squeezed[..cut]),
        None => squeezed,
    }
}

/// Compact `input` to `width` and left-align it in a column of that width.
pub fn column(input: &str, width: usize) -> String {
    let cell = compact_line(input, width.saturating_sub(3).max(1));
    format!("{:<width$}", cell, width = width)
}

pub fn rule(width: usize) -> String {
    "-".repeat(width)
}
