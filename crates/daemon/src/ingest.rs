// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-lines event intake
//!
//! Each non-blank line is one event:
//! `{"type": "task", "priority": "high", "payload": {...}, "correlation_id": "..."}`.
//! Lines that are not UTF-8, fail to parse or fail to publish are reported
//! and skipped.

use evr_core::{Clock, IdGen, NewEvent};
use evr_router::EventRouter;
use serde::Serialize;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub accepted: u64,
    pub refused: u64,
}

/// Publish every event read from `reader` until end of input
///
/// Counts go into `summary` as each line is handled, so they survive the
/// future being dropped part way. Refused lines are written to `errors` as
/// `line N: reason`.
pub async fn ingest<R, W, C, I>(
    router: &EventRouter<C, I>,
    mut reader: R,
    errors: &mut W,
    summary: &mut IngestSummary,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
    C: Clock,
    I: IdGen,
{
    let mut buf = Vec::new();
    let mut line_no = 0u64;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        line_no += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                summary.refused += 1;
                writeln!(errors, "line {}: not UTF-8: {}", line_no, e)?;
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let draft = match serde_json::from_str::<NewEvent>(line) {
            Ok(draft) => draft,
            Err(e) => {
                summary.refused += 1;
                writeln!(errors, "line {}: invalid event: {}", line_no, e)?;
                continue;
            }
        };

        match router.publish(draft).await {
            Ok(ack) => {
                summary.accepted += 1;
                tracing::debug!(line = line_no, event_id = %ack.event_id, "accepted");
            }
            Err(e) => {
                summary.refused += 1;
                writeln!(errors, "line {}: {}", line_no, e)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "ingest_tests.rs"]
mod tests;
