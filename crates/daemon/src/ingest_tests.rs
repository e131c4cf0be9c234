// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use evr_core::{FakeClock, Priority, RouterConfig, SequentialIdGen};

fn router(config: RouterConfig) -> EventRouter<FakeClock, SequentialIdGen> {
    EventRouter::with_deps(config, FakeClock::new(), SequentialIdGen::new("i")).unwrap()
}

#[tokio::test]
async fn valid_lines_are_published() {
    let router = router(RouterConfig::default());
    let input = br#"{"type": "task", "priority": "high", "payload": {"id": 1}}

{"type": "pr", "priority": "low", "correlation_id": "run-7"}
"#;
    let mut errors = Vec::new();

    let mut summary = IngestSummary::default();
    ingest(&router, &input[..], &mut errors, &mut summary)
        .await
        .unwrap();

    assert_eq!(
        summary,
        IngestSummary {
            accepted: 2,
            refused: 0
        }
    );
    assert_eq!(router.pending(), 2);
    assert!(errors.is_empty());
}

#[tokio::test]
async fn bad_lines_are_reported_and_skipped() {
    let router = router(RouterConfig {
        priority_levels: vec![Priority::High, Priority::Low],
        ..RouterConfig::default()
    });
    let input = b"not json\n\
{\"type\": \"deploy\", \"priority\": \"high\"}\n\
{\"type\": \"task\", \"priority\": \"normal\"}\n\
{\"type\": \"task\", \"priority\": \"high\"}\n";
    let mut errors = Vec::new();

    let mut summary = IngestSummary::default();
    ingest(&router, &input[..], &mut errors, &mut summary)
        .await
        .unwrap();

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.refused, 3);
    let errors = String::from_utf8(errors).unwrap();
    let lines: Vec<_> = errors.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("line 1: invalid event"));
    assert!(lines[1].starts_with("line 2: invalid event"));
    assert!(lines[2].starts_with("line 3: invalid event: priority normal"));
}

#[tokio::test]
async fn full_queue_refusals_are_reported() {
    let router = router(RouterConfig {
        queue_capacity_per_level: 1,
        ..RouterConfig::default()
    });
    let input = b"{\"type\": \"agent\", \"priority\": \"low\"}\n{\"type\": \"agent\", \"priority\": \"low\"}\n";
    let mut errors = Vec::new();

    let mut summary = IngestSummary::default();
    ingest(&router, &input[..], &mut errors, &mut summary)
        .await
        .unwrap();

    assert_eq!(summary.accepted, 1);
    assert_eq!(summary.refused, 1);
    assert_eq!(
        String::from_utf8(errors).unwrap(),
        "line 2: low queue is full (1 events)\n"
    );
}

#[tokio::test]
async fn non_utf8_line_is_refused_and_reading_continues() {
    let router = router(RouterConfig::default());
    let mut input = b"{\"type\": \"task\", \"priority\": \"high\"}\n".to_vec();
    input.extend_from_slice(b"\xff\xfe\n");
    input.extend_from_slice(b"{\"type\": \"pr\", \"priority\": \"low\"}\n");
    let mut errors = Vec::new();
    let mut summary = IngestSummary::default();

    ingest(&router, &input[..], &mut errors, &mut summary)
        .await
        .unwrap();

    assert_eq!(
        summary,
        IngestSummary {
            accepted: 2,
            refused: 1
        }
    );
    assert_eq!(router.pending(), 2);
    let errors = String::from_utf8(errors).unwrap();
    assert!(errors.starts_with("line 2: not UTF-8"), "{errors}");
}

#[tokio::test]
async fn summary_survives_an_interrupted_read() {
    use tokio::io::AsyncWriteExt;

    let router = router(RouterConfig::default());
    let (mut writer, reader) = tokio::io::duplex(1024);
    writer
        .write_all(b"{\"type\": \"agent\", \"priority\": \"normal\"}\n")
        .await
        .unwrap();
    let mut errors = Vec::new();
    let mut summary = IngestSummary::default();

    // The writer stays open, so reading only stops when the future is dropped
    let reader = tokio::io::BufReader::new(reader);
    let interrupted = tokio::time::timeout(
        std::time::Duration::from_millis(50),
        ingest(&router, reader, &mut errors, &mut summary),
    )
    .await;

    assert!(interrupted.is_err());
    assert_eq!(summary.accepted, 1);
    assert_eq!(router.pending(), 1);
}
