//! End-to-end triage runs against an in-memory mailbox and state store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;

use mail_triage_lib::adapters::SnapshotThread;
use mail_triage_lib::types::{Direction, MessageRef};
use mail_triage_lib::{
    ArchiveOutcome, ManualClock, SnapshotSource, SqliteStateStore, SuppressionStore, TriageConfig,
    TriageEngine,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 9, 0, 0).unwrap()
}

fn inbound(thread: &str, id: &str, from: &str, snippet: &str, at: DateTime<Utc>) -> MessageRef {
    MessageRef {
        id: id.to_string(),
        thread_id: thread.to_string(),
        sender: from.to_string(),
        subject_line: format!("About {thread}"),
        snippet: snippet.to_string(),
        direction_labels: ["INBOX".to_string()].into_iter().collect(),
        timestamp: at,
    }
}

fn outbound(thread: &str, id: &str, snippet: &str, at: DateTime<Utc>) -> MessageRef {
    MessageRef {
        id: id.to_string(),
        thread_id: thread.to_string(),
        sender: "Me <me@example.com>".to_string(),
        subject_line: format!("About {thread}"),
        snippet: snippet.to_string(),
        direction_labels: ["SENT".to_string()].into_iter().collect(),
        timestamp: at,
    }
}

fn thread(id: &str, messages: Vec<MessageRef>) -> SnapshotThread {
    SnapshotThread {
        id: id.to_string(),
        in_inbox: true,
        messages,
    }
}

struct Harness {
    engine: TriageEngine,
    source: Arc<SnapshotSource>,
    store: Arc<SqliteStateStore>,
    clock: Arc<ManualClock>,
}

/// T1: automated sender, T2: inbound question, T3: unanswered outbound question.
fn harness() -> Harness {
    let source = Arc::new(SnapshotSource::from_threads(vec![
        thread(
            "T1",
            vec![inbound(
                "T1",
                "m1",
                "Service <noreply@service.example>",
                "Please confirm your subscription?",
                t0() - Duration::hours(3),
            )],
        ),
        thread(
            "T2",
            vec![inbound(
                "T2",
                "m2",
                "Colleague <colleague@example.com>",
                "Can you send me the report by Friday?",
                t0() - Duration::hours(2),
            )],
        ),
        thread(
            "T3",
            vec![outbound(
                "T3",
                "m3",
                "Could you confirm the meeting time?",
                t0() - Duration::hours(1),
            )],
        ),
    ]));
    let store = Arc::new(SqliteStateStore::in_memory().unwrap());
    let clock = Arc::new(ManualClock::new(t0()));
    let engine = TriageEngine::new(TriageConfig::default(), source.clone(), store.clone())
        .unwrap()
        .with_clock(clock.clone());

    Harness {
        engine,
        source,
        store,
        clock,
    }
}

fn flagged_ids(report: &mail_triage_lib::TriageReport) -> Vec<String> {
    report.flagged.iter().map(|item| item.id.clone()).collect()
}

#[tokio::test]
async fn scenario_a_automated_sender_never_flagged() {
    let h = harness();
    let report = h.engine.run_triage(Duration::hours(72)).await.unwrap();
    assert!(!flagged_ids(&report).contains(&"T1".to_string()));
    assert!(!report.summary.contains("noreply"));
}

#[tokio::test]
async fn scenario_b_and_c_directions() {
    let h = harness();
    let report = h.engine.run_triage(Duration::hours(72)).await.unwrap();

    assert_eq!(flagged_ids(&report), vec!["T3", "T2"]);
    let inbound: Vec<&str> = report.inbound().map(|i| i.id.as_str()).collect();
    let outbound: Vec<&str> = report.outbound().map(|i| i.id.as_str()).collect();
    assert_eq!(inbound, vec!["T2"]);
    assert_eq!(outbound, vec!["T3"]);

    assert!(report.summary.starts_with("Unanswered mail: 2 threads"));
    assert!(report.summary.contains("Waiting for your reply (1):"));
    assert!(report.summary.contains("Waiting for their reply (1):"));
}

#[tokio::test]
async fn scenario_d_archive_excludes_unchanged_thread() {
    let h = harness();
    assert_eq!(h.engine.on_archive("T2").await.unwrap(), ArchiveOutcome::Changed);

    // The recent query still lists T2; only the record hides it.
    let report = h.engine.run_triage(Duration::hours(72)).await.unwrap();
    assert_eq!(flagged_ids(&report), vec!["T3"]);
    assert_eq!(report.stats.suppressed_by_state, 1);
}

#[tokio::test]
async fn scenario_e_defer_expires() {
    let h = harness();
    h.engine.on_defer("T3", Duration::hours(6)).await.unwrap();

    h.clock.advance(Duration::hours(1));
    let report = h.engine.run_triage(Duration::hours(72)).await.unwrap();
    assert!(!flagged_ids(&report).contains(&"T3".to_string()));

    h.clock.advance(Duration::hours(6));
    let report = h.engine.run_triage(Duration::hours(72)).await.unwrap();
    assert!(flagged_ids(&report).contains(&"T3".to_string()));
}

#[tokio::test]
async fn repeated_runs_are_identical_and_read_only() {
    let h = harness();
    h.engine.on_defer("T1", Duration::hours(2)).await.unwrap();
    let before = h.store.stats(t0()).unwrap();

    let first = h.engine.run_triage(Duration::hours(72)).await.unwrap();
    let second = h.engine.run_triage(Duration::hours(72)).await.unwrap();

    assert_eq!(first.flagged, second.flagged);
    assert_eq!(first.summary, second.summary);
    assert_eq!(h.store.stats(t0()).unwrap(), before);
}

#[tokio::test]
async fn reply_to_outbound_question_clears_flag() {
    let h = harness();
    h.source
        .push_message(inbound(
            "T3",
            "m4",
            "Colleague <colleague@example.com>",
            "10am works.",
            t0() - Duration::minutes(30),
        ))
        .await;

    let report = h.engine.run_triage(Duration::hours(72)).await.unwrap();
    assert_eq!(flagged_ids(&report), vec!["T2"]);
}

#[tokio::test]
async fn owner_reply_to_inbound_question_clears_flag() {
    let h = harness();
    h.source
        .push_message(outbound("T2", "m5", "Attached.", t0() - Duration::minutes(10)))
        .await;

    let report = h.engine.run_triage(Duration::hours(72)).await.unwrap();
    let t2 = report.flagged.iter().find(|item| item.id == "T2");
    assert!(t2.is_none());
    assert_eq!(flagged_ids(&report), vec!["T3"]);
}

#[tokio::test]
async fn same_text_flags_both_directions() {
    let text = "Could you review the draft?";
    let source = Arc::new(SnapshotSource::from_threads(vec![
        thread("in", vec![inbound("in", "a", "Ann <ann@example.com>", text, t0() - Duration::hours(2))]),
        thread("out", vec![outbound("out", "b", text, t0() - Duration::hours(1))]),
    ]));
    let store = Arc::new(SqliteStateStore::in_memory().unwrap());
    let engine = TriageEngine::new(TriageConfig::default(), source, store)
        .unwrap()
        .with_clock(Arc::new(ManualClock::new(t0())));

    let report = engine.run_triage(Duration::hours(72)).await.unwrap();
    let directions: Vec<(String, Direction)> = report
        .flagged
        .iter()
        .map(|item| (item.id.clone(), item.direction))
        .collect();
    assert_eq!(
        directions,
        vec![
            ("out".to_string(), Direction::Outbound),
            ("in".to_string(), Direction::Inbound),
        ]
    );
}

#[tokio::test]
async fn archive_survives_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.sqlite");
    let h = harness();

    {
        let store = Arc::new(SqliteStateStore::open(&path).unwrap());
        let engine = TriageEngine::new(TriageConfig::default(), h.source.clone(), store)
            .unwrap()
            .with_clock(h.clock.clone());
        engine.on_archive("T2").await.unwrap();
    }

    let store = Arc::new(SqliteStateStore::open(&path).unwrap());
    let engine = TriageEngine::new(TriageConfig::default(), h.source.clone(), store)
        .unwrap()
        .with_clock(h.clock.clone());
    let report = engine.run_triage(Duration::hours(72)).await.unwrap();
    assert_eq!(flagged_ids(&report), vec!["T3"]);
}

#[tokio::test]
async fn empty_mailbox_gives_empty_summary() {
    let source = Arc::new(SnapshotSource::from_threads(Vec::new()));
    let store = Arc::new(SqliteStateStore::in_memory().unwrap());
    let engine = TriageEngine::new(TriageConfig::default(), source, store).unwrap();

    let report = engine.run_triage(Duration::hours(72)).await.unwrap();
    assert!(report.is_empty());
    assert_eq!(report.summary, "");
}
