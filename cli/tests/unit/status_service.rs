//! Unit tests for status checking and idempotent reconciliation.

#![allow(clippy::expect_used)]

use deskpilot_cli::application::services::status::{
    check_status, reconcile, set_identity_manually,
};
use deskpilot_cli::domain::config::EngineConfig;
use deskpilot_common::{AgentIdentity, PersistedAgentState};

use crate::mocks::{FakeSession, FakeSessionFactory, MemoryRecords, ProbeBehavior, record_for_host};

fn config() -> EngineConfig {
    EngineConfig::default()
}

fn identity(id: &str) -> AgentIdentity {
    AgentIdentity::parse(id).expect("valid identity")
}

fn installed_with(id: &str) -> PersistedAgentState {
    PersistedAgentState {
        installed: true,
        identity: Some(identity(id)),
        installed_at: Some(chrono::Utc::now()),
    }
}

// ── check_status ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn probe_failure_falls_back_to_persisted_state() {
    let session = FakeSession {
        probe: Some(ProbeBehavior::Fail),
        ..FakeSession::default()
    };
    let sessions = FakeSessionFactory::new(session);
    let mut record = record_for_host("10.0.0.5");
    record.agent = installed_with("123456789");
    let records = MemoryRecords::with_record("web-01", record);

    let status = check_status(&sessions, &records, &config(), "web-01")
        .await
        .expect("pure read never errors");

    assert!(status.installed);
    assert_eq!(status.identity, Some(identity("123456789")));
    assert!(records.saved().is_empty(), "a failed probe writes nothing");
}

#[tokio::test]
async fn unresolvable_connection_reports_persisted_state() {
    let sessions = FakeSessionFactory::new(FakeSession::default());
    let mut record = record_for_host("localhost"); // placeholder: unresolvable
    record.agent = installed_with("123456789");
    let records = MemoryRecords::with_record("web-01", record);

    let status = check_status(&sessions, &records, &config(), "web-01")
        .await
        .expect("degrades gracefully");

    assert!(status.installed);
    assert!(sessions.session.executed().is_empty());
}

#[tokio::test]
async fn explicit_not_installed_clears_the_record() {
    let session = FakeSession {
        probe: Some(ProbeBehavior::Respond("NOT_INSTALLED\n")),
        ..FakeSession::default()
    };
    let sessions = FakeSessionFactory::new(session);
    let mut record = record_for_host("10.0.0.5");
    record.agent = installed_with("123456789");
    let records = MemoryRecords::with_record("web-01", record);

    let status = check_status(&sessions, &records, &config(), "web-01").await.expect("runs");

    assert!(!status.installed);
    assert!(status.identity.is_none());
    let saved = records.saved();
    assert_eq!(saved.len(), 1);
    assert!(!saved[0].1.installed);
    assert!(saved[0].1.identity.is_none());
}

#[tokio::test]
async fn installed_without_identity_triggers_discovery() {
    let session = FakeSession {
        probe: Some(ProbeBehavior::Respond("INSTALLED\n")),
        uname: Some("Linux"),
        ..FakeSession::default()
    };
    session.queue_response(Ok("123456789".to_owned()));
    let sessions = FakeSessionFactory::new(session);
    let mut record = record_for_host("10.0.0.5");
    record.agent.installed = true;
    let records = MemoryRecords::with_record("web-01", record);

    let status = check_status(&sessions, &records, &config(), "web-01").await.expect("runs");

    assert!(status.installed);
    assert_eq!(status.identity, Some(identity("123456789")));
    assert_eq!(records.saved().len(), 1, "newly discovered identity is persisted");
}

#[tokio::test]
async fn known_identity_skips_discovery() {
    let session = FakeSession {
        probe: Some(ProbeBehavior::Respond("INSTALLED\n")),
        uname: Some("Linux"),
        ..FakeSession::default()
    };
    let sessions = FakeSessionFactory::new(session);
    let mut record = record_for_host("10.0.0.5");
    record.agent = installed_with("123456789");
    let records = MemoryRecords::with_record("web-01", record);

    let status = check_status(&sessions, &records, &config(), "web-01").await.expect("runs");

    assert_eq!(status.identity, Some(identity("123456789")));
    // Only the install probe ran: no uname, no discovery probes.
    assert_eq!(sessions.session.executed().len(), 1);
    assert!(records.saved().is_empty(), "no change, no write");
}

#[tokio::test]
async fn inconclusive_discovery_never_downgrades_known_identity() {
    // Remote says installed, but the record's identity cannot be re-derived
    // (all discovery probes answer empty). The persisted identity must
    // survive untouched.
    let session = FakeSession {
        probe: Some(ProbeBehavior::Respond("INSTALLED\n")),
        uname: Some("Linux"),
        ..FakeSession::default()
    };
    let sessions = FakeSessionFactory::new(session);
    let mut record = record_for_host("10.0.0.5");
    record.agent = installed_with("777777777");
    let records = MemoryRecords::with_record("web-01", record);

    let status = check_status(&sessions, &records, &config(), "web-01").await.expect("runs");

    assert_eq!(status.identity, Some(identity("777777777")));
    assert!(records.saved().is_empty());
}

// ── reconcile ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_writes_only_on_change() {
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));
    let previous = installed_with("123456789");

    let observed = PersistedAgentState {
        installed: true,
        identity: Some(identity("123456789")),
        installed_at: None,
    };
    let current = reconcile(&records, "web-01", &previous, observed).await.expect("reconcile");

    assert_eq!(current, previous, "installed_at is preserved from the previous state");
    assert!(records.saved().is_empty());
}

#[tokio::test]
async fn reconcile_anti_flap_keeps_identity_on_inconclusive_probe() {
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));
    let previous = installed_with("123456789");

    let observed = PersistedAgentState {
        installed: true,
        identity: None, // inconclusive
        installed_at: None,
    };
    let current = reconcile(&records, "web-01", &previous, observed).await.expect("reconcile");

    assert_eq!(current.identity, Some(identity("123456789")));
    assert!(records.saved().is_empty(), "never writes identity=null over a known identity");
}

#[tokio::test]
async fn reconcile_explicit_uninstall_clears_everything() {
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));
    let previous = installed_with("123456789");

    let observed = PersistedAgentState::default();
    let current = reconcile(&records, "web-01", &previous, observed).await.expect("reconcile");

    assert!(!current.installed);
    assert!(current.identity.is_none());
    assert!(current.installed_at.is_none());
    assert_eq!(records.saved().len(), 1);
}

#[tokio::test]
async fn reconcile_stamps_installed_at_on_new_install() {
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));
    let previous = PersistedAgentState::default();

    let observed = PersistedAgentState {
        installed: true,
        identity: Some(identity("123456789")),
        installed_at: None,
    };
    let current = reconcile(&records, "web-01", &previous, observed).await.expect("reconcile");

    assert!(current.installed_at.is_some());
    assert_eq!(records.saved().len(), 1);
}

// ── set_identity_manually ─────────────────────────────────────────────────────

#[tokio::test]
async fn manual_identity_is_validated_and_persisted() {
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    let identity = set_identity_manually(&records, "web-01", "123456789")
        .await
        .expect("valid identity");

    assert_eq!(identity.as_str(), "123456789");
    let saved = records.saved();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].1.installed);
    assert_eq!(saved[0].1.identity.as_ref().map(AgentIdentity::as_str), Some("123456789"));
}

#[tokio::test]
async fn malformed_manual_identity_is_rejected() {
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    assert!(set_identity_manually(&records, "web-01", "12345").await.is_err());
    assert!(set_identity_manually(&records, "web-01", "abcdefghi").await.is_err());
    assert!(records.saved().is_empty());
}

#[tokio::test]
async fn manual_identity_requires_an_existing_record() {
    let records = MemoryRecords::default();
    assert!(set_identity_manually(&records, "ghost", "123456789").await.is_err());
}
