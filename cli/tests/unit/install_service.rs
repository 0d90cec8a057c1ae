//! Unit tests for the install orchestration pipeline.

#![allow(clippy::expect_used)]

use deskpilot_cli::application::services::install::install;
use deskpilot_cli::domain::config::EngineConfig;
use deskpilot_cli::domain::error::{ExecError, ProvisionError};
use deskpilot_cli::domain::outcome::InstallOutcome;
use deskpilot_common::{AgentIdentity, PersistedAgentState};

use crate::mocks::{
    CollectingSink, FakeSession, FakeSessionFactory, InstallBehavior, MemoryRecords,
    MemorySecrets, record_for_host,
};

fn config() -> EngineConfig {
    EngineConfig::default()
}

fn identity(id: &str) -> AgentIdentity {
    AgentIdentity::parse(id).expect("valid identity")
}

async fn run_install(
    session: FakeSession,
    records: &MemoryRecords,
    secret: Option<String>,
) -> (anyhow::Result<InstallOutcome>, FakeSessionFactory, CollectingSink) {
    let sessions = FakeSessionFactory::new(session);
    let secrets = MemorySecrets::default();
    let sink = CollectingSink::default();
    let result =
        install(&sessions, records, &secrets, &sink, &config(), "web-01", secret).await;
    (result, sessions, sink)
}

#[tokio::test]
async fn happy_path_linux_reports_identity_and_progress() {
    let session = FakeSession {
        uname: Some("Linux"),
        install: Some(InstallBehavior::Output(
            "PROGRESS:10:Starting ViewLink installation...\n\
             PROGRESS:50:Installing ViewLink package...\n\
             VIEWLINK_ID:123456789\n"
                .to_owned(),
        )),
        ..FakeSession::default()
    };
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    let (result, sessions, sink) = run_install(session, &records, None).await;

    let outcome = result.expect("install succeeds");
    assert_eq!(
        outcome,
        InstallOutcome::Success {
            identity: identity("123456789"),
            permissions_required: false,
        }
    );

    let events = sink.collected();
    assert!(events.len() >= 2, "progress events were relayed");
    assert_eq!(events[0].percent, 10);
    assert_eq!(events[1].percent, 50);

    let saved = records.saved();
    assert_eq!(saved.len(), 1, "exactly one persistence write");
    assert!(saved[0].1.installed);
    assert_eq!(saved[0].1.identity, Some(identity("123456789")));
    assert!(saved[0].1.installed_at.is_some());

    // Cleanup is attempted after classification.
    let commands = sessions.session.executed();
    assert!(commands.iter().any(|c| c.starts_with("rm -f ")));
}

#[tokio::test]
async fn permissions_sentinel_rides_along_with_success() {
    let session = FakeSession {
        uname: Some("Darwin"),
        install: Some(InstallBehavior::Output(
            "PERMISSIONS_REQUIRED\nVIEWLINK_ID:987654321\n".to_owned(),
        )),
        ..FakeSession::default()
    };
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    let (result, _, _) = run_install(session, &records, None).await;

    assert_eq!(
        result.expect("install succeeds"),
        InstallOutcome::Success {
            identity: identity("987654321"),
            permissions_required: true,
        },
        "permissions never demote success to manual entry"
    );
}

#[tokio::test]
async fn manual_sentinel_marks_installed_but_keeps_prior_identity() {
    let session = FakeSession {
        uname: Some("Linux"),
        install: Some(InstallBehavior::Output("MANUAL_ID_REQUIRED\n".to_owned())),
        ..FakeSession::default()
    };
    let mut record = record_for_host("10.0.0.5");
    record.agent = PersistedAgentState {
        installed: true,
        identity: None,
        installed_at: None,
    };
    // installed-without-identity records do not short-circuit
    let records = MemoryRecords::with_record("web-01", record);

    let (result, _, _) = run_install(session, &records, None).await;

    assert_eq!(result.expect("install runs"), InstallOutcome::ManualIdentityRequired);
    let saved = records.saved();
    assert_eq!(saved.len(), 1);
    assert!(saved[0].1.installed);
    assert!(saved[0].1.identity.is_none());
}

#[tokio::test]
async fn ran_but_inconclusive_output_is_manual_not_failure() {
    let session = FakeSession {
        uname: Some("Linux"),
        install: Some(InstallBehavior::Output(
            "ViewLink already installed, checking ID...\n".to_owned(),
        )),
        ..FakeSession::default()
    };
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    let (result, _, _) = run_install(session, &records, None).await;

    assert_eq!(result.expect("install runs"), InstallOutcome::ManualIdentityRequired);
}

#[tokio::test]
async fn silent_output_is_failure_and_writes_nothing() {
    let session = FakeSession {
        uname: Some("Linux"),
        install: Some(InstallBehavior::Output("wget: not found\n".to_owned())),
        ..FakeSession::default()
    };
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    let (result, _, _) = run_install(session, &records, None).await;

    assert!(matches!(result.expect("install runs"), InstallOutcome::Failure { .. }));
    assert!(records.saved().is_empty(), "a failed run learns nothing");
}

#[tokio::test]
async fn placeholder_host_is_rejected_before_any_remote_call() {
    let session = FakeSession::default();
    let records = MemoryRecords::with_record("web-01", record_for_host("localhost"));

    let (result, sessions, _) = run_install(session, &records, None).await;

    let err = result.expect_err("localhost is not a target");
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::InvalidTarget(_))
    ));
    assert!(sessions.session.executed().is_empty(), "no remote call was attempted");
    assert!(sessions.opened.lock().expect("opened lock").is_empty());
}

#[tokio::test]
async fn unknown_record_is_rejected() {
    let session = FakeSession::default();
    let records = MemoryRecords::default();

    let (result, _, _) = run_install(session, &records, None).await;

    let err = result.expect_err("missing record");
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn already_installed_record_short_circuits() {
    let session = FakeSession::default();
    let mut record = record_for_host("10.0.0.5");
    record.agent = PersistedAgentState {
        installed: true,
        identity: Some(identity("555555555")),
        installed_at: None,
    };
    let records = MemoryRecords::with_record("web-01", record);

    let (result, sessions, _) = run_install(session, &records, None).await;

    assert_eq!(
        result.expect("short-circuit"),
        InstallOutcome::Success {
            identity: identity("555555555"),
            permissions_required: false,
        }
    );
    assert!(sessions.session.executed().is_empty());
    assert!(records.saved().is_empty());
}

#[tokio::test]
async fn windows_subsystem_is_unsupported() {
    let session = FakeSession {
        uname: Some("MINGW64_NT-10.0"),
        ..FakeSession::default()
    };
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    let (result, sessions, _) = run_install(session, &records, None).await;

    let err = result.expect_err("unsupported platform");
    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::UnsupportedPlatform(_))
    ));
    assert!(
        sessions.session.uploads.lock().expect("uploads lock").is_empty(),
        "nothing was deployed"
    );
}

#[tokio::test]
async fn platform_probe_failure_defaults_to_linux_and_proceeds() {
    let session = FakeSession {
        uname: None, // probe fails at the connection level
        install: Some(InstallBehavior::Output("VIEWLINK_ID:123456789\n".to_owned())),
        ..FakeSession::default()
    };
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    let (result, sessions, _) = run_install(session, &records, None).await;

    assert!(matches!(result.expect("install runs"), InstallOutcome::Success { .. }));
    assert_eq!(
        sessions.session.uploads.lock().expect("uploads lock").len(),
        1,
        "the script was still deployed"
    );
}

#[tokio::test]
async fn execution_timeout_maps_to_failure_outcome() {
    let session = FakeSession {
        uname: Some("Linux"),
        install: Some(InstallBehavior::Timeout),
        ..FakeSession::default()
    };
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    let (result, sessions, _) = run_install(session, &records, None).await;

    let InstallOutcome::Failure { reason } = result.expect("timeout is not an error") else {
        panic!("expected failure outcome");
    };
    assert!(reason.contains("timed out"));
    assert!(records.saved().is_empty());
    // Cleanup still attempted.
    assert!(sessions.session.executed().iter().any(|c| c.starts_with("rm -f ")));
}

#[tokio::test]
async fn connection_loss_during_execution_is_an_error() {
    let session = FakeSession {
        uname: Some("Linux"),
        install: Some(InstallBehavior::Connection),
        ..FakeSession::default()
    };
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    let (result, _, _) = run_install(session, &records, None).await;

    let err = result.expect_err("no output at all is a hard error");
    assert!(matches!(err.downcast_ref::<ExecError>(), Some(ExecError::Connection(_))));
}

#[tokio::test]
async fn inline_secret_is_exported_shell_escaped() {
    let session = FakeSession {
        uname: Some("Linux"),
        install: Some(InstallBehavior::Output("VIEWLINK_ID:123456789\n".to_owned())),
        ..FakeSession::default()
    };
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));

    let (result, sessions, _) = run_install(session, &records, Some("it's secret".to_owned())).await;

    assert!(result.is_ok());
    let commands = sessions.session.executed();
    let run = commands
        .iter()
        .find(|c| c.contains("&& bash "))
        .expect("install command was issued");
    assert!(
        run.starts_with(r#"export VIEWLINK_PASSCODE='it'"'"'s secret' && bash "#),
        "secret is single-quote escaped, got: {run}"
    );
}

#[tokio::test]
async fn stored_secret_is_used_when_none_is_supplied() {
    let session = FakeSession {
        uname: Some("Linux"),
        install: Some(InstallBehavior::Output("VIEWLINK_ID:123456789\n".to_owned())),
        ..FakeSession::default()
    };
    let sessions = FakeSessionFactory::new(session);
    let records = MemoryRecords::with_record("web-01", record_for_host("10.0.0.5"));
    let secrets = MemorySecrets::with_secret("web-01", "stored-pass");
    let sink = CollectingSink::default();

    let result =
        install(&sessions, &records, &secrets, &sink, &config(), "web-01", None).await;

    assert!(result.is_ok());
    let commands = sessions.session.executed();
    assert!(
        commands.iter().any(|c| c.contains("VIEWLINK_PASSCODE='stored-pass'")),
        "stored secret reached the run command"
    );
}
