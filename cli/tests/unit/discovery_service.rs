//! Unit tests for cascading identity discovery.

#![allow(clippy::expect_used)]

use deskpilot_cli::application::services::discovery::{extract_identity, methods_for};
use deskpilot_cli::domain::config::EngineConfig;
use deskpilot_cli::domain::error::ExecError;
use deskpilot_cli::domain::platform::PlatformKind;

use crate::mocks::FakeSession;

fn config() -> EngineConfig {
    EngineConfig::default()
}

#[tokio::test]
async fn first_matching_method_wins() {
    let session = FakeSession::default();
    session.queue_response(Ok("123456789".to_owned()));

    let identity = extract_identity(&session, PlatformKind::Linux, &config()).await;

    assert_eq!(identity.expect("found").as_str(), "123456789");
    assert_eq!(session.executed().len(), 1, "no later probe runs after a match");
}

#[tokio::test]
async fn priority_order_is_deterministic() {
    // Method 1 yields garbage, method 2 a valid identity, method 3 a
    // different valid identity. The second method's answer must win.
    let session = FakeSession::default();
    session.queue_response(Ok("not-an-id\n".to_owned()));
    session.queue_response(Ok("987654321\n".to_owned()));
    session.queue_response(Ok("111111111\n".to_owned()));

    let identity = extract_identity(&session, PlatformKind::Linux, &config()).await;

    assert_eq!(identity.expect("found").as_str(), "987654321");
    assert_eq!(session.executed().len(), 2);
}

#[tokio::test]
async fn probe_failures_are_swallowed_and_iteration_continues() {
    let session = FakeSession::default();
    session.queue_response(Err(ExecError::Timeout(10)));
    session.queue_response(Err(ExecError::Connection("broken pipe".to_owned())));
    session.queue_response(Ok("222222222".to_owned()));

    let identity = extract_identity(&session, PlatformKind::Darwin, &config()).await;

    assert_eq!(identity.expect("found").as_str(), "222222222");
}

#[tokio::test]
async fn exhausting_all_methods_is_none_not_an_error() {
    let session = FakeSession::default(); // every probe answers empty

    let identity = extract_identity(&session, PlatformKind::Linux, &config()).await;

    assert!(identity.is_none());
    assert_eq!(
        session.executed().len(),
        methods_for(PlatformKind::Linux).len(),
        "every method was tried once"
    );
}

#[tokio::test]
async fn near_miss_outputs_are_rejected() {
    let session = FakeSession::default();
    session.queue_response(Ok("12345678".to_owned())); // eight digits
    session.queue_response(Ok("1234567890".to_owned())); // ten digits
    session.queue_response(Ok("id: 123456789".to_owned())); // embedded, not exact

    let identity = extract_identity(&session, PlatformKind::Linux, &config()).await;

    assert!(identity.is_none());
}

#[tokio::test]
async fn probe_commands_differ_per_platform() {
    let linux: Vec<String> =
        methods_for(PlatformKind::Linux).into_iter().map(|m| m.command).collect();
    let darwin: Vec<String> =
        methods_for(PlatformKind::Darwin).into_iter().map(|m| m.command).collect();

    assert!(linux.iter().any(|c| c.contains("journalctl")));
    assert!(darwin.iter().any(|c| c.contains("defaults read")));
    assert!(darwin.iter().any(|c| c.contains("/Applications/ViewLink.app")));
}
