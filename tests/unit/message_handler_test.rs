//! Tests for the background dispatch table and tab-complete autofill.

#[path = "../support/mod.rs"]
mod support;

use serde_json::json;
use vaultfill::message_handler::handle_message;
use vaultfill::messenger::MessageChannel;
use vaultfill::types::errors::ChannelError;
use vaultfill::types::message::{ActionMessage, ExtensionMessage};
use vaultfill::types::settings::{AutofillPolicy, ExtensionSettings};

use support::{harness, record, MockService, PAGE_URL};

fn automatic() -> ExtensionSettings {
    let mut settings = ExtensionSettings::default();
    settings.autofill.policy = AutofillPolicy::Automatic { delay_ms: 0 };
    settings
}

// ─── Dispatch ───

#[tokio::test]
async fn check_login_status_reports_session() {
    let h = harness(MockService::logged_in(vec![]), ExtensionSettings::default());

    let response = handle_message(&h.app, &json!({"action": "checkLoginStatus"})).await;

    assert_eq!(response, json!({"logged_in": true, "email": "a@b.com"}));
}

#[tokio::test]
async fn unreachable_session_reads_as_logged_out() {
    let h = harness(MockService::session_down(), ExtensionSettings::default());

    let response = handle_message(&h.app, &json!({"action": "checkLoginStatus"})).await;

    assert_eq!(response["logged_in"], json!(false));
    assert!(response["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn ping_answers_ok() {
    let h = harness(MockService::logged_in(vec![]), ExtensionSettings::default());

    let response = handle_message(&h.app, &json!({"action": "ping"})).await;

    assert_eq!(response, json!({"status": "ok"}));
}

#[tokio::test]
async fn save_credentials_calls_service() {
    let h = harness(MockService::logged_in(vec![]), ExtensionSettings::default());
    let message = json!({
        "type": "SAVE_CREDENTIALS",
        "data": {"websiteUrl": "example.com", "username": "a@b.com", "password": "p1"}
    });

    let response = handle_message(&h.app, &message).await;

    assert_eq!(response, json!({"success": true}));
    let saves = h.service.saves.lock().unwrap();
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].website_url, "example.com");
    assert_eq!(saves[0].username, "a@b.com");
}

#[tokio::test]
async fn save_failure_is_reported_in_band() {
    let h = harness(
        MockService::logged_in(vec![]).with_save_failure("database locked"),
        ExtensionSettings::default(),
    );
    let message = json!({
        "type": "SAVE_CREDENTIALS",
        "data": {"websiteUrl": "example.com", "username": "a", "password": "b"}
    });

    let response = handle_message(&h.app, &message).await;

    assert_eq!(response["success"], json!(false));
    assert!(response["error"].as_str().unwrap().contains("database locked"));
}

#[tokio::test]
async fn autofill_fills_active_tab() {
    let h = harness(MockService::logged_in(vec![]), ExtensionSettings::default());
    let message = json!({
        "action": "autofill",
        "credentials": {"username": "a@b.com", "password": "p1"}
    });

    let response = handle_message(&h.app, &message).await;

    assert_eq!(response, json!({"success": true}));
    let fills = h.tabs.fills.lock().unwrap();
    assert_eq!(fills.len(), 1);
    assert_eq!(fills[0].display_identifier(), Some("a@b.com"));
}

#[tokio::test]
async fn unknown_message_fails_without_panicking() {
    let h = harness(MockService::logged_in(vec![]), ExtensionSettings::default());

    let response = handle_message(&h.app, &json!({"action": "deleteEverything"})).await;

    assert_eq!(response["success"], json!(false));
}

// ─── In-process channel ───

#[tokio::test]
async fn unloaded_channel_reports_invalidated_context() {
    let h = harness(MockService::logged_in(vec![]), ExtensionSettings::default());

    h.channel.unload();
    let err = h.channel.send(json!({"action": "ping"})).await.unwrap_err();
    assert!(matches!(err, ChannelError::ContextInvalidated));

    h.channel.reload(h.app.clone());
    let response = h.channel.send(json!({"action": "ping"})).await.unwrap();
    assert_eq!(response, json!({"status": "ok"}));
}

// ─── Tab complete ───

#[tokio::test]
async fn tab_complete_is_inert_under_click_through() {
    let h = harness(
        MockService::logged_in(vec![record("a@b.com", "p1")]),
        ExtensionSettings::default(),
    );

    let pushed = h.app.on_tab_complete(PAGE_URL).await.unwrap();

    assert!(!pushed);
    assert_eq!(h.service.fetch_count(), 0);
    assert!(h.tabs.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn tab_complete_pushes_first_credential() {
    let h = harness(
        MockService::logged_in(vec![record("a@b.com", "p1"), record("c@d.com", "p2")]),
        automatic(),
    );

    let pushed = h.app.on_tab_complete(PAGE_URL).await.unwrap();

    assert!(pushed);
    let sent = h.tabs.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, PAGE_URL);
    match &sent[0].1 {
        ExtensionMessage::Action(ActionMessage::Autofill { credentials }) => {
            assert_eq!(credentials.display_identifier(), Some("a@b.com"));
        }
        other => panic!("expected autofill, got {:?}", other),
    }
}

#[tokio::test]
async fn tab_complete_without_credentials_pushes_nothing() {
    let h = harness(MockService::logged_in(vec![]), automatic());

    let pushed = h.app.on_tab_complete(PAGE_URL).await.unwrap();

    assert!(!pushed);
    assert_eq!(h.service.fetch_count(), 1);
    assert!(h.tabs.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn tab_complete_rejects_bad_url() {
    let h = harness(MockService::logged_in(vec![]), automatic());

    assert!(h.app.on_tab_complete("not a url").await.is_err());
}
