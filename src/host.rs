//! Vaultfill host: the background context over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "message":{"action":"checkLoginStatus"}}
//! Response: {"id":1, "response":{"logged_in":true,"email":"..."}}
//! Request:  {"id":2, "tabComplete":"https://example.com/login"}
//! Response: {"id":2, "response":{"success":true}}
//! Pushes:   {"event":"autofill","tab":"...","credentials":{...}}
//!
//! Logs go to stderr; stdout carries only protocol lines.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vaultfill::app::{App, TabBridge};
use vaultfill::message_handler::handle_message;
use vaultfill::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use vaultfill::services::token_store::TokenStore;
use vaultfill::types::credential::CredentialRecord;
use vaultfill::types::errors::ChannelError;
use vaultfill::types::message::{ActionMessage, ExtensionMessage};

/// Tab route that writes push events to the embedding shell.
struct StdoutTabBridge {
    out: mpsc::UnboundedSender<Value>,
}

impl StdoutTabBridge {
    fn push(&self, line: Value) -> Result<(), ChannelError> {
        self.out
            .send(line)
            .map_err(|_| ChannelError::Disconnected("stdout closed".to_string()))
    }
}

#[async_trait]
impl TabBridge for StdoutTabBridge {
    async fn fill_active_tab(&self, credentials: &CredentialRecord) -> Result<(), ChannelError> {
        self.push(json!({ "event": "autofill", "credentials": credentials }))
    }

    async fn send_to_tab(&self, tab_url: &str, message: ExtensionMessage) -> Result<(), ChannelError> {
        match message {
            ExtensionMessage::Action(ActionMessage::Autofill { credentials }) => self.push(json!({
                "event": "autofill",
                "tab": tab_url,
                "credentials": credentials,
            })),
            other => self.push(json!({ "event": "message", "tab": tab_url, "message": other })),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vaultfill=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn handle_line(app: &App, line: &str) -> Value {
    let request: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => return json!({ "id": null, "error": format!("parse error: {}", e) }),
    };
    let id = request.get("id").cloned().unwrap_or(Value::Null);

    if let Some(message) = request.get("message") {
        let response = handle_message(app, message).await;
        return json!({ "id": id, "response": response });
    }

    if let Some(url) = request.get("tabComplete").and_then(Value::as_str) {
        let success = match app.on_tab_complete(url).await {
            Ok(pushed) => pushed,
            Err(e) => {
                warn!(url, error = %e, "tab-complete autofill failed");
                false
            }
        };
        return json!({ "id": id, "response": { "success": success } });
    }

    json!({ "id": id, "error": "request needs \"message\" or \"tabComplete\"" })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut engine = SettingsEngine::new(std::env::var("VAULTFILL_SETTINGS").ok());
    let settings = match engine.load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, "falling back to default settings");
            Default::default()
        }
    };

    let tokens = match TokenStore::open_default() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "local storage unavailable, using in-memory store");
            Arc::new(TokenStore::in_memory())
        }
    };

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Value>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = out_rx.recv().await {
            let mut bytes = line.to_string().into_bytes();
            bytes.push(b'\n');
            if stdout.write_all(&bytes).await.is_err() || stdout.flush().await.is_err() {
                break;
            }
        }
    });

    let tabs = Arc::new(StdoutTabBridge { out: out_tx.clone() });
    let app = App::from_settings(settings, tokens, tabs)?;

    out_tx.send(json!({ "event": "ready", "version": env!("CARGO_PKG_VERSION") }))?;
    info!("host ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&app, &line).await;
        if out_tx.send(response).is_err() {
            break;
        }
    }

    drop(app);
    drop(out_tx);
    let _ = writer.await;
    info!("host stopped");
    Ok(())
}
