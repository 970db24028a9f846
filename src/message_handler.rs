//! Background message dispatch.
//!
//! One table, one handler per discriminator. Every handler answers with a
//! JSON response; failures are reported in-band, never as a dropped channel.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::app::App;
use crate::messenger::MessageChannel;
use crate::types::errors::ChannelError;
use crate::types::message::{ActionMessage, AckResponse, ExtensionMessage, PingResponse, TypedMessage};

/// Parses and dispatches a raw message.
pub async fn handle_message(app: &App, message: &Value) -> Value {
    match serde_json::from_value::<ExtensionMessage>(message.clone()) {
        Ok(parsed) => dispatch(app, parsed).await,
        Err(e) => {
            warn!(error = %e, "unrecognized message");
            to_value(AckResponse::failed(format!("unknown message: {}", e)))
        }
    }
}

/// Dispatches a parsed message to its handler.
pub async fn dispatch(app: &App, message: ExtensionMessage) -> Value {
    debug!(kind = message.kind(), "background received message");
    match message {
        ExtensionMessage::Action(ActionMessage::CheckLoginStatus) => {
            to_value(app.check_login_status().await)
        }
        ExtensionMessage::Action(ActionMessage::Ping) => to_value(PingResponse::ok()),
        ExtensionMessage::Action(ActionMessage::Autofill { credentials }) => {
            to_value(app.autofill(&credentials).await)
        }
        ExtensionMessage::Typed(TypedMessage::SaveCredentials { data }) => {
            to_value(app.save_credentials(&data).await)
        }
    }
}

fn to_value<T: serde::Serialize>(response: T) -> Value {
    serde_json::to_value(response)
        .unwrap_or_else(|e| json!({ "success": false, "error": e.to_string() }))
}

/// Channel that calls the background directly within one process.
///
/// Unloading it models the privileged context being reloaded underneath a
/// live page: sends fail with `ContextInvalidated` until `reload`.
pub struct InProcessChannel {
    app: RwLock<Option<Arc<App>>>,
}

impl InProcessChannel {
    pub fn new(app: Arc<App>) -> Self {
        Self {
            app: RwLock::new(Some(app)),
        }
    }

    pub fn unload(&self) {
        let mut app = self.app.write().unwrap_or_else(|e| e.into_inner());
        *app = None;
        info!("background context unloaded");
    }

    pub fn reload(&self, new_app: Arc<App>) {
        let mut app = self.app.write().unwrap_or_else(|e| e.into_inner());
        *app = Some(new_app);
        info!("background context reloaded");
    }

    fn current(&self) -> Option<Arc<App>> {
        self.app.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl MessageChannel for InProcessChannel {
    async fn send(&self, message: Value) -> Result<Value, ChannelError> {
        let app = self.current().ok_or(ChannelError::ContextInvalidated)?;
        Ok(handle_message(&app, &message).await)
    }
}
