//! Cross-Context Messenger, page side.
//!
//! Every request goes through one [`MessageChannel`]. When the privileged
//! context reports itself invalidated, a validity flag is cleared and every
//! later request short-circuits locally without a send, until a liveness
//! `ping` gets through again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::types::credential::{CredentialRecord, SaveRequest, SessionStatus};
use crate::types::errors::ChannelError;
use crate::types::message::{AckResponse, ExtensionMessage, LoginStatusResponse, PingResponse};

/// Request/response transport between the page and the privileged context.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, message: Value) -> Result<Value, ChannelError>;
}

pub struct ContentMessenger {
    channel: Arc<dyn MessageChannel>,
    valid: AtomicBool,
}

impl ContentMessenger {
    pub fn new(channel: Arc<dyn MessageChannel>) -> Self {
        Self {
            channel,
            valid: AtomicBool::new(true),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    pub fn invalidate(&self) {
        if self.valid.swap(false, Ordering::SeqCst) {
            warn!("extension context invalidated, messaging suspended until ping succeeds");
        }
    }

    async fn request<R: DeserializeOwned>(&self, message: &ExtensionMessage) -> Result<R, ChannelError> {
        let payload = serde_json::to_value(message)
            .map_err(|e| ChannelError::MalformedResponse(e.to_string()))?;
        let response = match self.channel.send(payload).await {
            Ok(response) => response,
            Err(ChannelError::ContextInvalidated) => {
                self.invalidate();
                return Err(ChannelError::ContextInvalidated);
            }
            Err(e) => return Err(e),
        };
        serde_json::from_value(response).map_err(|e| ChannelError::MalformedResponse(e.to_string()))
    }

    fn guard(&self, kind: &str) -> Result<(), ChannelError> {
        if self.is_valid() {
            Ok(())
        } else {
            debug!(kind, "extension context invalid, skipping send");
            Err(ChannelError::ContextInvalidated)
        }
    }

    /// Asks the background for the session status.
    ///
    /// Every failure reads as "not logged in".
    pub async fn check_login_status(&self) -> SessionStatus {
        if self.guard("checkLoginStatus").is_err() {
            return SessionStatus::logged_out();
        }
        match self
            .request::<LoginStatusResponse>(&ExtensionMessage::check_login_status())
            .await
        {
            Ok(response) => {
                if let Some(error) = &response.error {
                    warn!(error = %error, "background could not check login status");
                }
                debug!(logged_in = response.logged_in, "login status");
                response.into_status()
            }
            Err(e) => {
                warn!(error = %e, "login status check failed");
                SessionStatus::logged_out()
            }
        }
    }

    pub async fn save_credentials(&self, request: SaveRequest) -> Result<(), ChannelError> {
        self.guard("SAVE_CREDENTIALS")?;
        let ack: AckResponse = self
            .request(&ExtensionMessage::save_credentials(request))
            .await?;
        Self::ack_result(ack)
    }

    pub async fn request_autofill(&self, credentials: CredentialRecord) -> Result<(), ChannelError> {
        self.guard("autofill")?;
        let ack: AckResponse = self.request(&ExtensionMessage::autofill(credentials)).await?;
        Self::ack_result(ack)
    }

    /// Liveness probe. Bypasses the validity flag and restores it on success.
    pub async fn ping(&self) -> bool {
        match self.request::<PingResponse>(&ExtensionMessage::ping()).await {
            Ok(response) if response.status == "ok" => {
                if !self.valid.swap(true, Ordering::SeqCst) {
                    info!("extension context restored");
                }
                true
            }
            Ok(response) => {
                warn!(status = %response.status, "unexpected ping status");
                false
            }
            Err(e) => {
                debug!(error = %e, "ping failed");
                false
            }
        }
    }

    fn ack_result(ack: AckResponse) -> Result<(), ChannelError> {
        if ack.success {
            Ok(())
        } else {
            Err(ChannelError::Failed(
                ack.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}
