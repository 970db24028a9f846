//! Cross-context message schema.
//!
//! Two discriminators are in use on the wire: `action` for session/liveness
//! and autofill requests, `type` for saves. [`ExtensionMessage`] accepts both.

use serde::{Deserialize, Serialize};

use super::credential::{CredentialRecord, SaveRequest, SessionStatus};

/// Messages discriminated by the `action` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ActionMessage {
    #[serde(rename = "checkLoginStatus")]
    CheckLoginStatus,
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "autofill")]
    Autofill { credentials: CredentialRecord },
}

/// Messages discriminated by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TypedMessage {
    #[serde(rename = "SAVE_CREDENTIALS")]
    SaveCredentials { data: SaveRequest },
}

/// Any message accepted by the background dispatch table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionMessage {
    Action(ActionMessage),
    Typed(TypedMessage),
}

impl ExtensionMessage {
    pub fn check_login_status() -> Self {
        ExtensionMessage::Action(ActionMessage::CheckLoginStatus)
    }

    pub fn ping() -> Self {
        ExtensionMessage::Action(ActionMessage::Ping)
    }

    pub fn autofill(credentials: CredentialRecord) -> Self {
        ExtensionMessage::Action(ActionMessage::Autofill { credentials })
    }

    pub fn save_credentials(data: SaveRequest) -> Self {
        ExtensionMessage::Typed(TypedMessage::SaveCredentials { data })
    }

    /// Discriminator value, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtensionMessage::Action(ActionMessage::CheckLoginStatus) => "checkLoginStatus",
            ExtensionMessage::Action(ActionMessage::Ping) => "ping",
            ExtensionMessage::Action(ActionMessage::Autofill { .. }) => "autofill",
            ExtensionMessage::Typed(TypedMessage::SaveCredentials { .. }) => "SAVE_CREDENTIALS",
        }
    }
}

/// Response to `checkLoginStatus`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginStatusResponse {
    pub logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LoginStatusResponse {
    pub fn from_status(status: SessionStatus) -> Self {
        Self {
            logged_in: status.logged_in,
            email: status.email,
            error: None,
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            logged_in: false,
            email: None,
            error: Some(error.to_string()),
        }
    }

    pub fn into_status(self) -> SessionStatus {
        SessionStatus {
            logged_in: self.logged_in,
            email: self.email,
        }
    }
}

/// Response to `ping`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
}

impl PingResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Boolean success indicator returned by `SAVE_CREDENTIALS` and `autofill`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AckResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AckResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}
