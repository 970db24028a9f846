use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level extension settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ExtensionSettings {
    pub service: ServiceSettings,
    pub autofill: AutofillSettings,
    pub save: SaveSettings,
    pub messenger: MessengerSettings,
}

/// Remote credential service connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSettings {
    pub server_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl ServiceSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Autofill timing and policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutofillSettings {
    pub policy: AutofillPolicy,
    pub cache_duration_ms: u64,
    pub max_fetch_attempts: u32,
    pub retry_delay_ms: u64,
    pub debounce_ms: u64,
    pub settle_delay_ms: u64,
    pub picker_dismiss_delay_ms: u64,
}

impl Default for AutofillSettings {
    fn default() -> Self {
        Self {
            policy: AutofillPolicy::ClickThrough,
            cache_duration_ms: 30_000,
            max_fetch_attempts: 3,
            retry_delay_ms: 2_000,
            debounce_ms: 2_000,
            settle_delay_ms: 1_000,
            picker_dismiss_delay_ms: 100,
        }
    }
}

impl AutofillSettings {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn picker_dismiss_delay(&self) -> Duration {
        Duration::from_millis(self.picker_dismiss_delay_ms)
    }
}

/// Whether stored credentials are filled on user click-through or automatically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AutofillPolicy {
    /// Show the picker when the user clicks or focuses a password field.
    ClickThrough,
    /// Fill the first stored credential after a fixed delay.
    Automatic { delay_ms: u64 },
}

/// Save-prompt settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SaveSettings {
    pub trigger: SaveTrigger,
}

/// Which page event offers to save typed credentials.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SaveTrigger {
    #[default]
    Submit,
    PasswordInput,
}

/// Cross-context messenger settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessengerSettings {
    pub liveness_interval_ms: u64,
}

impl Default for MessengerSettings {
    fn default() -> Self {
        Self {
            liveness_interval_ms: 5_000,
        }
    }
}

impl MessengerSettings {
    pub fn liveness_interval(&self) -> Duration {
        Duration::from_millis(self.liveness_interval_ms)
    }
}
