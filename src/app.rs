//! Background context for Vaultfill.
//!
//! The privileged side of the extension: it owns the credential service
//! client, the mirrored auth token and the route to browser tabs. Page
//! contexts reach it only through messages.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::services::credential_service::{CredentialService, HttpCredentialService};
use crate::services::token_store::TokenStore;
use crate::types::credential::{CredentialRecord, SaveRequest};
use crate::types::errors::{ChannelError, ServiceError};
use crate::types::message::{AckResponse, ExtensionMessage, LoginStatusResponse};
use crate::types::settings::{AutofillPolicy, ExtensionSettings};

/// Route from the background to browser tabs.
#[async_trait]
pub trait TabBridge: Send + Sync {
    /// Fills the active tab's username/password fields with `credentials`.
    async fn fill_active_tab(&self, credentials: &CredentialRecord) -> Result<(), ChannelError>;
    /// Delivers `message` to the tab showing `tab_url`.
    async fn send_to_tab(&self, tab_url: &str, message: ExtensionMessage) -> Result<(), ChannelError>;
}

/// Central background struct holding the service client and tab route.
pub struct App {
    pub settings: ExtensionSettings,
    pub service: Arc<dyn CredentialService>,
    pub tokens: Arc<TokenStore>,
    tabs: Arc<dyn TabBridge>,
}

impl App {
    pub fn new(
        settings: ExtensionSettings,
        service: Arc<dyn CredentialService>,
        tokens: Arc<TokenStore>,
        tabs: Arc<dyn TabBridge>,
    ) -> Self {
        Self {
            settings,
            service,
            tokens,
            tabs,
        }
    }

    /// Builds the background with an HTTP client for `settings.service`.
    pub fn from_settings(
        settings: ExtensionSettings,
        tokens: Arc<TokenStore>,
        tabs: Arc<dyn TabBridge>,
    ) -> Result<Self, ServiceError> {
        let service = HttpCredentialService::new(&settings.service, tokens.clone())?;
        info!(server = %service.base_url(), "background context ready");
        Ok(Self::new(settings, Arc::new(service), tokens, tabs))
    }

    /// Session status; an unreachable service or non-2xx reads as logged out.
    pub async fn check_login_status(&self) -> LoginStatusResponse {
        match self.service.current_user().await {
            Ok(status) => LoginStatusResponse::from_status(status),
            Err(e) => {
                warn!(error = %e, "checking login status failed");
                LoginStatusResponse::failed(&e.to_string())
            }
        }
    }

    pub async fn save_credentials(&self, request: &SaveRequest) -> AckResponse {
        match self.service.save_credentials(request).await {
            Ok(message) => {
                info!(origin = %request.website_url, message = %message, "credentials saved");
                AckResponse::ok()
            }
            Err(e) => {
                error!(origin = %request.website_url, error = %e, "saving credentials failed");
                AckResponse::failed(e.to_string())
            }
        }
    }

    pub async fn autofill(&self, credentials: &CredentialRecord) -> AckResponse {
        match self.tabs.fill_active_tab(credentials).await {
            Ok(()) => AckResponse::ok(),
            Err(e) => {
                error!(error = %e, "autofill failed");
                AckResponse::failed(e.to_string())
            }
        }
    }

    /// Called when a tab finishes loading.
    ///
    /// Under the automatic policy, fetches credentials for the tab's hostname
    /// and pushes the first one to the tab. Returns whether a push happened.
    pub async fn on_tab_complete(&self, tab_url: &str) -> Result<bool, ServiceError> {
        if !matches!(self.settings.autofill.policy, AutofillPolicy::Automatic { .. }) {
            return Ok(false);
        }
        let url = Url::parse(tab_url)
            .map_err(|e| ServiceError::InvalidRequest(format!("invalid tab url: {}", e)))?;
        let Some(host) = url.host_str() else {
            return Ok(false);
        };

        let records = self.service.fetch_credentials(host).await?;
        let Some(first) = records.first() else {
            debug!(host, "no stored credentials for tab");
            return Ok(false);
        };

        match self
            .tabs
            .send_to_tab(tab_url, ExtensionMessage::autofill(first.clone()))
            .await
        {
            Ok(()) => Ok(true),
            Err(e) => {
                warn!(host, error = %e, "could not deliver autofill to tab");
                Ok(false)
            }
        }
    }
}
