//! Remote Credential Service client.
//!
//! The service stores credentials keyed by owning user and site origin. It is
//! an opaque collaborator: this module only speaks its HTTP API.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::services::token_store::TokenStore;
use crate::types::credential::{CredentialRecord, RegistrationRequest, SaveRequest, SessionStatus};
use crate::types::errors::ServiceError;
use crate::types::settings::ServiceSettings;

/// Operations offered by the remote credential service.
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// `GET /get_current_user`.
    async fn current_user(&self) -> Result<SessionStatus, ServiceError>;
    /// `POST /save_credentials`; returns the server's message.
    async fn save_credentials(&self, request: &SaveRequest) -> Result<String, ServiceError>;
    /// `POST /get_credentials` for one origin.
    async fn fetch_credentials(&self, origin: &str) -> Result<Vec<CredentialRecord>, ServiceError>;
    /// `GET /get_credentials` with the stored bearer token.
    async fn list_credentials(&self) -> Result<Vec<CredentialRecord>, ServiceError>;
    /// `POST /login`; stores and returns the issued token.
    async fn login(&self, username: &str, password: &str) -> Result<String, ServiceError>;
    /// `POST /register`.
    async fn register(&self, request: &RegistrationRequest) -> Result<(), ServiceError>;
    /// `GET /logout`; the stored token is cleared even if the call fails.
    async fn logout(&self) -> Result<(), ServiceError>;
}

#[derive(Debug, Default, Deserialize)]
struct CurrentUserBody {
    #[serde(default)]
    logged_in: bool,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CredentialsBody {
    #[serde(default)]
    credentials: Option<Vec<CredentialRecord>>,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(default)]
    token: Option<String>,
}

/// HTTP client for the credential service.
///
/// Session cookies are kept in the client's cookie store, matching a browser
/// `fetch` with `credentials: "include"`.
pub struct HttpCredentialService {
    client: Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    token_rx: watch::Receiver<Option<String>>,
}

impl HttpCredentialService {
    pub fn new(settings: &ServiceSettings, tokens: Arc<TokenStore>) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(settings.request_timeout())
            .user_agent(concat!("vaultfill/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Network(format!("Failed to create HTTP client: {}", e)))?;
        let token_rx = tokens.subscribe();
        Ok(Self {
            client,
            base_url: settings.server_url.trim_end_matches('/').to_string(),
            tokens,
            token_rx,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn current_token(&self) -> Option<String> {
        self.token_rx.borrow().clone()
    }

    /// Maps a non-2xx response to `ServiceError::Status`, preferring the
    /// server's `message` over the status reason.
    async fn status_error(response: Response) -> ServiceError {
        let status = response.status();
        let body: MessageBody = response.json().await.unwrap_or_default();
        let message = body.message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        ServiceError::Status {
            status: status.as_u16(),
            message,
        }
    }

    async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(Self::status_error(response).await)
        }
    }
}

#[async_trait]
impl CredentialService for HttpCredentialService {
    async fn current_user(&self) -> Result<SessionStatus, ServiceError> {
        let response = self
            .client
            .get(self.endpoint("/get_current_user"))
            .header("Accept", "application/json")
            .send()
            .await?;
        let body: CurrentUserBody = Self::ensure_success(response).await?.json().await?;
        debug!(logged_in = body.logged_in, "session status");
        Ok(SessionStatus {
            logged_in: body.logged_in,
            email: body.email,
        })
    }

    async fn save_credentials(&self, request: &SaveRequest) -> Result<String, ServiceError> {
        if !request.is_complete() {
            return Err(ServiceError::InvalidRequest(
                "websiteUrl, username and password are required".to_string(),
            ));
        }
        info!(origin = %request.website_url, "saving credentials");
        let response = self
            .client
            .post(self.endpoint("/save_credentials"))
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        let body: MessageBody = response.json().await.unwrap_or_default();
        Ok(body
            .message
            .unwrap_or_else(|| "Credentials saved successfully".to_string()))
    }

    async fn fetch_credentials(&self, origin: &str) -> Result<Vec<CredentialRecord>, ServiceError> {
        debug!(origin, "fetching credentials");
        let response = self
            .client
            .post(self.endpoint("/get_credentials"))
            .header("Accept", "application/json")
            .json(&json!({ "websiteUrl": origin }))
            .send()
            .await?;
        let body: CredentialsBody = Self::ensure_success(response).await?.json().await?;
        Ok(body.credentials.unwrap_or_default())
    }

    async fn list_credentials(&self) -> Result<Vec<CredentialRecord>, ServiceError> {
        let token = self.current_token().ok_or(ServiceError::MissingToken)?;
        let response = self
            .client
            .get(self.endpoint("/get_credentials"))
            .bearer_auth(token)
            .send()
            .await?;
        let records: Vec<CredentialRecord> = Self::ensure_success(response).await?.json().await?;
        Ok(records)
    }

    async fn login(&self, username: &str, password: &str) -> Result<String, ServiceError> {
        if username.is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "Missing username or password".to_string(),
            ));
        }
        let response = self
            .client
            .post(self.endpoint("/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        let body: LoginBody = Self::ensure_success(response).await?.json().await?;
        let token = body
            .token
            .ok_or_else(|| ServiceError::Decode("login response has no token".to_string()))?;
        self.tokens.set_auth_token(&token)?;
        info!("logged in");
        Ok(token)
    }

    async fn register(&self, request: &RegistrationRequest) -> Result<(), ServiceError> {
        if !request.is_complete() {
            return Err(ServiceError::InvalidRequest("All fields are required".to_string()));
        }
        let response = self
            .client
            .post(self.endpoint("/register"))
            .json(request)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        info!(username = %request.username, "registered");
        Ok(())
    }

    async fn logout(&self) -> Result<(), ServiceError> {
        if let Err(e) = self.tokens.clear_auth_token() {
            warn!(error = %e, "failed to clear stored auth token");
        }
        let response = self.client.get(self.endpoint("/logout")).send().await?;
        Self::ensure_success(response).await?;
        info!("logged out");
        Ok(())
    }
}
