use thiserror::Error;

// === ServiceError ===

/// Errors raised while talking to the remote credential service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The service could not be reached or the request failed in transit.
    #[error("Service network error: {0}")]
    Network(String),
    /// The service answered with a non-2xx status.
    #[error("Service returned {status}: {message}")]
    Status { status: u16, message: String },
    /// The response body could not be decoded.
    #[error("Service response decode error: {0}")]
    Decode(String),
    /// A bearer-token request was attempted without a stored token.
    #[error("Not authenticated: no auth token stored")]
    MissingToken,
    /// The request was rejected locally before being sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    /// The issued token could not be written to local storage.
    #[error("Token storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ServiceError {
    /// False for requests rejected locally, which would fail the same way again.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            ServiceError::MissingToken | ServiceError::InvalidRequest(_) | ServiceError::Storage(_)
        )
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else {
            ServiceError::Network(err.to_string())
        }
    }
}

// === ChannelError ===

/// Errors crossing the page/background boundary.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The privileged context was reloaded while the page script stayed alive.
    #[error("Extension context invalidated")]
    ContextInvalidated,
    /// The channel has no receiver.
    #[error("Message channel disconnected: {0}")]
    Disconnected(String),
    /// The other side answered with something that is not the expected response.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// The other side answered with an explicit failure.
    #[error("Request failed: {0}")]
    Failed(String),
}

// === PageError ===

/// Errors related to the in-page document model.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    /// No element exists with the given node id.
    #[error("Unknown node: {0}")]
    UnknownNode(usize),
    /// The node exists but is not an input element.
    #[error("Node {0} is not an input")]
    NotAnInput(usize),
    /// The operation would detach the body or create a cycle.
    #[error("Invalid hierarchy operation on node {0}")]
    InvalidHierarchy(usize),
    /// No fillable username/password pair was found.
    #[error("Required form fields not found")]
    NoForm,
    /// The page URL has no hostname.
    #[error("Invalid page url: {0}")]
    InvalidUrl(String),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === StorageError ===

/// Errors related to extension-local storage.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    IoError(String),
    #[error("Storage serialization error: {0}")]
    SerializationError(String),
}
