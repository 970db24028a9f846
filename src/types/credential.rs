use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A stored (identifier, secret) pair for one origin.
///
/// The client never mutates a credential in place; the remote service is the
/// source of truth and a later save replaces it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credential {
    pub origin: String,
    pub identifier: String,
    pub secret: String,
}

impl Credential {
    pub fn new(origin: &str, identifier: &str, secret: &str) -> Self {
        Self {
            origin: origin.to_string(),
            identifier: identifier.to_string(),
            secret: secret.to_string(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("origin", &self.origin)
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Credential object as returned by the remote service.
///
/// Older records carry `username`, newer ones `email`; both may be present.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[zeroize(skip)]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "websiteUrl", default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

impl CredentialRecord {
    /// The identifier shown to the user and written into the username field:
    /// the email when present, otherwise the username.
    pub fn display_identifier(&self) -> Option<&str> {
        self.email
            .as_deref()
            .filter(|e| !e.is_empty())
            .or_else(|| self.username.as_deref().filter(|u| !u.is_empty()))
    }

    /// Converts the wire record into a `Credential` for `origin`.
    ///
    /// Returns `None` for records without any identifier.
    pub fn to_credential(&self, origin: &str) -> Option<Credential> {
        let identifier = self.display_identifier()?;
        let origin = self
            .website_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(origin);
        Some(Credential::new(origin, identifier, &self.password))
    }

    pub fn from_credential(credential: &Credential) -> Self {
        Self {
            id: None,
            username: Some(credential.identifier.clone()),
            email: None,
            password: credential.secret.clone(),
            website_url: Some(credential.origin.clone()),
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("website_url", &self.website_url)
            .finish()
    }
}

/// Body of `POST /save_credentials` and payload of the `SAVE_CREDENTIALS` message.
#[derive(Clone, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SaveRequest {
    #[serde(rename = "websiteUrl")]
    pub website_url: String,
    pub username: String,
    pub password: String,
}

impl SaveRequest {
    pub fn new(website_url: &str, username: &str, password: &str) -> Self {
        Self {
            website_url: website_url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// The service rejects saves with any empty field.
    pub fn is_complete(&self) -> bool {
        !self.website_url.is_empty() && !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for SaveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveRequest")
            .field("website_url", &self.website_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /register`.
#[derive(Clone, PartialEq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub age: u32,
    pub phone: String,
}

impl RegistrationRequest {
    /// All fields are required; age must be positive.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty()
            && !self.password.is_empty()
            && !self.name.is_empty()
            && self.age > 0
            && !self.phone.is_empty()
    }
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("age", &self.age)
            .field("phone", &self.phone)
            .finish()
    }
}

/// Whether the remote service recognizes an authenticated user.
///
/// Polled per request and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    pub logged_in: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl SessionStatus {
    pub fn logged_out() -> Self {
        Self::default()
    }

    pub fn logged_in(email: Option<&str>) -> Self {
        Self {
            logged_in: true,
            email: email.map(str::to_string),
        }
    }
}
