//! Client credentials and the bearer token they are exchanged for

use std::fmt;

use serde::Deserialize;

/// Application credentials for the client-credentials grant
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Azure AD tenant
    pub tenant_id: String,
    /// Application (client) id
    pub app_id: String,
    /// Application secret
    pub app_secret: String,
    /// Resource the token is requested for
    pub resource_app_id_uri: String,
}

impl Credentials {
    /// Form body of the token request, in the order it is sent
    pub fn form(&self) -> [(&'static str, &str); 4] {
        [
            ("resource", self.resource_app_id_uri.as_str()),
            ("client_id", self.app_id.as_str()),
            ("client_secret", self.app_secret.as_str()),
            ("grant_type", "client_credentials"),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenant_id", &self.tenant_id)
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field("resource_app_id_uri", &self.resource_app_id_uri)
            .finish()
    }
}

/// Bearer token valid for a single run
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token string
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token is empty or whitespace
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(<{} bytes>)", self.0.len())
    }
}

/// Body of a successful token response; only the token itself is read
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Issued token, absent on some error payloads
    #[serde(default)]
    pub access_token: Option<String>,
}
