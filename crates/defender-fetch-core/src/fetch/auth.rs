//! OAuth2 client-credentials token acquisition

use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{AccessToken, Credentials, TokenResponse};

/// Exchanges application credentials for a bearer token
#[derive(Debug, Clone)]
pub struct Authenticator {
    client: Client,
    token_url: Url,
    credentials: Credentials,
}

impl Authenticator {
    /// Create an authenticator posting to `{authority}/{tenant_id}/oauth2/token`
    pub fn new(client: Client, authority: &Url, credentials: Credentials) -> Result<Self> {
        let token_url = token_url(authority, &credentials.tenant_id)?;

        Ok(Self {
            client,
            token_url,
            credentials,
        })
    }

    /// Create an authenticator from the run configuration
    pub fn from_config(client: Client, config: &Config) -> Result<Self> {
        Self::new(client, &config.endpoints.authority_url()?, config.credentials())
    }

    /// Token endpoint this authenticator posts to
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Request a new token. No caching: every call hits the endpoint.
    pub async fn fetch_token(&self) -> Result<AccessToken> {
        debug!(url = %self.token_url, app_id = %self.credentials.app_id, "Requesting access token");

        let response = self
            .client
            .post(self.token_url.clone())
            .form(&self.credentials.form()[..])
            .send()
            .await
            .map_err(|e| Error::TokenRequest(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Token endpoint rejected the request");
            return Err(Error::TokenRequest(format!("token endpoint returned {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::TokenRequest(e.to_string()))?;

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|e| Error::TokenParse(e.to_string()))?;

        let token = match parsed.access_token {
            Some(token) if !token.trim().is_empty() => AccessToken::new(token),
            _ => return Err(Error::TokenParse("response has no access_token".to_string())),
        };

        info!(tenant_id = %self.credentials.tenant_id, "Access token acquired");
        Ok(token)
    }
}

fn token_url(authority: &Url, tenant_id: &str) -> Result<Url> {
    let mut url = authority.clone();
    url.path_segments_mut()
        .map_err(|()| Error::config(format!("authority '{authority}' is not a base URL")))?
        .pop_if_empty()
        .extend([tenant_id, "oauth2", "token"]);
    Ok(url)
}
