//! Credentials channel.
//!
//! Attaches a bearer token to every outgoing GraphQL request. The token is
//! either fixed or obtained through the OAuth2 client-credentials grant and
//! cached until shortly before it expires.

use crate::config::{ClientCredentials, Credentials, Secret};
use crate::transport::network_error;
use reconcile_core::{preview, TransportError};
use reqwest::header::ACCEPT;
use reqwest::RequestBuilder;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A cached token is refreshed this long before the server says it expires.
pub const EXPIRY_SKEW: Duration = Duration::from_secs(10);

/// How requests are authorized.
#[derive(Debug)]
pub enum Channel {
    /// Fixed bearer token.
    Static(Secret),
    /// OAuth2 client credentials with a cached access token.
    ClientCredentials(TokenSource),
}

impl Channel {
    /// Build the channel for resolved credentials.
    pub fn new(credentials: Credentials, http: reqwest::Client) -> Self {
        match credentials {
            Credentials::Static(token) => Channel::Static(token),
            Credentials::ClientCredentials(creds) => {
                Channel::ClientCredentials(TokenSource::new(creds, http))
            }
        }
    }

    /// Attach the bearer token to `request`.
    pub async fn authorize(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<RequestBuilder, TransportError> {
        let token = match self {
            Channel::Static(token) => token.clone(),
            Channel::ClientCredentials(source) => source.token(cancel).await?,
        };
        Ok(request.bearer_auth(token.expose()))
    }

    /// The backend refused the token with HTTP 401.
    ///
    /// A fetched token is dropped so the next call asks the token endpoint
    /// again. A fixed token has nothing to refresh.
    pub async fn reject(&self) {
        if let Channel::ClientCredentials(source) = self {
            debug!("access token rejected, dropping cached token");
            source.invalidate().await;
        }
    }
}

#[derive(Debug)]
struct CachedToken {
    token: Secret,
    expires_at: Option<Instant>,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(at) => now + EXPIRY_SKEW < at,
            None => true,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Secret,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Source of OAuth2 access tokens.
///
/// Concurrent callers share one cached token; at most one refresh is in
/// flight at a time.
#[derive(Debug)]
pub struct TokenSource {
    http: reqwest::Client,
    credentials: ClientCredentials,
    cache: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    /// Create a token source.
    pub fn new(credentials: ClientCredentials, http: reqwest::Client) -> Self {
        Self {
            http,
            credentials,
            cache: Mutex::new(None),
        }
    }

    /// A valid access token, fetching a new one if the cache is stale.
    pub async fn token(&self, cancel: &CancellationToken) -> Result<Secret, TransportError> {
        let mut cache = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            guard = self.cache.lock() => guard,
        };

        if let Some(cached) = cache.as_ref().filter(|c| c.is_fresh(Instant::now())) {
            return Ok(cached.token.clone());
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            result = self.fetch() => result?,
        };
        let token = fetched.token.clone();
        *cache = Some(fetched);
        Ok(token)
    }

    /// Drop the cached token so the next call fetches a new one.
    ///
    /// [`HttpTransport`](crate::HttpTransport) calls this through
    /// [`Channel::reject`] when the API answers 401. Callers holding their
    /// own `TokenSource` can use it after rotating credentials.
    pub async fn invalidate(&self) {
        *self.cache.lock().await = None;
    }

    async fn fetch(&self) -> Result<CachedToken, TransportError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.expose()),
        ];
        let response = self
            .http
            .post(&self.credentials.token_url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(network_error)?;
        if !status.is_success() {
            return Err(TransportError::Network(format!(
                "token endpoint returned status {}: {}",
                status.as_u16(),
                preview(&String::from_utf8_lossy(&body))
            )));
        }

        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| TransportError::Network(format!("invalid token response: {e}")))?;
        if parsed.access_token.is_blank() {
            return Err(TransportError::Network(
                "token endpoint returned an empty access_token".into(),
            ));
        }

        debug!(expires_in = ?parsed.expires_in, "fetched access token");
        let expires_at = parsed
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        Ok(CachedToken {
            token: parsed.access_token.clone(),
            expires_at,
        })
    }
}
