//! Identity-token exchange for the model host, with an expiry-aware cache.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::config::GenerationSettings;
use crate::error::PipelineError;
use crate::http;

/// Grant type for exchanging an API key at the IAM endpoint.
const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Cached tokens are refreshed once they are this close to expiring.
const EXPIRY_MARGIN: Duration = Duration::from_secs(300);

/// A bearer token and how long the issuer says it lives.
#[derive(Clone)]
pub struct AccessToken {
    pub value: String,
    pub expires_in: Option<Duration>,
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Exchanges a long-lived credential for a fresh access token.
pub trait TokenIssuer {
    fn issue(&self) -> Result<AccessToken, PipelineError>;
}

/// Hands out a usable bearer token, fetching one when needed.
pub trait TokenSource {
    fn access_token(&self) -> Result<String, PipelineError>;
}

// ── IAM client ───────────────────────────────────────────────────────────────

pub struct IamTokenClient {
    endpoint: String,
    api_key: String,
    agent: ureq::Agent,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

impl IamTokenClient {
    pub fn new(settings: &GenerationSettings, api_key: String) -> Self {
        Self {
            endpoint: settings.iam_endpoint.clone(),
            api_key,
            agent: http::agent(Duration::from_secs(settings.token_timeout_secs)),
        }
    }

    /// Client-credentials style POST. Any non-2xx answer is an auth failure.
    pub fn fetch_access_token(&self) -> Result<AccessToken, PipelineError> {
        let response = self
            .agent
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .send_form([
                ("grant_type", APIKEY_GRANT_TYPE),
                ("apikey", self.api_key.as_str()),
            ])
            .map_err(|e| PipelineError::Auth(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = http::error_body(response, 300);
            return Err(PipelineError::Auth(format!(
                "IAM endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .into_body()
            .read_json()
            .map_err(|e| PipelineError::Auth(format!("invalid token response: {}", e)))?;

        tracing::info!("access token obtained");
        Ok(AccessToken {
            value: token.access_token,
            expires_in: token.expires_in.map(Duration::from_secs),
        })
    }
}

impl TokenIssuer for IamTokenClient {
    fn issue(&self) -> Result<AccessToken, PipelineError> {
        self.fetch_access_token()
    }
}

// ── Cache ────────────────────────────────────────────────────────────────────

/// Reuses an issued token until it is within five minutes of expiring.
///
/// Tokens without an `expires_in` are fetched once and kept for the run.
pub struct CachedTokenSource<I> {
    issuer: I,
    cached: RefCell<Option<CachedToken>>,
}

struct CachedToken {
    value: String,
    refresh_after: Option<Instant>,
}

impl<I: TokenIssuer> CachedTokenSource<I> {
    pub fn new(issuer: I) -> Self {
        Self {
            issuer,
            cached: RefCell::new(None),
        }
    }

    /// Drop the cached token so the next call goes back to the issuer.
    pub fn invalidate(&self) {
        self.cached.borrow_mut().take();
    }
}

impl<I: TokenIssuer> TokenSource for CachedTokenSource<I> {
    fn access_token(&self) -> Result<String, PipelineError> {
        let now = Instant::now();
        if let Some(cached) = self.cached.borrow().as_ref() {
            let fresh = cached.refresh_after.map_or(true, |deadline| now < deadline);
            if fresh {
                tracing::debug!("reusing cached access token");
                return Ok(cached.value.clone());
            }
        }

        let token = self.issuer.issue()?;
        let refresh_after = token
            .expires_in
            .map(|ttl| now + ttl.saturating_sub(EXPIRY_MARGIN));
        *self.cached.borrow_mut() = Some(CachedToken {
            value: token.value.clone(),
            refresh_after,
        });
        Ok(token.value)
    }
}
