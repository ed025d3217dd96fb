//! Service-account authentication for the BigQuery REST API.
//!
//! Implements the OAuth 2.0 JWT bearer grant: a self-signed RS256 assertion built from
//! the service-account key is exchanged at the key's `token_uri` for an access token.
//! Tokens are cached until shortly before they expire.

use crate::error::{Result, WordlistError};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use tracing::debug;

/// OAuth scope required to run query jobs.
pub const BIGQUERY_SCOPE: &str = "https://www.googleapis.com/auth/bigquery";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: u64 = 3600;
const EXPIRY_BUFFER: Duration = Duration::from_secs(60);

/// The fields of a service-account JSON key that authentication needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Reads a key from a credentials file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            WordlistError::submission(format!(
                "Failed to read credentials file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&content)
    }

    /// Parses a key from its JSON form.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            WordlistError::submission(format!("Invalid service account credentials: {e}"))
        })
    }

    /// Builds the signed assertion exchanged for an access token.
    fn assertion(&self, scope: &str) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| WordlistError::submission(format!("System clock error: {e}")))?
            .as_secs();

        let claims = Claims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = self.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes()).map_err(|e| {
            WordlistError::submission(format!("Invalid service account private key: {e}"))
        })?;

        encode(&header, &claims, &key)
            .map_err(|e| WordlistError::submission(format!("Failed to sign JWT assertion: {e}")))
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

/// OAuth 2.0 token response from the authorization server.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Instant::now() + EXPIRY_BUFFER >= self.expires_at
    }
}

/// When a token issued at `now` with a lifetime of `expires_in` seconds expires.
///
/// Lifetimes too large to represent fall back to the assertion lifetime.
fn expiry(now: Instant, expires_in: u64) -> Instant {
    now.checked_add(Duration::from_secs(expires_in))
        .unwrap_or_else(|| now + Duration::from_secs(ASSERTION_LIFETIME_SECS))
}

/// Hands out access tokens for one service account, refreshing when they expire.
#[derive(Debug)]
pub struct TokenSource {
    key: ServiceAccountKey,
    scope: String,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> Self {
        Self {
            key,
            scope: BIGQUERY_SCOPE.to_string(),
            http,
            cached: Mutex::new(None),
        }
    }

    pub fn key(&self) -> &ServiceAccountKey {
        &self.key
    }

    /// Returns a valid access token, exchanging a new assertion if needed.
    pub async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.access_token.clone());
        }

        let fresh = self.fetch_token().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn fetch_token(&self) -> Result<CachedToken> {
        debug!("Fetching access token from {}", self.key.token_uri);
        let assertion = self.key.assertion(&self.scope)?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| WordlistError::submission(format!("Token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WordlistError::submission(format!("Failed to read token response: {e}")))?;

        if !status.is_success() {
            return Err(WordlistError::submission(format!(
                "Token request rejected ({status}): {body}. Please check your credentials."
            )));
        }

        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            WordlistError::submission(format!("Failed to parse token response: {e}"))
        })?;

        let expires_in = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: expiry(Instant::now(), expires_in),
        })
    }
}
