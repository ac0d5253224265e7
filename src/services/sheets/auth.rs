//! Service account authentication (OAuth2 JWT bearer grant)
//!
//! Signs an RS256 assertion with the service account's private key and
//! exchanges it for an access token. Tokens are cached until shortly before
//! they expire.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SheetError;

const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
const REFRESH_MARGIN_SECS: i64 = 60;

/// Service account identity
#[derive(Clone)]
pub struct GoogleCredentials {
    pub client_email: String,
    pub private_key: String,
}

impl GoogleCredentials {
    /// Build credentials, turning literal `\n` sequences in the key into newlines
    pub fn new(client_email: impl Into<String>, private_key: &str) -> Self {
        Self {
            client_email: client_email.into(),
            private_key: normalize_private_key(private_key),
        }
    }
}

impl fmt::Debug for GoogleCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleCredentials")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Keys stored in env vars usually carry escaped newlines
pub fn normalize_private_key(raw: &str) -> String {
    raw.replace("\\n", "\n")
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Access token provider for one service account
pub struct ServiceAccountAuth {
    http: reqwest::Client,
    token_url: String,
    credentials: GoogleCredentials,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountAuth {
    pub fn new(http: reqwest::Client, token_url: impl Into<String>, credentials: GoogleCredentials) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            credentials,
            cached: Mutex::new(None),
        }
    }

    /// Current access token, refreshed when missing or about to expire
    pub async fn access_token(&self) -> Result<String, SheetError> {
        let now = Utc::now();
        if let Some(token) = self.cached_token(now) {
            return Ok(token);
        }

        let assertion = self.sign_assertion(now)?;
        let response = self
            .http
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::Auth(format!("token endpoint returned {}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        debug!(
            "Obtained access token for {} (expires in {}s)",
            self.credentials.client_email, token.expires_in
        );

        *self.cached.lock() = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: now + Duration::seconds(token.expires_in),
        });

        Ok(token.access_token)
    }

    fn cached_token(&self, now: DateTime<Utc>) -> Option<String> {
        self.cached
            .lock()
            .as_ref()
            .filter(|token| token.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > now)
            .map(|token| token.access_token.clone())
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> Result<String, SheetError> {
        let iat = now.timestamp();
        let claims = AssertionClaims {
            iss: &self.credentials.client_email,
            scope: SHEETS_READONLY_SCOPE,
            aud: &self.token_url,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())
            .map_err(|e| SheetError::Auth(format!("invalid service account key: {}", e)))?;

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| SheetError::Auth(format!("failed to sign assertion: {}", e)))
    }
}
