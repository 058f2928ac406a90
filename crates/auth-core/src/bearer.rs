//! Bearer tokens (RFC 6750) attached to a credential
//!
//! A token is persisted as a single configuration value, `"<token> <expiration>"`,
//! where the expiration is in seconds since the Unix epoch and `0` means the
//! expiration is not known.

use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuthError, Result};

/// An access or refresh token issued by an authorization server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BearerToken {
    token: String,
    target: Option<String>,
    expiration: i64,
}

impl BearerToken {
    /// Create a token expiring at `expiration` (epoch seconds, 0 when unknown)
    pub fn new(token: impl Into<String>, expiration: i64) -> Self {
        Self {
            token: token.into(),
            target: None,
            expiration,
        }
    }

    /// Restrict the token to a target hostname
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn expiration(&self) -> i64 {
        self.expiration
    }

    /// Whether the token is past its expiration time.
    ///
    /// A token whose expiration is unknown is reported as valid.
    pub fn is_expired(&self) -> bool {
        if self.expiration == 0 {
            warn!("Bearer token expiration is unknown, assuming it is still valid");
            return false;
        }
        Utc::now().timestamp() >= self.expiration
    }

    /// Render as the persisted `"<token> <expiration>"` form
    pub fn to_config_string(&self) -> String {
        format!("{} {}", self.token, self.expiration)
    }
}

impl fmt::Display for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_config_string())
    }
}

impl FromStr for BearerToken {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split_whitespace();
        let token = parts
            .next()
            .ok_or_else(|| AuthError::InvalidToken("empty token value".to_string()))?;
        let expiration = match parts.next() {
            Some(exp) => exp
                .parse::<i64>()
                .map_err(|_| AuthError::InvalidToken(format!("invalid expiration '{}'", exp)))?,
            None => 0,
        };
        if parts.next().is_some() {
            return Err(AuthError::InvalidToken(format!("unexpected trailing data in '{}'", s)));
        }
        Ok(BearerToken::new(token, expiration))
    }
}

/// Successful token endpoint response (RFC 6749 section 5.1)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn from_json(body: &str) -> Result<Self> {
        let response: TokenResponse = serde_json::from_str(body)?;
        if let Some(kind) = &response.token_type {
            if !kind.eq_ignore_ascii_case("bearer") {
                return Err(AuthError::InvalidToken(format!("unexpected token type '{}'", kind)));
            }
        }
        Ok(response)
    }

    /// Build the new access token and, when issued, the new refresh token
    pub fn into_tokens(self, now: i64) -> (BearerToken, Option<BearerToken>) {
        let expiration = self.expires_in.map(|secs| now + secs).unwrap_or(0);
        let access = BearerToken::new(self.access_token, expiration);
        let refresh = self.refresh_token.map(|token| BearerToken::new(token, 0));
        (access, refresh)
    }
}
