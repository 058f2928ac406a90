//! Authentication challenges and the provider that answers them
//!
//! An [`AuthChallenge`] is what the protocol layer hands over when a server
//! answers `401`/`407` (or asks for a client certificate). The
//! [`CredentialProvider`] fills the answer from known credentials and reports
//! a [`FillOutcome`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bearer::BearerToken;
use crate::credential::{unquote, Credential, CredentialIdentity};
use crate::digest::DigestAlgorithm;
use crate::error::{AuthError, Result};

/// Authentication scheme requested by a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthMode {
    Digest,
    Bearer,
    Tls,
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::Digest => write!(f, "Digest"),
            AuthMode::Bearer => write!(f, "Bearer"),
            AuthMode::Tls => write!(f, "TLS"),
        }
    }
}

/// Result of trying to answer a challenge from known credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// No applicable scheme, proceed unauthenticated
    NoAuth,
    /// The answer is filled, the transport retries by itself
    Done,
    /// No credential yet, the operation has to wait
    Pending,
}

/// Material filled in answer to a challenge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChallengeAnswer {
    pub username: Option<String>,
    pub userid: Option<String>,
    pub password: Option<String>,
    pub ha1: Option<String>,
    pub algorithm: Option<DigestAlgorithm>,
    pub bearer_token: Option<BearerToken>,
    pub tls_cert: Option<String>,
    pub tls_key: Option<String>,
    pub tls_cert_path: Option<String>,
    pub tls_key_path: Option<String>,
}

impl ChallengeAnswer {
    /// Digest and TLS parts taken from a credential
    pub fn from_credential(credential: &Credential) -> Self {
        Self {
            username: credential.username().map(str::to_string),
            userid: credential.userid().or(credential.username()).map(str::to_string),
            password: credential.password().map(str::to_string),
            ha1: credential.ha1().map(str::to_string),
            algorithm: credential.explicit_algorithm(),
            bearer_token: None,
            tls_cert: credential.tls_cert().map(str::to_string),
            tls_key: credential.tls_key().map(str::to_string),
            tls_cert_path: credential.tls_cert_path().map(str::to_string),
            tls_key_path: credential.tls_key_path().map(str::to_string),
        }
    }
}

/// A server request for credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    pub mode: AuthMode,
    pub realm: Option<String>,
    pub username: Option<String>,
    pub domain: Option<String>,
    pub algorithm: Option<DigestAlgorithm>,
    /// Authorization server advertised by a Bearer challenge
    pub authz_server: Option<String>,
    pub answer: Option<ChallengeAnswer>,
}

impl AuthChallenge {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            realm: None,
            username: None,
            domain: None,
            algorithm: None,
            authz_server: None,
            answer: None,
        }
    }

    pub fn digest(realm: impl Into<String>) -> Self {
        Self::new(AuthMode::Digest).with_realm(realm)
    }

    pub fn bearer(realm: impl Into<String>) -> Self {
        Self::new(AuthMode::Bearer).with_realm(realm)
    }

    pub fn tls() -> Self {
        Self::new(AuthMode::Tls)
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = Some(realm.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_authz_server(mut self, uri: impl Into<String>) -> Self {
        self.authz_server = Some(uri.into());
        self
    }

    pub fn identity(&self) -> CredentialIdentity {
        CredentialIdentity::new(self.username.as_deref(), self.realm.as_deref(), self.domain.as_deref())
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }

    /// Parse a `WWW-Authenticate` or `Proxy-Authenticate` header value.
    ///
    /// Only the parameters used to pick a credential are kept; `nonce`,
    /// `opaque` and friends belong to the transport.
    pub fn parse_header(value: &str) -> Result<Self> {
        let value = value.trim();
        let (scheme, params) = match value.find(char::is_whitespace) {
            Some(pos) => (&value[..pos], value[pos..].trim_start()),
            None => (value, ""),
        };

        let mut challenge = if scheme.eq_ignore_ascii_case("Digest") {
            AuthChallenge::new(AuthMode::Digest)
        } else if scheme.eq_ignore_ascii_case("Bearer") {
            AuthChallenge::new(AuthMode::Bearer)
        } else {
            return Err(AuthError::InvalidChallenge(format!("unsupported scheme '{}'", scheme)));
        };

        for (name, value) in split_params(params)? {
            match name.to_ascii_lowercase().as_str() {
                "realm" => challenge.realm = Some(value.to_string()),
                "algorithm" if challenge.mode == AuthMode::Digest => {
                    challenge.algorithm = Some(value.parse()?)
                }
                "authz_server" | "authorization_uri" => challenge.authz_server = Some(value.to_string()),
                _ => {}
            }
        }
        Ok(challenge)
    }
}

/// Split `name=value, name="quoted, value"` pairs
fn split_params(params: &str) -> Result<Vec<(&str, &str)>> {
    let mut out = Vec::new();
    let mut rest = params.trim();
    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| AuthError::InvalidChallenge(format!("missing '=' in '{}'", rest)))?;
        let name = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();

        let (raw, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            let end = quoted
                .find('"')
                .ok_or_else(|| AuthError::InvalidChallenge(format!("unterminated quote in '{}'", after)))?;
            (&after[..end + 2], &quoted[end + 1..])
        } else {
            match after.find(',') {
                Some(pos) => (after[..pos].trim_end(), &after[pos..]),
                None => (after.trim_end(), ""),
            }
        };
        out.push((name, unquote(raw)));
        rest = remaining.trim_start().trim_start_matches(',').trim_start();
    }
    Ok(out)
}

/// Answers challenges from known credentials
pub trait CredentialProvider {
    /// Try to answer `challenge`.
    ///
    /// The hints, when given, take precedence over the challenge's own
    /// username and domain.
    fn fill_auth_challenge(
        &self,
        challenge: &mut AuthChallenge,
        hint_username: Option<&str>,
        hint_domain: Option<&str>,
    ) -> FillOutcome;

    /// A credential for the challenge's realm whose access token can be refreshed
    fn find_refreshable_token(&self, challenge: &AuthChallenge) -> Option<Credential>;

    /// Add or replace a credential; returns the number of operations replayed
    fn update_credential(&self, credential: Credential) -> Result<usize>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_digest_header() {
        let challenge = AuthChallenge::parse_header(
            r#"Digest realm="sip.example.com", nonce="a1b2, c3", qop="auth", algorithm=SHA-256, opaque="x""#,
        )
        .unwrap();
        assert_eq!(challenge.mode, AuthMode::Digest);
        assert_eq!(challenge.realm.as_deref(), Some("sip.example.com"));
        assert_eq!(challenge.algorithm, Some(DigestAlgorithm::Sha256));
        assert!(!challenge.is_answered());
    }

    #[test]
    fn test_parse_bearer_header() {
        let challenge =
            AuthChallenge::parse_header(r#"Bearer realm="sip.example.org", authz_server="https://auth.example.org""#)
                .unwrap();
        assert_eq!(challenge.mode, AuthMode::Bearer);
        assert_eq!(challenge.authz_server.as_deref(), Some("https://auth.example.org"));
    }

    #[test]
    fn test_parse_header_errors() {
        assert!(matches!(
            AuthChallenge::parse_header("Basic realm=\"x\""),
            Err(AuthError::InvalidChallenge(_))
        ));
        assert!(matches!(
            AuthChallenge::parse_header("Digest realm=\"x\", algorithm=SHA-512"),
            Err(AuthError::UnsupportedAlgorithm(_))
        ));
        assert!(AuthChallenge::parse_header("Digest realm=\"open").is_err());
    }

    #[test]
    fn test_answer_uses_username_when_no_userid() {
        let credential = Credential::new("alice").with_password("secret");
        let answer = ChallengeAnswer::from_credential(&credential);
        assert_eq!(answer.userid.as_deref(), Some("alice"));
        assert_eq!(answer.password.as_deref(), Some("secret"));
    }
}
