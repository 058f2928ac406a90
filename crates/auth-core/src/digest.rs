//! # Digest algorithms
//!
//! The closed set of digest algorithms a credential may carry, and the
//! computation of the `ha1` value (`H(username:realm:password)`, RFC 2617 /
//! RFC 7616) that can be stored in place of a cleartext password.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use crate::error::{AuthError, Result};

/// Digest algorithm accepted for a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DigestAlgorithm {
    #[default]
    #[serde(rename = "MD5")]
    Md5,
    #[serde(rename = "SHA-256")]
    Sha256,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha256 => "SHA-256",
        }
    }

    /// Length of the hex encoded `ha1` this algorithm produces
    pub fn digest_len(&self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 32,
            DigestAlgorithm::Sha256 => 64,
        }
    }

    /// Parse a configured value; an empty value selects MD5
    pub fn parse_or_default(value: &str) -> Result<Self> {
        if value.trim().is_empty() {
            Ok(DigestAlgorithm::Md5)
        } else {
            value.parse()
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("MD5") {
            Ok(DigestAlgorithm::Md5)
        } else if s.eq_ignore_ascii_case("SHA-256") {
            Ok(DigestAlgorithm::Sha256)
        } else {
            Err(AuthError::UnsupportedAlgorithm(s.to_string()))
        }
    }
}

/// Compute the hex encoded `ha1` for `userid:realm:password`
pub fn compute_ha1(userid: &str, realm: &str, password: &str, algorithm: DigestAlgorithm) -> String {
    let input = format!("{}:{}:{}", userid, realm, password);
    match algorithm {
        DigestAlgorithm::Md5 => format!("{:x}", md5::compute(input.as_bytes())),
        DigestAlgorithm::Sha256 => hex::encode(sha2::Sha256::digest(input.as_bytes())),
    }
}
