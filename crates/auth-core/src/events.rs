//! Application callbacks and the protocol-layer view of operations waiting
//! for authentication

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::credential::{Credential, CredentialIdentity};
use crate::digest::DigestAlgorithm;

/// Scheme for which the application is asked to supply a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthMethod {
    HttpDigest,
    Tls,
    Bearer,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::HttpDigest => write!(f, "HttpDigest"),
            AuthMethod::Tls => write!(f, "Tls"),
            AuthMethod::Bearer => write!(f, "Bearer"),
        }
    }
}

/// One "please supply a credential" need
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRequest {
    pub identity: CredentialIdentity,
    /// Algorithm the server asked for; not part of the deduplication key
    pub algorithm: Option<DigestAlgorithm>,
    pub method: AuthMethod,
    pub authz_server: Option<String>,
}

impl CredentialRequest {
    pub fn digest(identity: CredentialIdentity, algorithm: Option<DigestAlgorithm>) -> Self {
        Self {
            identity,
            algorithm,
            method: AuthMethod::HttpDigest,
            authz_server: None,
        }
    }

    pub fn bearer(identity: CredentialIdentity, authz_server: Option<String>) -> Self {
        Self {
            identity,
            algorithm: None,
            method: AuthMethod::Bearer,
            authz_server,
        }
    }
}

/// Callbacks into the application
pub trait AuthListener {
    /// Credentials are needed for an account.
    ///
    /// The application may add a credential to the store from within the
    /// callback or later; further requests made while notifying are dropped.
    fn on_credential_requested(&self, request: &CredentialRequest);

    /// An operation could not be authenticated during a notification pass
    fn on_registration_failed(&self, account: &str, error_detail: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub u64);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Register,
    Subscribe,
    Publish,
    Other,
}

/// A protocol operation blocked on a challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthOperation {
    pub id: OperationId,
    pub kind: OperationKind,
    /// Account the operation belongs to, as shown to the application
    pub account: String,
    pub requested: CredentialRequest,
    /// Reason phrase of the challenge response
    pub error_detail: String,
}

/// Query and replay interface of the protocol layer
pub trait PendingOperations {
    fn pending_auth_operations(&self) -> Vec<PendingAuthOperation>;

    /// Resume an operation with the credential now available
    fn authenticate(&self, id: OperationId, credential: &Credential);
}
