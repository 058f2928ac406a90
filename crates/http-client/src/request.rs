//! # Requests
//!
//! An [`HttpRequest`] lives in its client's arena from `create_request` until
//! its handler has run or it is cancelled:
//!
//! ```text
//! Created --execute--> Sent --challenge--> AuthChallenged --pending--> Postponed
//!                       ^                                                  |
//!                       +----------------- Restarted <---- restart --------+
//!
//! Sent/Postponed --> Completed | TimedOut | IoError | InvalidRequest | Cancelled
//! ```

use std::fmt;

use sipauth_core::Credential;
use tracing::trace;

use crate::arena::RequestId;
use crate::message::{Content, Headers, HttpMessage, AUTHORIZATION};
use crate::response::{HttpResponse, RawResponse};
use crate::transport::TransactionId;

/// Callback receiving the final response of a request, exactly once
pub type ResponseHandler = Box<dyn FnOnce(HttpResponse)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestState {
    Created,
    Sent,
    AuthChallenged,
    Postponed,
    Restarted,
    Completed,
    TimedOut,
    IoError,
    InvalidRequest,
    Cancelled,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestState::Completed
                | RequestState::TimedOut
                | RequestState::IoError
                | RequestState::InvalidRequest
                | RequestState::Cancelled
        )
    }
}

impl fmt::Display for RequestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Account used to answer this request's challenges instead of the challenge's hints
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthIdentity {
    pub username: Option<String>,
    pub domain: Option<String>,
}

/// Who receives the final response
pub(crate) enum Completion {
    User(ResponseHandler),
    /// Internal token refresh; the client updates the credential
    TokenRefresh { endpoint: String, credential: Credential },
}

pub struct HttpRequest {
    id: RequestId,
    message: HttpMessage,
    state: RequestState,
    auth_pending: bool,
    auth_identity: Option<AuthIdentity>,
    pub(crate) completion: Option<Completion>,
    pub(crate) transaction: Option<TransactionId>,
    pub(crate) last_response: Option<RawResponse>,
}

impl HttpRequest {
    pub(crate) fn new(id: RequestId, message: HttpMessage) -> Self {
        Self {
            id,
            message,
            state: RequestState::Created,
            auth_pending: false,
            auth_identity: None,
            completion: None,
            transaction: None,
            last_response: None,
        }
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn method(&self) -> &str {
        &self.message.method
    }

    pub fn uri(&self) -> &url::Url {
        &self.message.uri
    }

    pub fn message(&self) -> &HttpMessage {
        &self.message
    }

    pub fn headers(&self) -> &Headers {
        &self.message.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.message.headers.get(name)
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.message.headers.add(name, value);
        self
    }

    pub fn remove_header(&mut self, name: &str) -> &mut Self {
        self.message.headers.remove(name);
        self
    }

    pub fn set_body(&mut self, body: Content) -> &mut Self {
        self.message.body = Some(body);
        self
    }

    pub fn body(&self) -> Option<&Content> {
        self.message.body.as_ref()
    }

    /// Answer challenges for this request with the given account
    pub fn set_auth_identity(&mut self, username: Option<&str>, domain: Option<&str>) -> &mut Self {
        self.auth_identity = Some(AuthIdentity {
            username: username.map(str::to_string),
            domain: domain.map(str::to_string),
        });
        self
    }

    pub fn auth_identity(&self) -> Option<&AuthIdentity> {
        self.auth_identity.as_ref()
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// A challenge is waiting for a credential; the response is withheld
    pub fn is_auth_pending(&self) -> bool {
        self.auth_pending
    }

    pub fn has_buffered_response(&self) -> bool {
        self.last_response.is_some()
    }

    pub(crate) fn set_state(&mut self, state: RequestState) {
        trace!(request = %self.id, from = %self.state, to = %state, "Request state");
        self.state = state;
    }

    pub(crate) fn set_auth_pending(&mut self, pending: bool) {
        self.auth_pending = pending;
    }

    /// Forget the previous attempt before submitting again
    pub(crate) fn prepare_restart(&mut self) {
        self.message.headers.remove(AUTHORIZATION);
        self.auth_pending = false;
        self.last_response = None;
        self.transaction = None;
        self.set_state(RequestState::Restarted);
    }
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("id", &self.id)
            .field("message", &self.message.to_string())
            .field("state", &self.state)
            .field("auth_pending", &self.auth_pending)
            .field("transaction", &self.transaction)
            .finish()
    }
}
