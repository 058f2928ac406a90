//! The seam between the client and the HTTP stack carrying the requests
//!
//! The transport owns connections, TLS and the challenge/retry mechanics of
//! the wire protocol. When a server challenges a request, the transport
//! reports [`TransportEventKind::AuthRequested`] and waits for
//! [`HttpTransport::complete_authentication`]: with an answered challenge it
//! retries by itself, without one it delivers the challenge response.

use std::fmt;

use sipauth_core::AuthChallenge;

use crate::config::TlsCryptoConfig;
use crate::message::HttpMessage;
use crate::response::RawResponse;

/// One submission of a request to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// Status line and headers are known, the body may still be coming
    ResponseHeaders { status_code: u16 },
    /// Final response
    Response(RawResponse),
    Timeout,
    IoError(String),
    /// The server asks for credentials
    AuthRequested(AuthChallenge),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub transaction: TransactionId,
    pub kind: TransportEventKind,
}

impl TransportEvent {
    pub fn new(transaction: TransactionId, kind: TransportEventKind) -> Self {
        Self { transaction, kind }
    }
}

pub trait HttpTransport {
    /// Submit a message; the error explains why it could not be submitted
    fn send_request(&mut self, message: &HttpMessage) -> Result<TransactionId, String>;

    /// Stop a transaction; no further event is expected for it
    fn cancel_request(&mut self, transaction: TransactionId);

    /// Resume a challenged transaction, with the filled challenge or without
    fn complete_authentication(&mut self, transaction: TransactionId, challenge: Option<&AuthChallenge>);

    /// Next event, if any, for the client's pump
    fn poll_event(&mut self) -> Option<TransportEvent>;

    fn set_tls_crypto_config(&mut self, config: &TlsCryptoConfig);
}
