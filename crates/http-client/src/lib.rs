//! # sipauth-http
//!
//! HTTP requests issued on behalf of the SIP stack (provisioning, file
//! sharing, token endpoints) whose authentication challenges are answered
//! from the shared credential store.
//!
//! A challenged request with no matching credential is postponed: its
//! challenge response is withheld from the handler until
//! [`HttpClient::retry_pending_requests`] resubmits it or
//! [`HttpClient::abort_pending_requests`] delivers the challenge response as
//! the final answer.

pub mod arena;
pub mod client;
pub mod config;
pub mod error;
pub mod message;
pub mod request;
pub mod response;
pub mod token_refresh;
pub mod transport;

pub use arena::{RequestArena, RequestId};
pub use client::HttpClient;
pub use config::{HttpClientConfig, TlsCryptoConfig};
pub use error::{HttpError, Result};
pub use message::{Content, Headers, HttpMessage, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
pub use request::{AuthIdentity, HttpRequest, RequestState, ResponseHandler};
pub use response::{HttpResponse, RawResponse, ResponseStatus};
pub use transport::{HttpTransport, TransactionId, TransportEvent, TransportEventKind};
