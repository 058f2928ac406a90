//! Responses delivered to request handlers

use std::cell::OnceCell;
use std::fmt;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::message::{Content, Headers, CONTENT_TYPE};

/// How a request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseStatus {
    /// A response was received; see the status code
    Valid,
    Timeout,
    IoError,
    /// The request could not be submitted
    InvalidRequest,
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseStatus::Valid => write!(f, "Valid"),
            ResponseStatus::Timeout => write!(f, "Timeout"),
            ResponseStatus::IoError => write!(f, "IoError"),
            ResponseStatus::InvalidRequest => write!(f, "InvalidRequest"),
        }
    }
}

/// A response as produced by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status_code: u16,
    pub reason: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status_code: u16, reason: impl Into<String>) -> Self {
        Self {
            status_code,
            reason: reason.into(),
            headers: Headers::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    pub fn with_body(mut self, content_type: &str, body: impl Into<Bytes>) -> Self {
        self.headers.set(CONTENT_TYPE, content_type);
        self.body = body.into();
        self
    }
}

/// Final answer to a request
///
/// The body is materialized as a [`Content`] on first access.
#[derive(Debug)]
pub struct HttpResponse {
    status: ResponseStatus,
    status_code: u16,
    reason: String,
    headers: Headers,
    raw_body: Bytes,
    body: OnceCell<Option<Content>>,
}

impl HttpResponse {
    pub(crate) fn from_raw(raw: RawResponse) -> Self {
        Self {
            status: ResponseStatus::Valid,
            status_code: raw.status_code,
            reason: raw.reason,
            headers: raw.headers,
            raw_body: raw.body,
            body: OnceCell::new(),
        }
    }

    pub(crate) fn failed(status: ResponseStatus) -> Self {
        Self {
            status,
            status_code: 0,
            reason: String::new(),
            headers: Headers::new(),
            raw_body: Bytes::new(),
            body: OnceCell::new(),
        }
    }

    pub fn status(&self) -> ResponseStatus {
        self.status
    }

    /// HTTP status code, 0 unless the status is `Valid`
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Valid && (200..300).contains(&self.status_code)
    }

    pub fn body(&self) -> Option<&Content> {
        self.body
            .get_or_init(|| {
                if self.raw_body.is_empty() {
                    return None;
                }
                let content_type = self
                    .headers
                    .get(CONTENT_TYPE)
                    .unwrap_or("application/octet-stream");
                Some(Content::new(content_type, self.raw_body.clone()))
            })
            .as_ref()
    }

    /// Decode the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let bytes = self.body().map(Content::as_bytes).unwrap_or_default();
        Ok(serde_json::from_slice(bytes)?)
    }
}

impl fmt::Display for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            ResponseStatus::Valid => write!(f, "{} {}", self.status_code, self.reason),
            status => write!(f, "{}", status),
        }
    }
}
