//! # HTTP client
//!
//! [`HttpClient`] owns the transport, every request in flight and the list of
//! requests postponed until a credential becomes available.
//!
//! Requests are addressed by [`RequestId`]. Once a request's handler has run,
//! or the request was cancelled, its id is stale and operations on it return
//! [`HttpError::RequestNotFound`].
//!
//! ```rust,ignore
//! let id = client.create_request("GET", "https://example.com/x")?;
//! client.execute(id, |response| println!("{}", response))?;
//! loop {
//!     client.iterate();
//! }
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use sipauth_core::{AuthChallenge, AuthMode, CredentialProvider, FillOutcome};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::arena::{RequestArena, RequestId};
use crate::config::HttpClientConfig;
use crate::error::{HttpError, Result};
use crate::message::{is_valid_method, HttpMessage, USER_AGENT};
use crate::request::{Completion, HttpRequest, RequestState};
use crate::response::{HttpResponse, ResponseStatus};
use crate::token_refresh::PendingRefresh;
use crate::transport::{HttpTransport, TransactionId, TransportEvent, TransportEventKind};

pub struct HttpClient<T: HttpTransport> {
    transport: T,
    config: HttpClientConfig,
    provider: Rc<dyn CredentialProvider>,
    requests: RequestArena<HttpRequest>,
    transactions: HashMap<TransactionId, RequestId>,
    postponed: Vec<RequestId>,
    /// Token endpoints with a refresh in flight
    pub(crate) refreshing: HashMap<String, PendingRefresh>,
}

impl<T: HttpTransport> HttpClient<T> {
    pub fn new(mut transport: T, config: HttpClientConfig, provider: Rc<dyn CredentialProvider>) -> Self {
        transport.set_tls_crypto_config(&config.tls);
        debug!(user_agent = %config.user_agent, https_only = config.https_only, "HTTP client created");
        Self {
            transport,
            config,
            provider,
            requests: RequestArena::new(),
            transactions: HashMap::new(),
            postponed: Vec::new(),
            refreshing: HashMap::new(),
        }
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub(crate) fn provider(&self) -> &Rc<dyn CredentialProvider> {
        &self.provider
    }

    /// Create a request for `method` on `uri`
    pub fn create_request(&mut self, method: &str, uri: &str) -> Result<RequestId> {
        if !is_valid_method(method) {
            return Err(HttpError::InvalidMethod(method.to_string()));
        }
        let uri = Url::parse(uri).map_err(|e| HttpError::InvalidUri(format!("{}: {}", uri, e)))?;
        if !matches!(uri.scheme(), "http" | "https") || uri.host_str().is_none() {
            return Err(HttpError::InvalidUri(uri.to_string()));
        }

        let mut message = HttpMessage::new(method, uri);
        message.headers.set(USER_AGENT, self.config.user_agent.clone());
        let id = self.requests.insert_with(|id| HttpRequest::new(id, message));
        trace!(request = %id, "Request created");
        Ok(id)
    }

    pub fn request(&self, id: RequestId) -> Option<&HttpRequest> {
        self.requests.get(id)
    }

    pub fn request_mut(&mut self, id: RequestId) -> Option<&mut HttpRequest> {
        self.requests.get_mut(id)
    }

    /// Number of requests created and not finished
    pub fn active_requests(&self) -> usize {
        self.requests.len()
    }

    /// Requests postponed until a credential is available, in postponing order
    pub fn postponed_requests(&self) -> &[RequestId] {
        &self.postponed
    }

    /// Submit a request; `handler` receives its final response exactly once.
    ///
    /// A request the transport refuses, or a plain `http` request while the
    /// client is HTTPS only, completes right away with `InvalidRequest`.
    pub fn execute(&mut self, id: RequestId, handler: impl FnOnce(HttpResponse) + 'static) -> Result<()> {
        self.execute_with(id, Completion::User(Box::new(handler)))
    }

    pub(crate) fn execute_with(&mut self, id: RequestId, completion: Completion) -> Result<()> {
        let https_only = self.config.https_only;
        let request = self.requests.get_mut(id).ok_or(HttpError::RequestNotFound(id))?;
        if request.state() != RequestState::Created {
            return Err(HttpError::AlreadyExecuted(id));
        }
        request.completion = Some(completion);

        if https_only && !request.message().is_https() {
            warn!(request = %id, uri = %request.uri(), "Refusing non https request");
            self.finish(id, HttpResponse::failed(ResponseStatus::InvalidRequest), RequestState::InvalidRequest);
            return Ok(());
        }
        self.submit(id);
        Ok(())
    }

    /// Hand the request to the transport, or complete it with `InvalidRequest`
    fn submit(&mut self, id: RequestId) {
        let Some(request) = self.requests.get_mut(id) else {
            return;
        };
        match self.transport.send_request(request.message()) {
            Ok(transaction) => {
                debug!(request = %id, %transaction, message = %request.message(), "Request sent");
                request.transaction = Some(transaction);
                request.set_state(RequestState::Sent);
                self.transactions.insert(transaction, id);
            }
            Err(reason) => {
                warn!(request = %id, "Could not submit request: {}", reason);
                self.finish(id, HttpResponse::failed(ResponseStatus::InvalidRequest), RequestState::InvalidRequest);
            }
        }
    }

    /// Drop a request without calling its handler.
    ///
    /// Returns `false` if the request no longer exists.
    pub fn cancel(&mut self, id: RequestId) -> bool {
        let Some(mut request) = self.requests.remove(id) else {
            return false;
        };
        self.postponed.retain(|p| *p != id);
        self.refreshing.retain(|_, refresh| refresh.request != id);
        if let Some(transaction) = request.transaction.take() {
            self.transactions.remove(&transaction);
            self.transport.cancel_request(transaction);
        }
        request.set_state(RequestState::Cancelled);
        debug!(request = %id, "Request cancelled");
        true
    }

    /// Submit the request again without its previous `Authorization` header
    pub fn restart(&mut self, id: RequestId) -> Result<()> {
        let request = self.requests.get_mut(id).ok_or(HttpError::RequestNotFound(id))?;
        if let Some(old) = request.transaction {
            self.transactions.remove(&old);
        }
        request.prepare_restart();
        self.postponed.retain(|p| *p != id);
        debug!(request = %id, "Restarting request");
        self.submit(id);
        Ok(())
    }

    /// Deliver the last response, challenge included, as the final answer.
    ///
    /// Without a buffered response the transaction is cancelled and the
    /// handler receives `InvalidRequest`.
    pub fn abort_authentication(&mut self, id: RequestId) -> Result<()> {
        let request = self.requests.get_mut(id).ok_or(HttpError::RequestNotFound(id))?;
        match request.last_response.take() {
            Some(raw) => {
                debug!(request = %id, status = raw.status_code, "Aborting authentication with buffered response");
                self.finish(id, HttpResponse::from_raw(raw), RequestState::Completed);
            }
            None => {
                debug!(request = %id, "Aborting authentication before any response");
                if let Some(transaction) = request.transaction.take() {
                    self.transactions.remove(&transaction);
                    self.transport.cancel_request(transaction);
                }
                self.finish(id, HttpResponse::failed(ResponseStatus::InvalidRequest), RequestState::InvalidRequest);
            }
        }
        Ok(())
    }

    /// Suspend a request until a credential is available
    pub fn postpone(&mut self, id: RequestId) -> Result<()> {
        let request = self.requests.get_mut(id).ok_or(HttpError::RequestNotFound(id))?;
        request.set_state(RequestState::Postponed);
        if !self.postponed.contains(&id) {
            self.postponed.push(id);
        }
        debug!(request = %id, postponed = self.postponed.len(), "Request postponed for authentication");
        Ok(())
    }

    /// Restart every postponed request; returns how many were restarted
    pub fn retry_pending_requests(&mut self) -> usize {
        let pending = std::mem::take(&mut self.postponed);
        let mut restarted = 0;
        for id in pending {
            if self.restart(id).is_ok() {
                restarted += 1;
            }
        }
        if restarted > 0 {
            info!(restarted, "Retried requests waiting for authentication");
        }
        restarted
    }

    /// Abort authentication of every postponed request; returns how many were aborted
    pub fn abort_pending_requests(&mut self) -> usize {
        let pending = std::mem::take(&mut self.postponed);
        let mut aborted = 0;
        for id in pending {
            if self.abort_authentication(id).is_ok() {
                aborted += 1;
            }
        }
        if aborted > 0 {
            info!(aborted, "Aborted requests waiting for authentication");
        }
        aborted
    }

    /// Process every event the transport has queued; returns how many were processed
    pub fn iterate(&mut self) -> usize {
        let mut processed = 0;
        while let Some(event) = self.transport.poll_event() {
            self.process_event(event);
            processed += 1;
        }
        processed
    }

    pub fn process_event(&mut self, event: TransportEvent) {
        let transaction = event.transaction;
        let Some(&id) = self.transactions.get(&transaction) else {
            debug!(%transaction, "Discarding event for a request that no longer exists");
            return;
        };

        match event.kind {
            TransportEventKind::ResponseHeaders { status_code } => {
                trace!(request = %id, status_code, "Response headers received");
            }
            TransportEventKind::Response(raw) => {
                let Some(request) = self.requests.get_mut(id) else {
                    self.transactions.remove(&transaction);
                    return;
                };
                if request.is_auth_pending() {
                    debug!(request = %id, status = raw.status_code, "Buffering response while authentication is pending");
                    request.last_response = Some(raw);
                } else {
                    self.finish(id, HttpResponse::from_raw(raw), RequestState::Completed);
                }
            }
            TransportEventKind::Timeout => {
                warn!(request = %id, "Request timed out");
                self.finish(id, HttpResponse::failed(ResponseStatus::Timeout), RequestState::TimedOut);
            }
            TransportEventKind::IoError(reason) => {
                warn!(request = %id, "Request IO error: {}", reason);
                self.finish(id, HttpResponse::failed(ResponseStatus::IoError), RequestState::IoError);
            }
            TransportEventKind::AuthRequested(challenge) => {
                self.handle_challenge(id, transaction, challenge);
            }
        }
    }

    fn handle_challenge(&mut self, id: RequestId, transaction: TransactionId, mut challenge: AuthChallenge) {
        let Some(request) = self.requests.get_mut(id) else {
            return;
        };
        request.set_state(RequestState::AuthChallenged);
        let (username, domain) = request
            .auth_identity()
            .map(|i| (i.username.clone(), i.domain.clone()))
            .unwrap_or_default();

        let outcome = self
            .provider
            .fill_auth_challenge(&mut challenge, username.as_deref(), domain.as_deref());
        debug!(request = %id, mode = %challenge.mode, ?outcome, "Authentication requested");

        match outcome {
            FillOutcome::NoAuth => {
                request.set_state(RequestState::Sent);
                self.transport.complete_authentication(transaction, None);
            }
            FillOutcome::Done => {
                request.set_state(RequestState::Sent);
                self.transport.complete_authentication(transaction, Some(&challenge));
            }
            FillOutcome::Pending => {
                request.set_auth_pending(true);
                if let Err(e) = self.postpone(id) {
                    warn!(request = %id, "Could not postpone request: {}", e);
                }
                self.transport.complete_authentication(transaction, None);
                if challenge.mode == AuthMode::Bearer {
                    if let Some(credential) = self.provider.find_refreshable_token(&challenge) {
                        self.start_token_refresh(credential, id);
                    }
                }
            }
        }
    }

    /// Remove the request and hand `response` to whoever waits for it
    pub(crate) fn finish(&mut self, id: RequestId, response: HttpResponse, state: RequestState) {
        let Some(mut request) = self.requests.remove(id) else {
            return;
        };
        self.postponed.retain(|p| *p != id);
        if let Some(transaction) = request.transaction.take() {
            self.transactions.remove(&transaction);
        }
        request.set_state(state);
        debug!(request = %id, %state, response = %response, "Request finished");

        match request.completion.take() {
            Some(Completion::User(handler)) => handler(response),
            Some(Completion::TokenRefresh { endpoint, credential }) => {
                self.finish_token_refresh(&endpoint, credential, response)
            }
            None => trace!(request = %id, "No handler for finished request"),
        }
    }
}

impl<T: HttpTransport> Drop for HttpClient<T> {
    fn drop(&mut self) {
        let postponed = std::mem::take(&mut self.postponed);
        if !postponed.is_empty() {
            debug!(count = postponed.len(), "Cancelling requests still waiting for authentication");
        }
        for id in postponed {
            self.cancel(id);
        }
    }
}

impl<T: HttpTransport> std::fmt::Debug for HttpClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("requests", &self.requests.len())
            .field("postponed", &self.postponed)
            .finish()
    }
}
