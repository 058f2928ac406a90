//! OAuth access token refresh (RFC 6749 section 6)
//!
//! A Bearer challenge that cannot be answered because the access token has
//! expired postpones the request and posts the refresh token to the
//! credential's token endpoint. The new tokens are stored through the
//! credential provider, then the requests waiting on that endpoint are
//! retried. A failed refresh aborts them with their challenge response.
//! Requests postponed for any other reason are left alone.

use chrono::Utc;
use sipauth_core::{Credential, TokenResponse};
use tracing::{debug, info, warn};

use crate::arena::RequestId;
use crate::client::HttpClient;
use crate::message::Content;
use crate::request::Completion;
use crate::response::HttpResponse;
use crate::transport::HttpTransport;

/// A refresh POST in flight and the requests waiting on its outcome
#[derive(Debug)]
pub(crate) struct PendingRefresh {
    pub(crate) request: RequestId,
    pub(crate) waiting: Vec<RequestId>,
}

impl<T: HttpTransport> HttpClient<T> {
    /// Post the refresh token of `credential` on behalf of `waiting`.
    ///
    /// If a refresh to the same endpoint is in flight, `waiting` joins it.
    pub(crate) fn start_token_refresh(&mut self, credential: Credential, waiting: RequestId) {
        let (Some(endpoint), Some(refresh_token)) = (credential.token_endpoint(), credential.refresh_token()) else {
            return;
        };
        if let Some(refresh) = self.refreshing.get_mut(endpoint) {
            debug!(endpoint, request = %waiting, "Token refresh already in flight");
            if !refresh.waiting.contains(&waiting) {
                refresh.waiting.push(waiting);
            }
            return;
        }
        let endpoint = endpoint.to_string();

        let mut pairs = vec![("grant_type", "refresh_token"), ("refresh_token", refresh_token.token())];
        if let Some(client_id) = credential.client_id() {
            pairs.push(("client_id", client_id));
        }
        let body = Content::form(pairs);

        let id = match self.create_request("POST", &endpoint) {
            Ok(id) => id,
            Err(e) => {
                warn!(endpoint = %endpoint, "Cannot refresh access token: {}", e);
                self.abort_waiting(vec![waiting]);
                return;
            }
        };
        if let Some(request) = self.request_mut(id) {
            request.add_header("Accept", "application/json").set_body(body);
        }

        info!(endpoint = %endpoint, "Refreshing access token");
        self.refreshing.insert(
            endpoint.clone(),
            PendingRefresh {
                request: id,
                waiting: vec![waiting],
            },
        );
        let completion = Completion::TokenRefresh {
            endpoint: endpoint.clone(),
            credential,
        };
        if let Err(e) = self.execute_with(id, completion) {
            warn!(endpoint = %endpoint, "Cannot refresh access token: {}", e);
            if let Some(refresh) = self.refreshing.remove(&endpoint) {
                self.abort_waiting(refresh.waiting);
            }
        }
    }

    pub(crate) fn finish_token_refresh(&mut self, endpoint: &str, mut credential: Credential, response: HttpResponse) {
        let waiting = self
            .refreshing
            .remove(endpoint)
            .map(|refresh| refresh.waiting)
            .unwrap_or_default();

        if !response.is_success() {
            warn!(endpoint, response = %response, "Access token refresh failed");
            self.abort_waiting(waiting);
            return;
        }

        let body = response.body().and_then(|c| c.as_str()).unwrap_or_default();
        let tokens = match TokenResponse::from_json(body) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(endpoint, "Invalid token endpoint response: {}", e);
                self.abort_waiting(waiting);
                return;
            }
        };

        let target = credential.access_token().and_then(|t| t.target()).map(str::to_string);
        let (mut access, refresh) = tokens.into_tokens(Utc::now().timestamp());
        if let Some(target) = target {
            access = access.with_target(target);
        }
        credential.set_access_token(Some(access));
        if let Some(refresh) = refresh {
            credential.set_refresh_token(Some(refresh));
        }

        match self.provider().update_credential(credential) {
            Ok(_) => {
                info!(endpoint, "Access token refreshed");
                self.retry_waiting(waiting);
            }
            Err(e) => {
                warn!(endpoint, "Could not store refreshed token: {}", e);
                self.abort_waiting(waiting);
            }
        }
    }

    /// Restart the requests of `waiting` that are still postponed
    fn retry_waiting(&mut self, waiting: Vec<RequestId>) -> usize {
        let mut restarted = 0;
        for id in waiting {
            if self.postponed_requests().contains(&id) && self.restart(id).is_ok() {
                restarted += 1;
            }
        }
        debug!(restarted, "Retried requests waiting for a token refresh");
        restarted
    }

    /// Abort the requests of `waiting` that are still postponed
    fn abort_waiting(&mut self, waiting: Vec<RequestId>) -> usize {
        let mut aborted = 0;
        for id in waiting {
            if self.postponed_requests().contains(&id) && self.abort_authentication(id).is_ok() {
                aborted += 1;
            }
        }
        debug!(aborted, "Aborted requests waiting for a token refresh");
        aborted
    }
}
