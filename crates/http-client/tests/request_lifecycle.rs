//! HTTP request lifecycle tests
//!
//! Submission, challenge handling, postponing, retry and abort of requests
//! against a scripted transport.

mod common;

use common::{fixture, fixture_with, recorder, Fixture};
use proptest::prelude::*;
use sipauth_core::{compute_ha1, AuthChallenge, Credential, DigestAlgorithm, FillOutcome};
use sipauth_http::{
    HttpClientConfig, HttpError, RawResponse, RequestState, ResponseStatus, TransportEventKind, AUTHORIZATION,
    USER_AGENT,
};

fn digest_challenge() -> TransportEventKind {
    TransportEventKind::AuthRequested(AuthChallenge::digest("example.com"))
}

fn unauthorized() -> TransportEventKind {
    TransportEventKind::Response(
        RawResponse::new(401, "Unauthorized").with_header("WWW-Authenticate", "Digest realm=\"example.com\""),
    )
}

/// Execute a GET for alice and have the transport challenge it
fn challenged_request(f: &mut Fixture, path: &str) -> sipauth_http::RequestId {
    let id = f
        .client
        .create_request("GET", &format!("https://example.com/{}", path))
        .unwrap();
    f.client
        .request_mut(id)
        .unwrap()
        .set_auth_identity(Some("alice"), Some("example.com"));
    f.client.execute(id, recorder(&f.responses)).unwrap();
    let tx = f.transport.last_transaction();
    f.transport.push(tx, digest_challenge());
    f.transport.push(tx, unauthorized());
    f.client.iterate();
    id
}

#[test]
fn test_completed_request_delivers_once() {
    let mut f = fixture();
    let id = f.client.create_request("GET", "https://example.com/x").unwrap();
    f.client.execute(id, recorder(&f.responses)).unwrap();

    let sent = f.transport.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].headers.get(USER_AGENT).unwrap().starts_with("sipauth/"));
    assert_eq!(f.client.request(id).unwrap().state(), RequestState::Sent);

    let tx = f.transport.last_transaction();
    f.transport
        .push(tx, TransportEventKind::ResponseHeaders { status_code: 200 });
    f.transport.push(
        tx,
        TransportEventKind::Response(RawResponse::new(200, "OK").with_body("text/plain", "hello")),
    );
    // A late duplicate is dropped
    f.transport.push(tx, TransportEventKind::Timeout);
    assert_eq!(f.client.iterate(), 3);

    let responses = f.responses.borrow();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].status_code(), 200);
    assert_eq!(responses[0].body().and_then(|c| c.as_str()), Some("hello"));
    assert!(f.client.request(id).is_none());
    assert!(matches!(f.client.restart(id), Err(HttpError::RequestNotFound(_))));
}

#[test]
fn test_timeout_and_io_error_are_terminal() {
    let mut f = fixture();
    let first = f.client.create_request("GET", "https://example.com/a").unwrap();
    f.client.execute(first, recorder(&f.responses)).unwrap();
    let first_tx = f.transport.last_transaction();
    let second = f.client.create_request("POST", "https://example.com/b").unwrap();
    f.client.execute(second, recorder(&f.responses)).unwrap();
    let second_tx = f.transport.last_transaction();

    f.transport.push(first_tx, TransportEventKind::Timeout);
    f.transport
        .push(second_tx, TransportEventKind::IoError("connection reset".to_string()));
    f.client.iterate();

    let statuses: Vec<_> = f.responses.borrow().iter().map(|r| (r.status(), r.status_code())).collect();
    assert_eq!(statuses, vec![(ResponseStatus::Timeout, 0), (ResponseStatus::IoError, 0)]);
    assert_eq!(f.client.active_requests(), 0);
}

#[test]
fn test_refused_submission_is_invalid_request() {
    let mut f = fixture();
    f.transport.refuse_sends(true);
    let id = f.client.create_request("GET", "https://example.com/x").unwrap();
    f.client.execute(id, recorder(&f.responses)).unwrap();

    assert_eq!(f.responses.borrow()[0].status(), ResponseStatus::InvalidRequest);
    assert!(f.client.request(id).is_none());
}

#[test]
fn test_https_only_refuses_plain_http() {
    let mut f = fixture_with(HttpClientConfig::default().with_https_only(true));
    let id = f.client.create_request("GET", "http://example.com/x").unwrap();
    f.client.execute(id, recorder(&f.responses)).unwrap();

    assert!(f.transport.sent().is_empty());
    assert_eq!(f.responses.borrow()[0].status(), ResponseStatus::InvalidRequest);
}

#[test]
fn test_create_request_errors() {
    let mut f = fixture();
    assert!(matches!(
        f.client.create_request("GET", "not a uri"),
        Err(HttpError::InvalidUri(_))
    ));
    assert!(matches!(
        f.client.create_request("GET", "ftp://example.com/file"),
        Err(HttpError::InvalidUri(_))
    ));
    assert!(matches!(
        f.client.create_request("GE T", "https://example.com"),
        Err(HttpError::InvalidMethod(_))
    ));

    let id = f.client.create_request("GET", "https://example.com").unwrap();
    f.client.execute(id, |_| {}).unwrap();
    assert!(matches!(f.client.execute(id, |_| {}), Err(HttpError::AlreadyExecuted(_))));
}

#[test]
fn test_challenge_postpones_then_retry_strips_authorization() {
    let mut f = fixture();
    let id = f.client.create_request("GET", "https://example.com/x").unwrap();
    f.client
        .request_mut(id)
        .unwrap()
        .add_header(AUTHORIZATION, "Digest username=\"alice\", response=\"stale\"")
        .set_auth_identity(Some("alice"), Some("example.com"));
    f.client.execute(id, recorder(&f.responses)).unwrap();
    let tx = f.transport.last_transaction();

    f.transport.push(tx, digest_challenge());
    f.transport.push(tx, unauthorized());
    f.client.iterate();

    let request = f.client.request(id).unwrap();
    assert_eq!(request.state(), RequestState::Postponed);
    assert!(request.is_auth_pending());
    assert!(request.has_buffered_response());
    assert!(f.responses.borrow().is_empty());
    assert_eq!(f.client.postponed_requests(), &[id]);
    assert_eq!(f.transport.0.borrow().completed_auth, vec![(tx, None)]);

    f.core.iterate();
    assert_eq!(f.prompts.0.borrow().len(), 1);
    f.core
        .store()
        .add(Credential::new("alice").with_password("secret").with_realm("example.com"))
        .unwrap();

    assert_eq!(f.client.retry_pending_requests(), 1);
    assert_eq!(f.client.retry_pending_requests(), 0);

    let sent = f.transport.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].headers.contains(AUTHORIZATION));
    assert!(!sent[1].headers.contains(AUTHORIZATION));
    assert!(sent[1].headers.contains(USER_AGENT));
    assert_eq!(f.client.request(id).unwrap().state(), RequestState::Sent);

    // The transport answers the new challenge itself this time
    let retry_tx = f.transport.last_transaction();
    f.transport.push(retry_tx, digest_challenge());
    f.transport
        .push(retry_tx, TransportEventKind::Response(RawResponse::new(200, "OK")));
    f.client.iterate();

    let state = f.transport.0.borrow();
    let answered = state.completed_auth.last().unwrap().1.as_ref().unwrap();
    let answer = answered.answer.as_ref().unwrap();
    assert_eq!(answer.userid.as_deref(), Some("alice"));
    assert_eq!(
        answer.ha1.as_deref(),
        Some(compute_ha1("alice", "example.com", "secret", DigestAlgorithm::Md5).as_str())
    );
    // Dropped once the digest was stored
    assert_eq!(answer.password, None);
    assert_eq!(f.responses.borrow().len(), 1);
    assert_eq!(f.responses.borrow()[0].status_code(), 200);
}

#[test]
fn test_known_credential_answers_without_postponing() {
    let mut f = fixture();
    f.core
        .store()
        .add(Credential::new("alice").with_password("secret").with_realm("example.com"))
        .unwrap();

    let id = challenged_request(&mut f, "x");
    // Challenge answered, so the 401 in the script is the final answer
    assert!(f.client.request(id).is_none());
    assert_eq!(f.responses.borrow()[0].status_code(), 401);
    assert!(f.client.postponed_requests().is_empty());
    assert!(f.transport.0.borrow().completed_auth[0].1.is_some());
}

#[test]
fn test_no_applicable_scheme_proceeds_unauthenticated() {
    let mut f = fixture();
    let id = f.client.create_request("GET", "https://example.com/x").unwrap();
    f.client.execute(id, recorder(&f.responses)).unwrap();
    let tx = f.transport.last_transaction();

    f.transport
        .push(tx, TransportEventKind::AuthRequested(AuthChallenge::tls()));
    f.client.iterate();
    assert_eq!(f.transport.0.borrow().completed_auth, vec![(tx, None)]);
    assert!(!f.client.request(id).unwrap().is_auth_pending());
    assert_eq!(f.client.request(id).unwrap().state(), RequestState::Sent);
}

#[test]
fn test_abort_pending_delivers_buffered_challenge() {
    let mut f = fixture();
    let ids: Vec<_> = (0..3).map(|i| challenged_request(&mut f, &i.to_string())).collect();
    assert_eq!(f.client.postponed_requests(), ids.as_slice());

    assert_eq!(f.client.abort_pending_requests(), 3);
    assert!(f.client.postponed_requests().is_empty());
    assert_eq!(f.client.abort_pending_requests(), 0);

    let responses = f.responses.borrow();
    assert_eq!(responses.len(), 3);
    assert!(responses
        .iter()
        .all(|r| r.status() == ResponseStatus::Valid && r.status_code() == 401));
    assert!(responses[0].header("www-authenticate").is_some());
    assert_eq!(f.client.active_requests(), 0);
}

#[test]
fn test_abort_before_response_cancels_transaction() {
    let mut f = fixture();
    let id = f.client.create_request("GET", "https://example.com/x").unwrap();
    f.client.execute(id, recorder(&f.responses)).unwrap();
    let tx = f.transport.last_transaction();
    f.transport.push(tx, digest_challenge());
    f.client.iterate();
    assert!(!f.client.request(id).unwrap().has_buffered_response());

    f.client.abort_authentication(id).unwrap();
    assert_eq!(f.transport.0.borrow().cancelled, vec![tx]);
    assert_eq!(f.responses.borrow()[0].status(), ResponseStatus::InvalidRequest);

    // The 401 arriving afterwards has nowhere to go
    f.transport.push(tx, unauthorized());
    f.client.iterate();
    assert_eq!(f.responses.borrow().len(), 1);
}

#[test]
fn test_cancel_before_execute() {
    let mut f = fixture();
    let id = f.client.create_request("GET", "https://example.com/x").unwrap();

    assert!(f.client.cancel(id));
    assert!(f.client.request(id).is_none());
    assert!(!f.client.cancel(id));
    assert!(f.transport.sent().is_empty());
    assert!(f.transport.0.borrow().cancelled.is_empty());
    assert!(f.client.postponed_requests().is_empty());
    assert!(f.responses.borrow().is_empty());
}

#[test]
fn test_cancel_postponed_request() {
    let mut f = fixture();
    let id = challenged_request(&mut f, "x");
    let tx = f.transport.last_transaction();

    assert!(f.client.cancel(id));
    assert!(f.client.postponed_requests().is_empty());
    assert_eq!(f.transport.0.borrow().cancelled, vec![tx]);
    assert_eq!(f.client.retry_pending_requests(), 0);
    assert!(f.responses.borrow().is_empty());
}

#[test]
fn test_dropping_client_cancels_postponed_requests() {
    let mut f = fixture();
    challenged_request(&mut f, "a");
    challenged_request(&mut f, "b");
    let transport = f.transport.clone();
    let responses = f.responses.clone();

    drop(f);
    assert_eq!(transport.0.borrow().cancelled.len(), 2);
    assert!(responses.borrow().is_empty());
}

#[test]
fn test_provider_outcome_for_digest_without_credential() {
    let f = fixture();
    let mut challenge = AuthChallenge::digest("example.com");
    assert_eq!(
        f.core.provider().fill_auth_challenge(&mut challenge, Some("alice"), None),
        FillOutcome::Pending
    );
}

proptest! {
    #[test]
    fn prop_retry_resumes_each_postponed_request_once(count in 1usize..8) {
        let mut f = fixture();
        let ids: Vec<_> = (0..count).map(|i| challenged_request(&mut f, &i.to_string())).collect();
        prop_assert_eq!(f.client.postponed_requests(), ids.as_slice());

        prop_assert_eq!(f.client.retry_pending_requests(), count);
        prop_assert!(f.client.postponed_requests().is_empty());
        prop_assert_eq!(f.client.retry_pending_requests(), 0);

        let sent = f.transport.sent();
        prop_assert_eq!(sent.len(), count * 2);
        prop_assert!(f.responses.borrow().is_empty());
    }

    #[test]
    fn prop_restart_always_strips_authorization(restarts in 1usize..6, headers in 0usize..3) {
        let mut f = fixture();
        let id = f.client.create_request("GET", "https://example.com/x").unwrap();
        f.client.execute(id, |_| {}).unwrap();

        for _ in 0..restarts {
            for n in 0..headers {
                f.client.request_mut(id).unwrap().add_header(AUTHORIZATION, format!("Bearer t{}", n));
            }
            f.client.restart(id).unwrap();
            let sent = f.transport.sent();
            prop_assert!(!sent.last().unwrap().headers.contains(AUTHORIZATION));
        }
        prop_assert_eq!(f.transport.sent().len(), restarts + 1);
    }
}
