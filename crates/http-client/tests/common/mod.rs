//! Test utilities shared by the HTTP client integration tests
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use sipauth_core::{AuthCore, AuthListener, AuthChallenge, CredentialRequest};
use sipauth_http::{
    HttpClient, HttpClientConfig, HttpMessage, HttpResponse, HttpTransport, TlsCryptoConfig, TransactionId,
    TransportEvent, TransportEventKind,
};
use sipauth_infra_common::{ConfigStore, MainLoop};

#[derive(Default)]
pub struct MockState {
    next_transaction: u64,
    pub sent: Vec<(TransactionId, HttpMessage)>,
    pub cancelled: Vec<TransactionId>,
    pub completed_auth: Vec<(TransactionId, Option<AuthChallenge>)>,
    pub events: VecDeque<TransportEvent>,
    pub refuse: bool,
    pub tls: Option<TlsCryptoConfig>,
}

/// Transport recording what the client asks and replaying scripted events
#[derive(Clone, Default)]
pub struct MockTransport(pub Rc<RefCell<MockState>>);

impl MockTransport {
    pub fn push(&self, transaction: TransactionId, kind: TransportEventKind) {
        self.0
            .borrow_mut()
            .events
            .push_back(TransportEvent::new(transaction, kind));
    }

    pub fn last_transaction(&self) -> TransactionId {
        self.0.borrow().sent.last().map(|(tx, _)| *tx).expect("nothing sent")
    }

    pub fn sent(&self) -> Vec<HttpMessage> {
        self.0.borrow().sent.iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn transaction_of(&self, index: usize) -> TransactionId {
        self.0.borrow().sent[index].0
    }

    pub fn refuse_sends(&self, refuse: bool) {
        self.0.borrow_mut().refuse = refuse;
    }
}

impl HttpTransport for MockTransport {
    fn send_request(&mut self, message: &HttpMessage) -> Result<TransactionId, String> {
        let mut state = self.0.borrow_mut();
        if state.refuse {
            return Err("connection refused".to_string());
        }
        state.next_transaction += 1;
        let transaction = TransactionId(state.next_transaction);
        state.sent.push((transaction, message.clone()));
        Ok(transaction)
    }

    fn cancel_request(&mut self, transaction: TransactionId) {
        self.0.borrow_mut().cancelled.push(transaction);
    }

    fn complete_authentication(&mut self, transaction: TransactionId, challenge: Option<&AuthChallenge>) {
        self.0
            .borrow_mut()
            .completed_auth
            .push((transaction, challenge.cloned()));
    }

    fn poll_event(&mut self) -> Option<TransportEvent> {
        self.0.borrow_mut().events.pop_front()
    }

    fn set_tls_crypto_config(&mut self, config: &TlsCryptoConfig) {
        self.0.borrow_mut().tls = Some(config.clone());
    }
}

#[derive(Default)]
pub struct PromptRecorder(pub RefCell<Vec<CredentialRequest>>);

impl AuthListener for PromptRecorder {
    fn on_credential_requested(&self, request: &CredentialRequest) {
        self.0.borrow_mut().push(request.clone());
    }

    fn on_registration_failed(&self, _account: &str, _error_detail: &str) {}
}

/// Responses received by handlers, in delivery order
pub type Responses = Rc<RefCell<Vec<HttpResponse>>>;

pub fn recorder(responses: &Responses) -> impl FnOnce(HttpResponse) + 'static {
    let responses = responses.clone();
    move |response| responses.borrow_mut().push(response)
}

pub struct Fixture {
    pub core: AuthCore,
    pub prompts: Rc<PromptRecorder>,
    pub transport: MockTransport,
    pub client: HttpClient<MockTransport>,
    pub responses: Responses,
}

pub fn fixture_with(config: HttpClientConfig) -> Fixture {
    let prompts = Rc::new(PromptRecorder::default());
    let core = AuthCore::new(MainLoop::new(), ConfigStore::new(), prompts.clone(), None);
    let transport = MockTransport::default();
    let client = HttpClient::new(transport.clone(), config, core.provider());
    Fixture {
        core,
        prompts,
        transport,
        client,
        responses: Rc::default(),
    }
}

pub fn fixture() -> Fixture {
    fixture_with(HttpClientConfig::default())
}
