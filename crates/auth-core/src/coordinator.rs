//! # Challenge coordination
//!
//! Several operations can be challenged for the same account in one pump
//! cycle, for example a REGISTER answered with both an MD5 and a SHA-256
//! challenge. The coordinator collects the credential requests of the cycle
//! and notifies the application once per `(realm, username, domain)` from a
//! zero-delay timer.
//!
//! ```text
//!   Idle --request/found--> Collecting(timer) --timer--> Notifying --> Idle
//! ```
//!
//! While `Notifying`, new requests are dropped (the application usually adds
//! a credential from its callback, which replays operations that may be
//! challenged again) but found identities are still recorded.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use sipauth_infra_common::{Scheduler, TimerId};
use tracing::{debug, info};

use crate::credential::CredentialIdentity;
use crate::events::{AuthListener, CredentialRequest, PendingOperations};

const NOTIFICATION_TIMER: &str = "authentication requests";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Idle,
    Collecting(TimerId),
    Notifying,
}

pub struct AuthChallengeCoordinator {
    weak_self: Weak<AuthChallengeCoordinator>,
    scheduler: Rc<dyn Scheduler>,
    listener: Rc<dyn AuthListener>,
    operations: Option<Rc<dyn PendingOperations>>,
    state: Cell<CoordinatorState>,
    requested: RefCell<Vec<CredentialRequest>>,
    found: RefCell<Vec<CredentialIdentity>>,
}

impl AuthChallengeCoordinator {
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        listener: Rc<dyn AuthListener>,
        operations: Option<Rc<dyn PendingOperations>>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            scheduler,
            listener,
            operations,
            state: Cell::new(CoordinatorState::Idle),
            requested: RefCell::new(Vec::new()),
            found: RefCell::new(Vec::new()),
        })
    }

    pub fn state(&self) -> CoordinatorState {
        self.state.get()
    }

    /// Number of requests queued for the next pass
    pub fn pending_requests(&self) -> usize {
        self.requested.borrow().len()
    }

    /// Ask for a credential to be requested from the application
    pub fn request_credential(&self, request: CredentialRequest) {
        if self.state.get() == CoordinatorState::Notifying {
            debug!(identity = %request.identity, "Ignoring credential request made while notifying");
            return;
        }
        debug!(identity = %request.identity, method = %request.method, "Queueing credential request");
        self.requested.borrow_mut().push(request);
        self.arm_timer();
    }

    /// Note that a challenge for `identity` was answered from known credentials
    pub fn record_found(&self, identity: CredentialIdentity) {
        debug!(identity = %identity, "Credential found for challenge");
        self.found.borrow_mut().push(identity);
        if self.state.get() != CoordinatorState::Notifying {
            self.arm_timer();
        }
    }

    fn arm_timer(&self) {
        if self.state.get() != CoordinatorState::Idle {
            return;
        }
        let weak = self.weak_self.clone();
        let id = self.scheduler.schedule(
            NOTIFICATION_TIMER,
            Duration::ZERO,
            Box::new(move || {
                if let Some(coordinator) = weak.upgrade() {
                    coordinator.run_notification_pass();
                }
            }),
        );
        self.state.set(CoordinatorState::Collecting(id));
    }

    /// Notify the application of the collected requests.
    ///
    /// Returns the number of credential requests delivered. A pass started
    /// while one is already running does nothing.
    pub fn run_notification_pass(&self) -> usize {
        match self.state.replace(CoordinatorState::Notifying) {
            CoordinatorState::Notifying => return 0,
            CoordinatorState::Collecting(timer) => {
                self.scheduler.cancel(timer);
            }
            CoordinatorState::Idle => {}
        }

        let queue = std::mem::take(&mut *self.requested.borrow_mut());
        let mut notified: Vec<CredentialIdentity> = Vec::new();

        for request in queue {
            let found = self.found.borrow().iter().any(|f| f.matches(&request.identity));
            if found {
                debug!(identity = %request.identity, "Credential already available, not notifying");
                continue;
            }
            if notified.iter().any(|n| n.matches(&request.identity)) {
                continue;
            }
            info!(identity = %request.identity, method = %request.method, "Requesting credential from application");
            notified.push(request.identity.clone());
            self.listener.on_credential_requested(&request);
        }

        if let Some(operations) = &self.operations {
            for operation in operations.pending_auth_operations() {
                info!(
                    operation = %operation.id,
                    account = %operation.account,
                    "Operation still waiting for authentication"
                );
                self.listener
                    .on_registration_failed(&operation.account, &operation.error_detail);
            }
        }

        self.requested.borrow_mut().clear();
        self.found.borrow_mut().clear();
        self.state.set(CoordinatorState::Idle);
        notified.len()
    }
}

impl std::fmt::Debug for AuthChallengeCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthChallengeCoordinator")
            .field("state", &self.state.get())
            .field("requested", &self.requested.borrow().len())
            .field("found", &self.found.borrow().len())
            .finish()
    }
}
