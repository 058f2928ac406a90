//! # sipauth-core
//!
//! Credentials and authentication-challenge coordination for a SIP stack.
//!
//! When an operation (REGISTER, SUBSCRIBE, an HTTP request issued for the
//! stack) is challenged, the protocol layer asks the [`CredentialProvider`]
//! to answer the [`AuthChallenge`]. Known credentials answer immediately;
//! otherwise the [`AuthChallengeCoordinator`] asks the application for a
//! credential, once per account and per pump cycle, and the operation waits
//! until the application adds one to the [`CredentialStore`].
//!
//! Everything runs on the thread pumping the
//! [`MainLoop`](sipauth_infra_common::MainLoop); the types are `!Send` and
//! shared through `Rc`.

pub mod auth;
pub mod bearer;
pub mod challenge;
pub mod coordinator;
pub mod credential;
pub mod digest;
pub mod error;
pub mod events;
pub mod policy;
pub mod store;

pub use auth::AuthCore;
pub use bearer::{BearerToken, TokenResponse};
pub use challenge::{AuthChallenge, AuthMode, ChallengeAnswer, CredentialProvider, FillOutcome};
pub use coordinator::{AuthChallengeCoordinator, CoordinatorState};
pub use credential::{section_name, Credential, CredentialIdentity, AUTH_INFO_SECTION_PREFIX};
pub use digest::{compute_ha1, DigestAlgorithm};
pub use error::{AuthError, Result};
pub use events::{
    AuthListener, AuthMethod, CredentialRequest, OperationId, OperationKind, PendingAuthOperation,
    PendingOperations,
};
pub use policy::{AuthPolicy, SIP_SECTION};
pub use store::CredentialStore;
