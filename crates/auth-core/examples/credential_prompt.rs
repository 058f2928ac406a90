//! Minimal host application for the authentication core.
//!
//! Sets up logging from the `[logging]` section of the configuration, then
//! answers two challenges for the same account (MD5 and SHA-256). The
//! application is prompted once and supplies a password from its callback.
//! The stored digest is an MD5 one, so on the next attempt the MD5 challenge
//! is answered and the SHA-256 one prompts again.
//!
//! ```text
//! cargo run -p sipauth-core --example credential_prompt [config.toml]
//! ```

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use sipauth_core::{
    AuthChallenge, AuthCore, AuthListener, Credential, CredentialRequest, CredentialStore, DigestAlgorithm,
};
use sipauth_infra_common::logging::{log_welcome, setup_logging, LoggingConfig};
use sipauth_infra_common::{ConfigStore, MainLoop};
use tracing::{info, warn};

/// Answers every prompt with a fixed password
#[derive(Default)]
struct PasswordPrompt {
    store: RefCell<Weak<CredentialStore>>,
}

impl AuthListener for PasswordPrompt {
    fn on_credential_requested(&self, request: &CredentialRequest) {
        let Some(store) = self.store.borrow().upgrade() else {
            return;
        };
        let identity = &request.identity;
        let Some(username) = identity.username.as_deref() else {
            warn!(identity = %identity, "Prompt without username");
            return;
        };
        let mut credential = Credential::new(username).with_password("secret");
        if let Some(realm) = identity.realm.as_deref() {
            credential = credential.with_realm(realm);
        }
        info!(identity = %identity, method = %request.method, "Supplying password");
        if let Err(e) = store.add(credential) {
            warn!("Could not add credential: {}", e);
        }
    }

    fn on_registration_failed(&self, account: &str, error_detail: &str) {
        warn!(account, error_detail, "Registration failed");
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = match std::env::args().nth(1) {
        Some(path) => ConfigStore::load_from_file(path)?,
        None => {
            let mut config = ConfigStore::new();
            config.set_string("logging", "level", "debug");
            config.set_string("logging", "app_name", "credential_prompt");
            config
        }
    };

    let logging = LoggingConfig::from_config(&config)?;
    let app_name = logging.app_name.clone();
    setup_logging(logging)?;
    log_welcome(&app_name, env!("CARGO_PKG_VERSION"));

    let prompt = Rc::new(PasswordPrompt::default());
    let core = AuthCore::new(MainLoop::new(), config, prompt.clone(), None);
    *prompt.store.borrow_mut() = Rc::downgrade(core.store());
    let provider = core.provider();

    for attempt in 1..=2 {
        for algorithm in [DigestAlgorithm::Md5, DigestAlgorithm::Sha256] {
            let mut challenge = AuthChallenge::digest("sip.example.com")
                .with_username("alice")
                .with_algorithm(algorithm);
            let outcome = provider.fill_auth_challenge(&mut challenge, None, None);
            info!(attempt, %algorithm, ?outcome, "Challenge processed");
        }
        core.iterate();
    }

    info!(credentials = core.store().len(), "Done");
    Ok(())
}
