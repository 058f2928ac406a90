//! Entry point tying the credential store and the challenge coordinator to
//! the host's main loop and configuration

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use sipauth_infra_common::{ConfigStore, MainLoop};
use tracing::info;

use crate::challenge::CredentialProvider;
use crate::coordinator::AuthChallengeCoordinator;
use crate::error::Result;
use crate::events::{AuthListener, PendingOperations};
use crate::store::CredentialStore;

/// Authentication core of one application instance
///
/// ```rust
/// use std::rc::Rc;
/// use sipauth_core::{AuthCore, AuthListener, Credential, CredentialRequest};
/// use sipauth_infra_common::{ConfigStore, MainLoop};
///
/// struct Prompt;
///
/// impl AuthListener for Prompt {
///     fn on_credential_requested(&self, request: &CredentialRequest) {
///         println!("password needed for {}", request.identity);
///     }
///     fn on_registration_failed(&self, account: &str, detail: &str) {
///         println!("{} failed: {}", account, detail);
///     }
/// }
///
/// let core = AuthCore::new(MainLoop::new(), ConfigStore::new(), Rc::new(Prompt), None);
/// core.store().add(Credential::new("alice").with_password("secret")).unwrap();
/// assert_eq!(core.store().len(), 1);
/// ```
pub struct AuthCore {
    main_loop: Rc<MainLoop>,
    config: Rc<RefCell<ConfigStore>>,
    coordinator: Rc<AuthChallengeCoordinator>,
    store: Rc<CredentialStore>,
}

impl AuthCore {
    /// Create the core and load the persisted credentials from `config`
    pub fn new(
        main_loop: Rc<MainLoop>,
        config: ConfigStore,
        listener: Rc<dyn AuthListener>,
        operations: Option<Rc<dyn PendingOperations>>,
    ) -> Self {
        let config = Rc::new(RefCell::new(config));
        let coordinator = AuthChallengeCoordinator::new(main_loop.clone(), listener, operations.clone());
        let store = CredentialStore::new(config.clone(), coordinator.clone(), operations);
        let loaded = store.load_from_config();
        info!(credentials = loaded, "Authentication core ready");

        Self {
            main_loop,
            config,
            coordinator,
            store,
        }
    }

    /// Create the core from a TOML configuration file
    pub fn from_file(
        main_loop: Rc<MainLoop>,
        path: impl AsRef<Path>,
        listener: Rc<dyn AuthListener>,
        operations: Option<Rc<dyn PendingOperations>>,
    ) -> Result<Self> {
        let config = ConfigStore::load_from_file(path)?;
        Ok(Self::new(main_loop, config, listener, operations))
    }

    pub fn main_loop(&self) -> &Rc<MainLoop> {
        &self.main_loop
    }

    pub fn config(&self) -> &Rc<RefCell<ConfigStore>> {
        &self.config
    }

    pub fn coordinator(&self) -> &Rc<AuthChallengeCoordinator> {
        &self.coordinator
    }

    pub fn store(&self) -> &Rc<CredentialStore> {
        &self.store
    }

    /// The store as seen by the protocol layer
    pub fn provider(&self) -> Rc<dyn CredentialProvider> {
        self.store.clone()
    }

    /// Pump the main loop once; returns the number of timers fired
    pub fn iterate(&self) -> usize {
        self.main_loop.iterate()
    }

    /// Write the configuration, credentials included, to a TOML file
    pub fn save_config(&self, path: impl AsRef<Path>) -> Result<()> {
        self.store.write_all();
        self.config.borrow().save_to_file(path)?;
        Ok(())
    }
}

impl std::fmt::Debug for AuthCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthCore")
            .field("main_loop", &self.main_loop)
            .field("coordinator", &self.coordinator)
            .field("store", &self.store)
            .finish()
    }
}
