//! # Credential store
//!
//! The list of credentials known to the application, how challenges are
//! matched against it, and its persistence into `[auth_info_<N>]` sections.
//!
//! ## Matching
//!
//! A lookup for `(realm, username, domain)` tries, in order:
//!
//! 1. the realm alone (two candidates for the same user is ambiguous and
//!    yields nothing),
//! 2. realm and domain,
//! 3. the domain alone,
//! 4. the username alone.
//!
//! The last two only accept credentials without a precomputed digest, since
//! a digest is bound to the realm it was computed for, unless the caller
//! explicitly ignores the realm.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::Utc;
use sipauth_infra_common::ConfigStore;
use tracing::{debug, error, info, warn};

use crate::challenge::{AuthChallenge, AuthMode, ChallengeAnswer, CredentialProvider, FillOutcome};
use crate::coordinator::AuthChallengeCoordinator;
use crate::credential::{realm_match, section_name, Credential, CredentialIdentity};
use crate::digest::DigestAlgorithm;
use crate::error::{AuthError, Result};
use crate::events::{AuthMethod, CredentialRequest, PendingOperations};
use crate::policy::AuthPolicy;

/// Whether `credential` can answer a challenge for `algorithm`
fn algorithm_compatible(credential: &Credential, algorithm: Option<DigestAlgorithm>) -> bool {
    let Some(requested) = algorithm else {
        return true;
    };
    match credential.explicit_algorithm() {
        // A cleartext password can produce any digest
        None if credential.password().is_some() => true,
        // A bare digest without algorithm is an MD5 one
        None => requested == DigestAlgorithm::Md5,
        Some(own) => own == requested,
    }
}

fn find_once(
    list: &[Credential],
    username: Option<&str>,
    realm: Option<&str>,
    domain: Option<&str>,
    algorithm: Option<DigestAlgorithm>,
    ignore_realm: bool,
) -> Option<usize> {
    let username = username?;
    let mut candidate = None;

    for (index, credential) in list.iter().enumerate() {
        if credential.username() != Some(username) || !algorithm_compatible(credential, algorithm) {
            continue;
        }
        let realm_ok = || credential.realm().is_some() && realm_match(realm, credential.realm());
        let no_digest = credential.ha1().is_none() || ignore_realm;

        match (realm, domain) {
            (Some(_), Some(domain)) => {
                if realm_ok() && credential.domain() == Some(domain) {
                    return Some(index);
                }
            }
            (Some(_), None) => {
                if realm_ok() {
                    if candidate.is_some() {
                        warn!(username, "Non unique realm found for user");
                        return None;
                    }
                    candidate = Some(index);
                }
            }
            (None, Some(domain)) => {
                if credential.domain() == Some(domain) && no_digest {
                    return Some(index);
                }
            }
            (None, None) => {
                if no_digest {
                    return Some(index);
                }
            }
        }
    }
    candidate
}

fn find_index(
    list: &[Credential],
    realm: Option<&str>,
    username: Option<&str>,
    domain: Option<&str>,
    algorithm: Option<DigestAlgorithm>,
    ignore_realm: bool,
) -> Option<usize> {
    let mut found = None;
    if realm.is_some() {
        found = find_once(list, username, realm, None, algorithm, false);
        if found.is_none() && domain.is_some() {
            found = find_once(list, username, realm, domain, algorithm, false);
        }
    }
    if found.is_none() && domain.is_some() {
        found = find_once(list, username, None, domain, algorithm, ignore_realm);
    }
    if found.is_none() {
        found = find_once(list, username, None, None, algorithm, ignore_realm);
    }
    found
}

/// Bearer credential for a realm, by credential realm or access token target
fn find_bearer_index(list: &[Credential], realm: Option<&str>, username: Option<&str>) -> Option<usize> {
    let realm = realm?;
    list.iter().position(|credential| {
        let Some(token) = credential.access_token() else {
            return false;
        };
        let user_ok = match (username, credential.username()) {
            (Some(wanted), Some(own)) => wanted == own,
            _ => true,
        };
        let realm_ok = realm_match(Some(realm), credential.realm())
            || token.target().is_some_and(|target| target == realm);
        user_ok && realm_ok
    })
}

fn find_tls_index(list: &[Credential], username: Option<&str>, domain: Option<&str>) -> Option<usize> {
    let (username, domain) = (username?, domain?);
    list.iter().position(|c| {
        c.has_tls_material() && c.username() == Some(username) && c.domain() == Some(domain)
    })
}

/// Credentials of the application, shared as `Rc<CredentialStore>`
pub struct CredentialStore {
    credentials: RefCell<Vec<Credential>>,
    config: Rc<RefCell<ConfigStore>>,
    coordinator: Rc<AuthChallengeCoordinator>,
    operations: Option<Rc<dyn PendingOperations>>,
}

impl CredentialStore {
    pub fn new(
        config: Rc<RefCell<ConfigStore>>,
        coordinator: Rc<AuthChallengeCoordinator>,
        operations: Option<Rc<dyn PendingOperations>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            credentials: RefCell::new(Vec::new()),
            config,
            coordinator,
            operations,
        })
    }

    pub fn coordinator(&self) -> &Rc<AuthChallengeCoordinator> {
        &self.coordinator
    }

    /// Current persistence policy
    pub fn policy(&self) -> AuthPolicy {
        AuthPolicy::from_config(&self.config.borrow())
    }

    /// Load `[auth_info_0]`, `[auth_info_1]`, ... up to the first missing section.
    ///
    /// Sections that cannot be read are skipped with a warning. Returns the
    /// number of credentials loaded.
    pub fn load_from_config(&self) -> usize {
        let config = self.config.borrow();
        let mut loaded = Vec::new();
        let mut index = 0;
        loop {
            let section = section_name(index);
            if !config.has_section(&section) {
                break;
            }
            match Credential::from_config(&config, &section) {
                Ok(credential) => loaded.push(credential),
                Err(e) => warn!(section = %section, "Skipping unreadable credential: {}", e),
            }
            index += 1;
        }
        let count = loaded.len();
        debug!(count, "Loaded credentials from configuration");
        self.credentials.borrow_mut().extend(loaded);
        count
    }

    /// Snapshot of all credentials
    pub fn credentials(&self) -> Vec<Credential> {
        self.credentials.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.credentials.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.borrow().is_empty()
    }

    /// Find a credential, whatever its algorithm
    pub fn find(&self, realm: Option<&str>, username: Option<&str>, domain: Option<&str>) -> Option<Credential> {
        self.find_for_algorithm(realm, username, domain, None, true)
    }

    /// Find a credential able to answer a challenge for `algorithm`
    pub fn find_for_algorithm(
        &self,
        realm: Option<&str>,
        username: Option<&str>,
        domain: Option<&str>,
        algorithm: Option<DigestAlgorithm>,
        ignore_realm: bool,
    ) -> Option<Credential> {
        let list = self.credentials.borrow();
        let found = find_index(&list, realm, username, domain, algorithm, ignore_realm).map(|i| list[i].clone());
        if let Some(credential) = &found {
            debug!(
                username = credential.username().unwrap_or(""),
                realm = credential.realm().unwrap_or(""),
                "Found credential"
            );
        }
        found
    }

    /// TLS credential for a username and domain
    pub fn find_tls(&self, username: Option<&str>, domain: Option<&str>) -> Option<Credential> {
        let list = self.credentials.borrow();
        find_tls_index(&list, username, domain).map(|i| list[i].clone())
    }

    /// First credential holding TLS client material
    pub fn find_any_tls(&self) -> Option<Credential> {
        self.credentials
            .borrow()
            .iter()
            .find(|c| c.has_tls_material())
            .cloned()
    }

    /// Add a credential, or replace the one with the same account.
    ///
    /// Operations waiting for a matching credential are replayed, then the
    /// list is persisted. Returns the number of operations replayed.
    pub fn add(&self, credential: Credential) -> Result<usize> {
        if !credential.has_secret() {
            error!(credential = %credential, "Credential has no password, digest, TLS key or access token");
            return Err(AuthError::InvalidCredential(
                "no password, ha1, TLS key or access token".to_string(),
            ));
        }

        let updating = {
            let mut list = self.credentials.borrow_mut();
            let existing = find_index(
                &list,
                credential.realm(),
                credential.username(),
                credential.domain(),
                None,
                true,
            )
            .filter(|&i| {
                let same_domain = list[i].domain().is_some() && list[i].domain() == credential.domain();
                same_domain || list[i].is_equal_but_algorithms(&credential)
            })
            .or_else(|| list.iter().position(|c| c.is_equal_but_algorithms(&credential)));

            if let Some(index) = existing {
                list.remove(index);
            }
            list.push(credential.clone());
            existing.is_some()
        };

        let replayed = self.replay_pending_operations();
        info!(
            credential = %credential,
            replayed,
            "{} credential",
            if updating { "Updated" } else { "Added" }
        );
        self.write_all();
        Ok(replayed)
    }

    fn replay_pending_operations(&self) -> usize {
        let Some(operations) = &self.operations else {
            return 0;
        };

        let mut replayed = 0;
        for operation in operations.pending_auth_operations() {
            let requested = &operation.requested;
            let identity = &requested.identity;
            let matched = {
                let list = self.credentials.borrow();
                let index = match requested.method {
                    AuthMethod::Bearer => find_bearer_index(&list, identity.realm.as_deref(), identity.username.as_deref()),
                    AuthMethod::Tls => find_tls_index(&list, identity.username.as_deref(), identity.domain.as_deref()),
                    AuthMethod::HttpDigest => find_index(
                        &list,
                        identity.realm.as_deref(),
                        identity.username.as_deref(),
                        identity.domain.as_deref(),
                        requested.algorithm,
                        false,
                    ),
                };
                index.map(|i| list[i].clone())
            };

            if let Some(credential) = matched {
                debug!(operation = %operation.id, account = %operation.account, "Replaying operation with new credential");
                operations.authenticate(operation.id, &credential);
                replayed += 1;
            }
        }
        replayed
    }

    /// Remove the credential matching `identity`; returns whether one was removed
    pub fn remove(&self, identity: &CredentialIdentity) -> bool {
        let removed = {
            let mut list = self.credentials.borrow_mut();
            let index = find_index(
                &list,
                identity.realm.as_deref(),
                identity.username.as_deref(),
                identity.domain.as_deref(),
                None,
                true,
            )
            .or_else(|| list.iter().position(|c| c.identity() == *identity));
            index.map(|i| list.remove(i)).is_some()
        };
        if removed {
            info!(identity = %identity, "Removed credential");
            self.write_all();
        }
        removed
    }

    /// Drop every credential and its persisted section
    pub fn clear(&self) {
        let count = {
            let mut list = self.credentials.borrow_mut();
            let count = list.len();
            list.clear();
            count
        };
        let mut config = self.config.borrow_mut();
        for index in 0..count {
            config.clean_section(&section_name(index));
        }
        debug!(count, "Cleared credentials");
    }

    /// Persist every credential, then clean the following section to mark the end
    pub fn write_all(&self) {
        let mut config = self.config.borrow_mut();
        let policy = AuthPolicy::from_config(&config);
        let mut list = self.credentials.borrow_mut();
        for (index, credential) in list.iter_mut().enumerate() {
            credential.write_config(&mut config, index, &policy);
        }
        config.clean_section(&section_name(list.len()));
    }

    fn write_at(&self, index: usize) {
        let mut config = self.config.borrow_mut();
        let policy = AuthPolicy::from_config(&config);
        if let Some(credential) = self.credentials.borrow_mut().get_mut(index) {
            credential.write_config(&mut config, index, &policy);
        }
    }

    fn fill_digest(&self, challenge: &mut AuthChallenge) -> FillOutcome {
        let identity = challenge.identity();
        let index = {
            let list = self.credentials.borrow();
            find_index(
                &list,
                challenge.realm.as_deref(),
                challenge.username.as_deref(),
                challenge.domain.as_deref(),
                challenge.algorithm,
                false,
            )
        };

        let Some(index) = index else {
            debug!(identity = %identity, algorithm = ?challenge.algorithm, "No credential for digest challenge");
            self.coordinator
                .request_credential(CredentialRequest::digest(identity, challenge.algorithm));
            return FillOutcome::Pending;
        };

        let adopt_realm = {
            let mut list = self.credentials.borrow_mut();
            let credential = &mut list[index];
            challenge.answer = Some(ChallengeAnswer::from_credential(credential));

            // A realm learnt from the server lets the digest be computed and the password dropped
            let adopt = challenge.realm.is_some()
                && (credential.realm().is_none() || credential.explicit_algorithm().is_none());
            if adopt {
                credential.set_realm(challenge.realm.as_deref());
                if challenge.algorithm.is_some() {
                    credential.set_digest_algorithm(challenge.algorithm);
                }
            }
            adopt
        };
        if adopt_realm {
            self.write_at(index);
        }

        self.coordinator.record_found(identity);
        FillOutcome::Done
    }

    fn fill_bearer(&self, challenge: &mut AuthChallenge) -> FillOutcome {
        let identity = challenge.identity();
        let credential = {
            let list = self.credentials.borrow();
            find_bearer_index(&list, challenge.realm.as_deref(), challenge.username.as_deref()).map(|i| list[i].clone())
        };

        if let Some(credential) = credential {
            if let Some(token) = credential.access_token() {
                if !token.is_expired() {
                    challenge.answer = Some(ChallengeAnswer {
                        bearer_token: Some(token.clone()),
                        ..Default::default()
                    });
                    self.coordinator.record_found(identity);
                    return FillOutcome::Done;
                }
                if credential.can_refresh_token() {
                    debug!(identity = %identity, "Access token expired, waiting for refresh");
                    return FillOutcome::Pending;
                }
            }
        }

        debug!(identity = %identity, "No usable access token for bearer challenge");
        self.coordinator
            .request_credential(CredentialRequest::bearer(identity, challenge.authz_server.clone()));
        FillOutcome::Pending
    }

    fn fill_tls(&self, challenge: &mut AuthChallenge) -> FillOutcome {
        let credential = self
            .find_tls(challenge.username.as_deref(), challenge.domain.as_deref())
            .or_else(|| self.find_any_tls());
        match credential {
            Some(credential) => {
                challenge.answer = Some(ChallengeAnswer::from_credential(&credential));
                FillOutcome::Done
            }
            None => FillOutcome::NoAuth,
        }
    }
}

impl CredentialProvider for CredentialStore {
    fn fill_auth_challenge(
        &self,
        challenge: &mut AuthChallenge,
        hint_username: Option<&str>,
        hint_domain: Option<&str>,
    ) -> FillOutcome {
        if let Some(username) = hint_username.filter(|u| !u.is_empty()) {
            challenge.username = Some(username.to_string());
        }
        if let Some(domain) = hint_domain.filter(|d| !d.is_empty()) {
            challenge.domain = Some(domain.to_string());
        }

        match challenge.mode {
            AuthMode::Digest => self.fill_digest(challenge),
            AuthMode::Bearer => self.fill_bearer(challenge),
            AuthMode::Tls => self.fill_tls(challenge),
        }
    }

    fn find_refreshable_token(&self, challenge: &AuthChallenge) -> Option<Credential> {
        let list = self.credentials.borrow();
        let index = find_bearer_index(&list, challenge.realm.as_deref(), challenge.username.as_deref())?;
        let credential = &list[index];
        let expired = credential
            .access_token()
            .is_some_and(|token| token.expiration() != 0 && token.expiration() <= Utc::now().timestamp());
        (expired && credential.can_refresh_token()).then(|| credential.clone())
    }

    fn update_credential(&self, credential: Credential) -> Result<usize> {
        self.add(credential)
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("credentials", &self.credentials.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bearer::BearerToken;
    use crate::events::AuthListener;
    use sipauth_infra_common::MainLoop;

    #[derive(Default)]
    struct Prompts(RefCell<Vec<CredentialRequest>>);

    impl AuthListener for Prompts {
        fn on_credential_requested(&self, request: &CredentialRequest) {
            self.0.borrow_mut().push(request.clone());
        }

        fn on_registration_failed(&self, _account: &str, _error_detail: &str) {}
    }

    fn setup() -> (Rc<MainLoop>, Rc<Prompts>, Rc<RefCell<ConfigStore>>, Rc<CredentialStore>) {
        let main_loop = MainLoop::new();
        let prompts = Rc::new(Prompts::default());
        let coordinator = AuthChallengeCoordinator::new(main_loop.clone(), prompts.clone(), None);
        let config = Rc::new(RefCell::new(ConfigStore::new()));
        let store = CredentialStore::new(config.clone(), coordinator, None);
        (main_loop, prompts, config, store)
    }

    fn alice() -> Credential {
        Credential::new("alice")
            .with_password("secret")
            .with_realm("sip.example.com")
            .with_domain("example.com")
    }

    #[test]
    fn test_algorithm_compatibility() {
        let password_only = Credential::new("a").with_password("p");
        assert!(algorithm_compatible(&password_only, Some(DigestAlgorithm::Sha256)));

        let bare_ha1 = Credential::new("a").with_ha1("0123456789abcdef0123456789abcdef");
        assert!(algorithm_compatible(&bare_ha1, Some(DigestAlgorithm::Md5)));
        assert!(!algorithm_compatible(&bare_ha1, Some(DigestAlgorithm::Sha256)));

        let sha = Credential::new("a").with_password("p").with_algorithm(DigestAlgorithm::Sha256);
        assert!(!algorithm_compatible(&sha, Some(DigestAlgorithm::Md5)));
        assert!(algorithm_compatible(&sha, None));
    }

    #[test]
    fn test_find_ignores_realm_quotes() {
        let (_, _, _, store) = setup();
        store.add(alice()).unwrap();

        let found = store.find(Some("\"sip.example.com\""), Some("alice"), None);
        assert_eq!(found.and_then(|c| c.username().map(str::to_string)), Some("alice".to_string()));
        assert!(store.find(Some("other.realm"), Some("bob"), None).is_none());
    }

    #[test]
    fn test_ambiguous_realm_yields_none() {
        let list = vec![
            alice(),
            Credential::new("alice")
                .with_password("other")
                .with_realm("sip.example.com")
                .with_domain("example.org"),
        ];
        assert_eq!(find_once(&list, Some("alice"), Some("sip.example.com"), None, None, false), None);
        // Narrowing by domain resolves it
        assert_eq!(
            find_index(&list, Some("sip.example.com"), Some("alice"), Some("example.org"), None, false),
            Some(1)
        );
    }

    #[test]
    fn test_domain_fallback_requires_no_digest() {
        let list = vec![Credential::new("bob")
            .with_ha1("0123456789abcdef0123456789abcdef")
            .with_domain("example.com")];
        assert_eq!(find_index(&list, Some("unknown"), Some("bob"), Some("example.com"), None, false), None);
        assert_eq!(find_index(&list, Some("unknown"), Some("bob"), Some("example.com"), None, true), Some(0));
    }

    #[test]
    fn test_add_rejects_empty_credential() {
        let (_, _, _, store) = setup();
        assert!(matches!(
            store.add(Credential::new("alice").with_realm("r")),
            Err(AuthError::InvalidCredential(_))
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_replaces_same_account() {
        let (_, _, config, store) = setup();
        store.add(alice()).unwrap();
        store.add(alice().with_password("changed")).unwrap();

        assert_eq!(store.len(), 1);
        let config = config.borrow();
        assert!(config.has_section("auth_info_0"));
        assert!(!config.has_section("auth_info_1"));
        assert_eq!(
            config.get_string("auth_info_0", "ha1"),
            Some(crate::digest::compute_ha1("alice", "sip.example.com", "changed", DigestAlgorithm::Md5).as_str())
        );
    }

    #[test]
    fn test_remove_and_clear() {
        let (_, _, config, store) = setup();
        store.add(alice()).unwrap();
        store
            .add(Credential::new("bob").with_password("pw").with_realm("sip.example.com").with_domain("example.com"))
            .unwrap();
        assert_eq!(store.len(), 2);

        assert!(store.remove(&alice().identity()));
        assert_eq!(store.len(), 1);
        assert_eq!(config.borrow().get_string("auth_info_0", "username"), Some("bob"));
        assert!(!config.borrow().has_section("auth_info_1"));

        store.clear();
        assert!(store.is_empty());
        assert!(!config.borrow().has_section("auth_info_0"));
    }

    #[test]
    fn test_digest_fill_adopts_realm() {
        let (main_loop, prompts, config, store) = setup();
        store.add(Credential::new("carol").with_password("pw")).unwrap();

        let mut challenge = AuthChallenge::digest("sip.example.net").with_algorithm(DigestAlgorithm::Sha256);
        let outcome = store.fill_auth_challenge(&mut challenge, Some("carol"), None);

        assert_eq!(outcome, FillOutcome::Done);
        let answer = challenge.answer.unwrap();
        assert_eq!(answer.userid.as_deref(), Some("carol"));
        assert_eq!(answer.password.as_deref(), Some("pw"));

        let config = config.borrow();
        assert_eq!(config.get_string("auth_info_0", "realm"), Some("sip.example.net"));
        assert_eq!(config.get_string("auth_info_0", "ha1").map(str::len), Some(64));

        main_loop.iterate();
        assert!(prompts.0.borrow().is_empty());
    }

    #[test]
    fn test_digest_fill_pending_requests_credential() {
        let (main_loop, prompts, _, store) = setup();
        let mut challenge = AuthChallenge::digest("sip.example.com").with_username("dave");

        assert_eq!(store.fill_auth_challenge(&mut challenge, None, None), FillOutcome::Pending);
        assert!(!challenge.is_answered());

        main_loop.iterate();
        let prompts = prompts.0.borrow();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].method, AuthMethod::HttpDigest);
        assert_eq!(prompts[0].identity.username.as_deref(), Some("dave"));
    }

    #[test]
    fn test_bearer_fill() {
        let (main_loop, prompts, _, store) = setup();
        let now = Utc::now().timestamp();
        store
            .add(Credential::bearer(BearerToken::new("valid", now + 3600), "sip.example.org"))
            .unwrap();
        store
            .add(
                Credential::bearer(BearerToken::new("stale", now - 10), "expired.example.org")
                    .with_refresh_token(BearerToken::new("refresh", 0))
                    .with_token_endpoint("https://auth.example.org/token"),
            )
            .unwrap();

        let mut challenge = AuthChallenge::bearer("sip.example.org");
        assert_eq!(store.fill_auth_challenge(&mut challenge, None, None), FillOutcome::Done);
        assert_eq!(challenge.answer.unwrap().bearer_token.unwrap().token(), "valid");

        let mut expired = AuthChallenge::bearer("expired.example.org");
        assert_eq!(store.fill_auth_challenge(&mut expired, None, None), FillOutcome::Pending);
        assert!(store.find_refreshable_token(&expired).is_some());

        let mut unknown = AuthChallenge::bearer("nowhere.example.org").with_authz_server("https://auth.example.org");
        assert_eq!(store.fill_auth_challenge(&mut unknown, None, None), FillOutcome::Pending);

        main_loop.iterate();
        let prompts = prompts.0.borrow();
        assert_eq!(prompts.len(), 1, "only the unknown realm prompts");
        assert_eq!(prompts[0].method, AuthMethod::Bearer);
        assert_eq!(prompts[0].authz_server.as_deref(), Some("https://auth.example.org"));
    }

    #[test]
    fn test_tls_fill() {
        let (_, _, _, store) = setup();
        let mut challenge = AuthChallenge::tls();
        assert_eq!(store.fill_auth_challenge(&mut challenge, None, None), FillOutcome::NoAuth);

        store
            .add(Credential::new("erin").with_domain("example.com").with_tls_files("/c.pem", "/k.pem"))
            .unwrap();
        assert_eq!(
            store.fill_auth_challenge(&mut challenge, Some("erin"), Some("example.com")),
            FillOutcome::Done
        );
        assert_eq!(challenge.answer.unwrap().tls_key_path.as_deref(), Some("/k.pem"));
    }

    #[test]
    fn test_load_skips_unreadable_sections() {
        let (_, _, config, store) = setup();
        {
            let mut config = config.borrow_mut();
            config.set_string("auth_info_0", "username", "alice");
            config.set_string("auth_info_0", "passwd", "secret");
            config.set_string("auth_info_1", "username", "broken");
            config.set_string("auth_info_1", "algorithm", "SHA-1");
            config.set_string("auth_info_2", "username", "carol");
            config.set_string("auth_info_2", "ha1", "0123456789abcdef0123456789abcdef");
            config.set_string("auth_info_4", "username", "unreachable");
        }
        assert_eq!(store.load_from_config(), 2);
        let usernames: Vec<_> = store
            .credentials()
            .iter()
            .filter_map(|c| c.username().map(str::to_string))
            .collect();
        assert_eq!(usernames, vec!["alice", "carol"]);
    }
}
