//! # Credentials
//!
//! A [`Credential`] is one authentication profile of the application: digest
//! material (username, userid, password and/or precomputed `ha1`), a TLS client
//! certificate, and OAuth bearer tokens.
//!
//! Credentials are identified by `(realm, username, domain)` through
//! [`CredentialIdentity`]. The same domain may hold several credentials for
//! different realms. Operations waiting for authentication keep a copy of the
//! identity, never a reference to the credential itself.
//!
//! ## Persistence
//!
//! Each credential is written to its own `[auth_info_<N>]` section:
//!
//! ```text
//! [auth_info_0]
//! username = "alice"
//! ha1 = "..."
//! realm = "sip.example.com"
//! domain = "example.com"
//! algorithm = "SHA-256"
//! ```
//!
//! ```rust
//! use sipauth_core::{AuthPolicy, Credential, DigestAlgorithm};
//! use sipauth_infra_common::ConfigStore;
//!
//! let mut credential = Credential::new("alice")
//!     .with_password("secret")
//!     .with_realm("sip.example.com")
//!     .with_algorithm(DigestAlgorithm::Sha256);
//!
//! let mut config = ConfigStore::new();
//! credential.write_config(&mut config, 0, &AuthPolicy::default());
//!
//! assert_eq!(config.get_string("auth_info_0", "ha1").map(str::len), Some(64));
//! assert_eq!(config.get_string("auth_info_0", "passwd"), None);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use sipauth_infra_common::ConfigStore;
use tracing::{debug, warn};

use crate::bearer::BearerToken;
use crate::digest::{compute_ha1, DigestAlgorithm};
use crate::error::{AuthError, Result};
use crate::policy::AuthPolicy;

/// Prefix of the persisted credential sections
pub const AUTH_INFO_SECTION_PREFIX: &str = "auth_info_";

/// Name of the section holding the credential at `index`
pub fn section_name(index: usize) -> String {
    format!("{}{}", AUTH_INFO_SECTION_PREFIX, index)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Strip a leading double quote and anything from the next one
pub(crate) fn unquote(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    match value.find('"') {
        Some(end) => &value[..end],
        None => value,
    }
}

/// Realms are equal, ignoring surrounding double quotes
pub(crate) fn realm_match(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b || unquote(a) == unquote(b),
        _ => false,
    }
}

/// The `(realm, username, domain)` key used to match challenges to credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialIdentity {
    pub username: Option<String>,
    pub realm: Option<String>,
    pub domain: Option<String>,
}

impl CredentialIdentity {
    pub fn new(username: Option<&str>, realm: Option<&str>, domain: Option<&str>) -> Self {
        Self {
            username: non_empty(username),
            realm: non_empty(realm),
            domain: non_empty(domain),
        }
    }

    /// Same username and domain, realms equal up to quoting
    pub fn matches(&self, other: &CredentialIdentity) -> bool {
        self.username == other.username
            && self.domain == other.domain
            && realm_match(self.realm.as_deref(), other.realm.as_deref())
    }
}

impl fmt::Display for CredentialIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "username[{}] realm[{}] domain[{}]",
            self.username.as_deref().unwrap_or(""),
            self.realm.as_deref().unwrap_or(""),
            self.domain.as_deref().unwrap_or("")
        )
    }
}

/// An authentication profile
///
/// Cloning is a deep copy, tokens included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credential {
    username: Option<String>,
    userid: Option<String>,
    password: Option<String>,
    ha1: Option<String>,
    realm: Option<String>,
    domain: Option<String>,
    algorithm: Option<DigestAlgorithm>,
    available_algorithms: Vec<DigestAlgorithm>,
    need_to_renew_ha1: bool,
    tls_cert: Option<String>,
    tls_key: Option<String>,
    tls_cert_path: Option<String>,
    tls_key_path: Option<String>,
    tls_key_password: Option<String>,
    access_token: Option<BearerToken>,
    refresh_token: Option<BearerToken>,
    authorization_server: Option<String>,
    token_endpoint: Option<String>,
    client_id: Option<String>,
    expires: Option<i64>,
}

impl Credential {
    /// Create a credential for `username`
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: non_empty(Some(&username.into())),
            ..Default::default()
        }
    }

    /// Create a bearer credential for a realm, without username
    pub fn bearer(access_token: BearerToken, realm: impl Into<String>) -> Self {
        Self::default()
            .with_access_token(access_token)
            .with_realm(realm)
    }

    /// Build a credential from an `[auth_info_<N>]` section
    pub fn from_config(config: &ConfigStore, section: &str) -> Result<Self> {
        let get = |key: &str| non_empty(config.get_string(section, key));

        let algorithm = match config.get_string(section, "algorithm") {
            Some(value) if !value.trim().is_empty() => Some(value.parse::<DigestAlgorithm>()?),
            _ => None,
        };

        let mut credential = Credential {
            username: get("username"),
            userid: get("userid"),
            password: get("passwd"),
            ha1: get("ha1"),
            realm: get("realm"),
            domain: get("domain"),
            algorithm,
            tls_cert_path: get("client_cert_chain"),
            tls_key_path: get("client_cert_key"),
            authorization_server: get("authz_server"),
            token_endpoint: get("token_endpoint"),
            client_id: get("client_id"),
            ..Default::default()
        };

        if credential.ha1.is_some() && credential.algorithm.is_none() {
            // A digest without algorithm predates SHA-256 support
            credential.algorithm = Some(DigestAlgorithm::Md5);
        }
        if let Some(alg) = credential.algorithm {
            credential.add_available_algorithm(alg);
        }
        for name in config.get_string_list(section, "available_algorithms").unwrap_or_default() {
            match name.parse::<DigestAlgorithm>() {
                Ok(alg) => credential.add_available_algorithm(alg),
                Err(e) => warn!(section, "Ignoring available algorithm: {}", e),
            }
        }
        if let Some(value) = get("access_token") {
            credential.access_token = Some(value.parse()?);
        }
        if let Some(value) = get("refresh_token") {
            credential.refresh_token = Some(value.parse()?);
        }
        if let Some(value) = get("expires") {
            credential.expires = Some(value.parse().map_err(|_| {
                AuthError::InvalidCredential(format!("invalid expires '{}' in [{}]", value, section))
            })?);
        }
        Ok(credential)
    }

    pub fn with_userid(mut self, userid: impl Into<String>) -> Self {
        self.userid = non_empty(Some(&userid.into()));
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = non_empty(Some(&password.into()));
        self
    }

    /// Set a precomputed digest; without an explicit algorithm it is taken as MD5
    pub fn with_ha1(mut self, ha1: impl Into<String>) -> Self {
        self.ha1 = non_empty(Some(&ha1.into()));
        if self.ha1.is_some() && self.algorithm.is_none() {
            self.algorithm = Some(DigestAlgorithm::Md5);
            self.add_available_algorithm(DigestAlgorithm::Md5);
        }
        self
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = non_empty(Some(&realm.into()));
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = non_empty(Some(&domain.into()));
        self
    }

    pub fn with_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self.add_available_algorithm(algorithm);
        self
    }

    pub fn with_available_algorithms(mut self, algorithms: &[DigestAlgorithm]) -> Self {
        self.set_available_algorithms(algorithms);
        self
    }

    /// TLS client certificate chain and key given as file paths
    pub fn with_tls_files(mut self, cert_path: impl Into<String>, key_path: impl Into<String>) -> Self {
        self.tls_cert_path = non_empty(Some(&cert_path.into()));
        self.tls_key_path = non_empty(Some(&key_path.into()));
        self
    }

    /// TLS client certificate chain and key given as inline PEM
    pub fn with_tls_pem(mut self, cert: impl Into<String>, key: impl Into<String>) -> Self {
        self.tls_cert = non_empty(Some(&cert.into()));
        self.tls_key = non_empty(Some(&key.into()));
        self
    }

    pub fn with_access_token(mut self, token: BearerToken) -> Self {
        self.access_token = Some(token);
        self
    }

    pub fn with_refresh_token(mut self, token: BearerToken) -> Self {
        self.refresh_token = Some(token);
        self
    }

    pub fn with_token_endpoint(mut self, uri: impl Into<String>) -> Self {
        self.token_endpoint = non_empty(Some(&uri.into()));
        self
    }

    pub fn with_authorization_server(mut self, uri: impl Into<String>) -> Self {
        self.authorization_server = non_empty(Some(&uri.into()));
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = non_empty(Some(&client_id.into()));
        self
    }

    // Accessors

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn userid(&self) -> Option<&str> {
        self.userid.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn ha1(&self) -> Option<&str> {
        self.ha1.as_deref()
    }

    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Algorithm in effect; MD5 when none was chosen
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm.unwrap_or_default()
    }

    /// Algorithm explicitly chosen, if any
    pub fn explicit_algorithm(&self) -> Option<DigestAlgorithm> {
        self.algorithm
    }

    pub fn available_algorithms(&self) -> &[DigestAlgorithm] {
        &self.available_algorithms
    }

    pub fn need_to_renew_ha1(&self) -> bool {
        self.need_to_renew_ha1
    }

    pub fn tls_cert(&self) -> Option<&str> {
        self.tls_cert.as_deref()
    }

    pub fn tls_key(&self) -> Option<&str> {
        self.tls_key.as_deref()
    }

    pub fn tls_cert_path(&self) -> Option<&str> {
        self.tls_cert_path.as_deref()
    }

    pub fn tls_key_path(&self) -> Option<&str> {
        self.tls_key_path.as_deref()
    }

    pub fn tls_key_password(&self) -> Option<&str> {
        self.tls_key_password.as_deref()
    }

    pub fn access_token(&self) -> Option<&BearerToken> {
        self.access_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&BearerToken> {
        self.refresh_token.as_ref()
    }

    pub fn authorization_server(&self) -> Option<&str> {
        self.authorization_server.as_deref()
    }

    pub fn token_endpoint(&self) -> Option<&str> {
        self.token_endpoint.as_deref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn expires(&self) -> Option<i64> {
        self.expires
    }

    // Mutators

    pub fn set_username(&mut self, username: Option<&str>) {
        let username = non_empty(username);
        if username.is_some() && username != self.username && self.ha1.is_some() {
            self.need_to_renew_ha1 = true;
        }
        self.username = username;
    }

    pub fn set_userid(&mut self, userid: Option<&str>) {
        let userid = non_empty(userid);
        if userid.is_some() && userid != self.userid && self.ha1.is_some() {
            self.need_to_renew_ha1 = true;
        }
        self.userid = userid;
    }

    pub fn set_password(&mut self, password: Option<&str>) {
        let password = non_empty(password);
        if password.is_some() && password != self.password && self.ha1.is_some() {
            self.need_to_renew_ha1 = true;
        }
        self.password = password;
    }

    pub fn set_ha1(&mut self, ha1: Option<&str>) {
        self.ha1 = non_empty(ha1);
        if self.ha1.is_some() {
            self.need_to_renew_ha1 = false;
        }
    }

    pub fn set_realm(&mut self, realm: Option<&str>) {
        let realm = non_empty(realm);
        if realm.is_some() && realm != self.realm && self.ha1.is_some() {
            self.need_to_renew_ha1 = true;
        }
        self.realm = realm;
    }

    pub fn set_domain(&mut self, domain: Option<&str>) {
        self.domain = non_empty(domain);
    }

    /// Select the digest algorithm by name.
    ///
    /// An empty name clears the choice (MD5 applies). An unknown name is
    /// rejected and leaves the credential untouched.
    pub fn set_algorithm(&mut self, algorithm: &str) -> Result<()> {
        let algorithm = if algorithm.trim().is_empty() {
            None
        } else {
            Some(algorithm.parse::<DigestAlgorithm>()?)
        };
        self.set_digest_algorithm(algorithm);
        Ok(())
    }

    pub fn set_digest_algorithm(&mut self, algorithm: Option<DigestAlgorithm>) {
        if algorithm.is_some() && algorithm != self.algorithm && self.ha1.is_some() {
            self.need_to_renew_ha1 = true;
        }
        self.algorithm = algorithm;
        if let Some(alg) = algorithm {
            self.add_available_algorithm(alg);
        }
    }

    pub fn add_available_algorithm(&mut self, algorithm: DigestAlgorithm) {
        if !self.available_algorithms.contains(&algorithm) {
            self.available_algorithms.push(algorithm);
        }
    }

    pub fn set_available_algorithms(&mut self, algorithms: &[DigestAlgorithm]) {
        self.available_algorithms.clear();
        for alg in algorithms {
            self.add_available_algorithm(*alg);
        }
    }

    pub fn clear_available_algorithms(&mut self) {
        self.available_algorithms.clear();
    }

    pub fn set_tls_cert(&mut self, cert: Option<&str>) {
        self.tls_cert = non_empty(cert);
    }

    pub fn set_tls_key(&mut self, key: Option<&str>) {
        self.tls_key = non_empty(key);
    }

    pub fn set_tls_cert_path(&mut self, path: Option<&str>) {
        self.tls_cert_path = non_empty(path);
    }

    pub fn set_tls_key_path(&mut self, path: Option<&str>) {
        self.tls_key_path = non_empty(path);
    }

    pub fn set_tls_key_password(&mut self, password: Option<&str>) {
        self.tls_key_password = non_empty(password);
    }

    pub fn set_access_token(&mut self, token: Option<BearerToken>) {
        self.access_token = token;
    }

    pub fn set_refresh_token(&mut self, token: Option<BearerToken>) {
        self.refresh_token = token;
    }

    pub fn set_authorization_server(&mut self, uri: Option<&str>) {
        self.authorization_server = non_empty(uri);
    }

    pub fn set_token_endpoint(&mut self, uri: Option<&str>) {
        self.token_endpoint = non_empty(uri);
    }

    pub fn set_client_id(&mut self, client_id: Option<&str>) {
        self.client_id = non_empty(client_id);
    }

    pub fn set_expires(&mut self, expires: Option<i64>) {
        self.expires = expires;
    }

    // Queries

    pub fn identity(&self) -> CredentialIdentity {
        CredentialIdentity {
            username: self.username.clone(),
            realm: self.realm.clone(),
            domain: self.domain.clone(),
        }
    }

    /// Same account, ignoring the digest algorithms
    pub fn is_equal_but_algorithms(&self, other: &Credential) -> bool {
        self.username == other.username
            && self.userid == other.userid
            && self.realm == other.realm
            && self.domain == other.domain
    }

    /// Certificate chain and key, both inline or both as paths
    pub fn has_tls_material(&self) -> bool {
        (self.tls_cert.is_some() && self.tls_key.is_some())
            || (self.tls_cert_path.is_some() && self.tls_key_path.is_some())
    }

    /// Whether the credential carries anything usable to authenticate
    pub fn has_secret(&self) -> bool {
        self.password.is_some()
            || self.ha1.is_some()
            || self.tls_key.is_some()
            || self.tls_key_path.is_some()
            || self.access_token.is_some()
    }

    /// Refresh token and token endpoint are both known
    pub fn can_refresh_token(&self) -> bool {
        self.refresh_token.is_some() && self.token_endpoint.is_some()
    }

    /// Compute the digest if needed and persist into `[auth_info_<index>]`.
    ///
    /// The section is always cleaned first. Nothing is written when the
    /// policy disables credential storage. When the policy stores digests
    /// and a realm, a password and a username or userid are known, the
    /// digest is (re)computed with the algorithm in effect. Once a digest is
    /// present, the cleartext password is dropped if the policy says so.
    pub fn write_config(&mut self, config: &mut ConfigStore, index: usize, policy: &AuthPolicy) {
        let section = section_name(index);
        config.clean_section(&section);

        if !policy.store_auth_info {
            return;
        }

        if policy.store_ha1 && (self.need_to_renew_ha1 || self.ha1.is_none()) {
            let id = self.userid.as_deref().or(self.username.as_deref());
            if let (Some(id), Some(realm), Some(password)) = (id, self.realm.as_deref(), self.password.as_deref()) {
                let ha1 = compute_ha1(id, realm, password, self.algorithm());
                debug!(section = %section, algorithm = %self.algorithm(), "Computed digest for credential");
                self.set_ha1(Some(&ha1));
            }
        }

        if self.ha1.is_some() && self.algorithm.is_none() {
            let algorithm = self.algorithm();
            self.algorithm = Some(algorithm);
            self.add_available_algorithm(algorithm);
        }

        if policy.drop_cleartext_password && self.ha1.is_some() {
            self.password = None;
        }

        let mut put = |key: &str, value: Option<&str>| {
            if let Some(value) = value {
                config.set_string(&section, key, value);
            }
        };
        put("username", self.username.as_deref());
        put("userid", self.userid.as_deref());
        put("ha1", self.ha1.as_deref());
        put("passwd", self.password.as_deref());
        put("realm", self.realm.as_deref());
        put("domain", self.domain.as_deref());
        put("client_cert_chain", self.tls_cert_path.as_deref());
        put("client_cert_key", self.tls_key_path.as_deref());
        put("algorithm", self.algorithm.map(|a| a.as_str()));
        put("authz_server", self.authorization_server.as_deref());
        put("token_endpoint", self.token_endpoint.as_deref());
        put("client_id", self.client_id.as_deref());

        if let Some(token) = &self.access_token {
            config.set_string(&section, "access_token", token.to_config_string());
        }
        if let Some(token) = &self.refresh_token {
            config.set_string(&section, "refresh_token", token.to_config_string());
        }
        if let Some(expires) = self.expires {
            config.set_int(&section, "expires", expires);
        }
        if !self.available_algorithms.is_empty() {
            let names: Vec<&str> = self.available_algorithms.iter().map(|a| a.as_str()).collect();
            config.set_string_list(&section, "available_algorithms", &names);
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Username[{}];", self.username.as_deref().unwrap_or(""))?;
        write!(f, "Userid[{}];", self.userid.as_deref().unwrap_or(""))?;
        write!(f, "Realm[{}];", self.realm.as_deref().unwrap_or(""))?;
        write!(f, "Domain[{}];", self.domain.as_deref().unwrap_or(""))?;
        write!(f, "Algorithm[{}];", self.algorithm.map(|a| a.as_str()).unwrap_or(""))?;
        let available: Vec<&str> = self.available_algorithms.iter().map(|a| a.as_str()).collect();
        write!(f, "AvailableAlgorithms[{}];", available.join(","))
    }
}
