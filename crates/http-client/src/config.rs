//! Client settings read from the `[sip]` section

use serde::{Deserialize, Serialize};
use sipauth_core::SIP_SECTION;
use sipauth_infra_common::ConfigStore;

/// Server certificate verification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsCryptoConfig {
    /// Path of a PEM file of trusted root certificates
    pub root_ca_path: Option<String>,
    /// Inline PEM of trusted root certificates
    pub root_ca: Option<String>,
    /// Skip server certificate verification
    pub verify_disabled: bool,
}

impl TlsCryptoConfig {
    pub fn from_config(config: &ConfigStore) -> Self {
        Self {
            root_ca_path: config.get_string(SIP_SECTION, "root_ca").map(str::to_string),
            root_ca: config.get_string(SIP_SECTION, "root_ca_data").map(str::to_string),
            verify_disabled: !config.get_bool(SIP_SECTION, "verify_server_certs", true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpClientConfig {
    /// Resolve and connect over IPv6 as well as IPv4
    pub use_ipv6: bool,
    /// Refuse to execute requests not using `https`
    pub https_only: bool,
    pub user_agent: String,
    pub tls: TlsCryptoConfig,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            use_ipv6: true,
            https_only: false,
            user_agent: default_user_agent(),
            tls: TlsCryptoConfig::default(),
        }
    }
}

fn default_user_agent() -> String {
    format!("sipauth/{}", env!("CARGO_PKG_VERSION"))
}

impl HttpClientConfig {
    pub fn from_config(config: &ConfigStore) -> Self {
        Self {
            use_ipv6: config.get_bool(SIP_SECTION, "use_ipv6", true),
            https_only: config.get_bool(SIP_SECTION, "https_only", false),
            user_agent: config
                .get_string(SIP_SECTION, "user_agent")
                .map(str::to_string)
                .unwrap_or_else(default_user_agent),
            tls: TlsCryptoConfig::from_config(config),
        }
    }

    pub fn with_ipv6(mut self, enabled: bool) -> Self {
        self.use_ipv6 = enabled;
        self
    }

    pub fn with_https_only(mut self, enabled: bool) -> Self {
        self.https_only = enabled;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_tls(mut self, tls: TlsCryptoConfig) -> Self {
        self.tls = tls;
        self
    }
}
