//! Credential persistence policy read from the `[sip]` section

use sipauth_infra_common::ConfigStore;

/// Section holding the stack-wide SIP settings
pub const SIP_SECTION: &str = "sip";

/// How credentials are written to the persisted configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthPolicy {
    /// Persist credentials at all (`store_auth_info`)
    pub store_auth_info: bool,
    /// Compute and store the digest when a password is known (`store_ha1_passwd`)
    pub store_ha1: bool,
    /// Drop the cleartext password once a digest is available (`drop_cleartext_passwd`)
    pub drop_cleartext_password: bool,
}

impl Default for AuthPolicy {
    fn default() -> Self {
        Self {
            store_auth_info: true,
            store_ha1: true,
            drop_cleartext_password: true,
        }
    }
}

impl AuthPolicy {
    /// Read the policy; `drop_cleartext_passwd` follows `store_ha1_passwd` unless set
    pub fn from_config(config: &ConfigStore) -> Self {
        let store_ha1 = config.get_bool(SIP_SECTION, "store_ha1_passwd", true);
        Self {
            store_auth_info: config.get_bool(SIP_SECTION, "store_auth_info", true),
            store_ha1,
            drop_cleartext_password: config.get_bool(SIP_SECTION, "drop_cleartext_passwd", store_ha1),
        }
    }

    /// Keep cleartext passwords alongside their digest
    pub fn keeping_passwords(mut self) -> Self {
        self.drop_cleartext_password = false;
        self
    }
}
