//! Persistent configuration shared by the stack
//!
//! Settings are grouped into named sections (`[sip]`, `[auth_info_0]`, ...)
//! of string entries, see [`ConfigStore`].

pub mod store;

pub use store::{ConfigStore, Section};
