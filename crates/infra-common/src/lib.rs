//! # Infra-Common
//!
//! Infrastructure shared by the sipauth crates:
//!
//! - [`logging`]: `tracing-subscriber` bootstrap
//! - [`config`]: sectioned key/value configuration with TOML persistence
//! - [`main_loop`]: the single-threaded timer queue the host application pumps
//! - [`errors`]: the common error type

pub mod config;
pub mod errors;
pub mod logging;
pub mod main_loop;

pub use config::ConfigStore;
pub use errors::{Error, Result};
pub use logging::{setup_logging, LoggingConfig};
pub use main_loop::{MainLoop, Scheduler, TimerCallback, TimerId};
