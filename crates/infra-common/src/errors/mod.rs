//! Error types shared by the sipauth crates

pub mod types;

pub use types::{Error, Result};
