//! Centralized error type for the outboard umbrella crate.
//!
//! Wraps the bridge errors so `?` propagates naturally from host code.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Plugin: {0}")]
    Plugin(#[from] outboard_plugin::BridgeError),

    #[error("Plugin call failed: {0}")]
    Call(#[from] outboard_plugin::ResultCode),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
