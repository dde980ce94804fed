//! Error types for the plugin bridge

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Opening,
    Factory,
    Instantiation,
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadStage::Opening => write!(f, "opening library"),
            LoadStage::Factory => write!(f, "getting factory"),
            LoadStage::Instantiation => write!(f, "creating instance"),
        }
    }
}

/// Failure reported by a component call.
///
/// Raw values follow the result codes common to binary plugin ABIs, so a
/// binding can map its native return value with [`ResultCode::from_raw`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    #[error("call returned false")]
    False,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("not implemented")]
    NotImplemented,
    #[error("internal error")]
    InternalError,
    #[error("not initialized")]
    NotInitialized,
    #[error("out of memory")]
    OutOfMemory,
}

impl ResultCode {
    pub fn as_raw(self) -> i32 {
        match self {
            ResultCode::False => 1,
            ResultCode::InvalidArgument => 2,
            ResultCode::NotImplemented => 3,
            ResultCode::InternalError => 4,
            ResultCode::NotInitialized => 5,
            ResultCode::OutOfMemory => 6,
        }
    }

    /// `0` is success; unknown codes collapse to `InternalError`.
    pub fn from_raw(code: i32) -> std::result::Result<(), ResultCode> {
        match code {
            0 => Ok(()),
            1 => Err(ResultCode::False),
            2 => Err(ResultCode::InvalidArgument),
            3 => Err(ResultCode::NotImplemented),
            5 => Err(ResultCode::NotInitialized),
            6 => Err(ResultCode::OutOfMemory),
            _ => Err(ResultCode::InternalError),
        }
    }
}

/// Result of a call into the loaded component.
pub type CallResult<T = ()> = std::result::Result<T, ResultCode>;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Plugin load failed at {stage} stage: {path}\n  Reason: {reason}")]
    LoadFailed {
        path: PathBuf,
        stage: LoadStage,
        reason: String,
    },

    #[error("Plugin error at {stage}: code {code:#x}")]
    PluginError { stage: LoadStage, code: i32 },

    #[error("Class {0} not found in module")]
    ClassNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to save plugin state: {0}")]
    StateSaveError(String),

    #[error("Failed to restore plugin state: {0}")]
    StateRestoreError(String),

    #[error("Invalid preset data: {0}")]
    PresetFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl BridgeError {
    pub(crate) fn plugin(stage: LoadStage, code: ResultCode) -> Self {
        BridgeError::PluginError {
            stage,
            code: code.as_raw(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
