/// Error types for the rules engine, level catalog and persistence boundary.
///
/// `EngineError` marks driver bugs (bad index, engine used before a level was
/// loaded) and is returned to the caller. `PersistenceError` never leaves
/// `ProgressTracker`: it is logged at the store boundary and swallowed.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("index {index} out of range (0..{len})")]
    OutOfRange { index: usize, len: usize },

    #[error("no level loaded")]
    NotLoaded,
}

/// The external key-value store could not be read or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not encode progress record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not decode progress record: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Level authoring / pack loading problems.
#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level catalog is empty")]
    Empty,

    #[error("level pack contains no levels")]
    EmptyPack,

    #[error("level {id} is invalid: {reason}")]
    Invalid { id: u32, reason: String },

    #[error("could not parse level \"{level}\": {reason}")]
    Parse { level: String, reason: String },

    #[error("could not read level pack: {0}")]
    Io(#[from] std::io::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
