//! Error type shared by every scoreboard operation.

/// Errors that can occur during scoreboard operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ScoreError {
    /// Referenced player or match id does not exist.
    NotFound(String),
    /// A player with this id already exists.
    DuplicateId(String),
    /// Tournament config or import payload is unusable.
    InvalidConfig(String),
    /// Match payload is inconsistent (unknown players, overlapping teams, bad positions).
    InvalidMatch(String),
    /// Persistence layer rejected a write (e.g. quota exceeded).
    StorageWriteFailure(String),
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreError::NotFound(what) => write!(f, "Not found: {}", what),
            ScoreError::DuplicateId(id) => write!(f, "A player with id '{}' already exists", id),
            ScoreError::InvalidConfig(reason) => write!(f, "Invalid configuration: {}", reason),
            ScoreError::InvalidMatch(reason) => write!(f, "Invalid match: {}", reason),
            ScoreError::StorageWriteFailure(reason) => write!(f, "Could not save data: {}", reason),
        }
    }
}

impl std::error::Error for ScoreError {}
