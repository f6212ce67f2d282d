use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Tree structure violates its invariants. Fatal, no partial output.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Nesting deeper than the configured ceiling.
    #[error("Depth {depth} exceeds limit of {limit}")]
    DepthExceeded { depth: usize, limit: usize },

    /// Entity recognizer failed or timed out. Callers degrade to roster-only.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Internal contract breach between disambiguation and redaction.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Errors after which the rest of the tree can still be redacted safely
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::ModelUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_model_errors_recover() {
        assert!(Error::ModelUnavailable("timeout".to_string()).is_recoverable());
        assert!(!Error::MalformedInput("dup".to_string()).is_recoverable());
        assert!(!Error::InvariantViolation("overlap".to_string()).is_recoverable());
        assert!(
            !Error::DepthExceeded {
                depth: 1001,
                limit: 1000
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_depth_message() {
        let err = Error::DepthExceeded {
            depth: 2000,
            limit: 1000,
        };
        assert_eq!(err.to_string(), "Depth 2000 exceeds limit of 1000");
    }
}
