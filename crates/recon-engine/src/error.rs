//! Engine errors
//!
//! Business conditions (locked, unchanged, insert, rename) are outcomes, not
//! errors. Malformed input is the only way the decision can fail.

use recon_model::ModelError;

/// Engine failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Empty identity fields or a stored record for another identity
    #[error("invalid input: {0}")]
    InvalidInput(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_model_error() {
        let err: EngineError = ModelError::empty("id").into();
        assert_eq!(err.to_string(), "invalid input: field 'id' must not be empty");
    }
}
