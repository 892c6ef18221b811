//! Model validation errors

/// Errors raised when identity or record data is malformed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// A required string field is empty
    #[error("field '{field}' must not be empty")]
    EmptyField {
        /// Name of the offending field
        field: &'static str,
    },

    /// A stored record does not belong to the identity it was paired with
    #[error("identity mismatch: expected '{expected}', got '{actual}'")]
    IdMismatch {
        /// Identity the caller asked about
        expected: String,
        /// Identity found on the record
        actual: String,
    },
}

impl ModelError {
    /// Create empty field error
    #[inline]
    #[must_use]
    pub fn empty(field: &'static str) -> Self {
        Self::EmptyField { field }
    }

    /// Create identity mismatch error
    #[inline]
    pub fn id_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::IdMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_field_display() {
        let err = ModelError::empty("name");
        assert_eq!(err.to_string(), "field 'name' must not be empty");
    }

    #[test]
    fn id_mismatch_display() {
        let err = ModelError::id_mismatch("U1", "U2");
        assert!(err.to_string().contains("expected 'U1', got 'U2'"));
    }
}
