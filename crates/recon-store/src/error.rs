//! Collaborator errors

/// User store failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Transport or availability failure
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Failure description
        message: String,
    },

    /// Conditional update targeted a missing record
    #[error("record not found: {id}")]
    NotFound {
        /// Record key
        id: String,
    },
}

impl StoreError {
    /// Create unavailable error
    #[inline]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Whether repeating the call may succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// External user source failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Transport or availability failure
    #[error("external source unavailable: {message}")]
    Unavailable {
        /// Failure description
        message: String,
    },

    /// Upstream has no identity for this key
    #[error("no external user for key '{lookup_key}'")]
    NotFound {
        /// Requested key
        lookup_key: String,
    },

    /// Upstream answered with something that is not an identity
    #[error("invalid response from external source: {0}")]
    InvalidResponse(String),

    /// Source adapter cannot be built from its configuration
    #[error("external source misconfigured: {0}")]
    Configuration(String),
}

impl SourceError {
    /// Create unavailable error
    #[inline]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Whether repeating the call may succeed
    #[inline]
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}
