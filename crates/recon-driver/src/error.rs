//! Error types for the reconciliation drivers
//!
//! Business outcomes (locked, unchanged, inserted, renamed) are never errors.
//! Only malformed input, collaborator faults that outlive the retry policy,
//! unresolved races and broken workflow definitions surface here.

use crate::workflow::WorkflowError;
use recon_engine::EngineError;
use recon_model::ModelError;
use std::fmt;

/// Collaborator named in an availability fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collaborator {
    /// Upstream identity provider
    ExternalSource,
    /// Record store
    UserStore,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Collaborator::ExternalSource => "external source",
            Collaborator::UserStore => "user store",
        })
    }
}

/// Caller-facing reconciliation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconError {
    /// Malformed or missing identity data; never retried
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// What was wrong
        reason: String,
    },

    /// Collaborator transport or availability failure after all retries
    #[error("{collaborator} unavailable after {attempts} attempt(s): {message}")]
    CollaboratorUnavailable {
        /// Which collaborator failed
        collaborator: Collaborator,
        /// Attempts made
        attempts: u32,
        /// Last failure
        message: String,
    },

    /// Storage races on one identity outlasted the re-resolution budget
    #[error("concurrent modification of '{id}' not resolved after {conflicts} conflict(s)")]
    ConcurrentModification {
        /// Record key
        id: String,
        /// Conflicts observed
        conflicts: u32,
    },

    /// Malformed workflow definition or runaway execution
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl ReconError {
    /// Create invalid input error
    #[inline]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Create collaborator fault
    #[inline]
    pub fn unavailable(collaborator: Collaborator, attempts: u32, message: impl fmt::Display) -> Self {
        Self::CollaboratorUnavailable {
            collaborator,
            attempts,
            message: message.to_string(),
        }
    }

    /// Check if repeating the whole call later may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::CollaboratorUnavailable { .. } | Self::ConcurrentModification { .. }
        )
    }

    /// Check if the caller sent something that can never succeed
    #[inline]
    #[must_use]
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }

    /// Stable label for logs and response bodies
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::CollaboratorUnavailable { .. } => "collaborator_unavailable",
            Self::ConcurrentModification { .. } => "concurrent_modification",
            Self::Workflow(_) => "workflow",
            Self::Config(_) => "config",
        }
    }

    /// HTTP status used by the response envelope
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput { .. } => 400,
            Self::CollaboratorUnavailable { .. } => 502,
            Self::ConcurrentModification { .. } => 409,
            Self::Workflow(_) | Self::Config(_) => 500,
        }
    }
}

impl From<EngineError> for ReconError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidInput(model) => Self::from(model),
        }
    }
}

impl From<ModelError> for ReconError {
    fn from(err: ModelError) -> Self {
        Self::invalid_input(err.to_string())
    }
}
