//! External identity as reported by the upstream source of truth

use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// User identity fetched fresh from the external source on every request
///
/// The upstream wire format names the identity `userId`; `id` is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalIdentity {
    /// Stable external identity, primary key of the stored record
    #[serde(rename = "userId", alias = "id")]
    pub id: String,
    /// Current display name
    pub name: String,
}

impl ExternalIdentity {
    /// Create new identity
    #[inline]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Reject identities with an empty `id` or `name`
    ///
    /// # Errors
    /// `ModelError::EmptyField` naming the first empty field.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.id.is_empty() {
            return Err(ModelError::empty("id"));
        }
        if self.name.is_empty() {
            return Err(ModelError::empty("name"));
        }
        Ok(())
    }
}
