//! Table-backed external user source

use crate::contract::ExternalUserSource;
use crate::error::SourceError;
use async_trait::async_trait;
use parking_lot::RwLock;
use recon_model::ExternalIdentity;
use std::collections::HashMap;

/// [`ExternalUserSource`] answering from a mutable lookup table
///
/// Entries can be replaced between calls to simulate upstream renames.
#[derive(Debug, Default)]
pub struct StaticUserSource {
    entries: RwLock<HashMap<String, ExternalIdentity>>,
}

impl StaticUserSource {
    /// Create empty source
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry (builder style)
    #[must_use]
    pub fn with(self, lookup_key: impl Into<String>, identity: ExternalIdentity) -> Self {
        self.set(lookup_key, identity);
        self
    }

    /// Insert or replace the identity behind `lookup_key`
    pub fn set(&self, lookup_key: impl Into<String>, identity: ExternalIdentity) {
        self.entries.write().insert(lookup_key.into(), identity);
    }

    /// Parse a JSON object of `lookupKey -> {"userId", "name"}`
    ///
    /// # Errors
    /// `SourceError::InvalidResponse` if the document is not such an object.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        let entries: HashMap<String, ExternalIdentity> = serde_json::from_str(json)
            .map_err(|e| SourceError::InvalidResponse(format!("source table: {e}")))?;
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the table is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl ExternalUserSource for StaticUserSource {
    async fn get(&self, lookup_key: &str) -> Result<ExternalIdentity, SourceError> {
        self.entries
            .read()
            .get(lookup_key)
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                lookup_key: lookup_key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_and_updates() {
        let source = StaticUserSource::new().with("42", ExternalIdentity::new("EXTERNAL#42", "Alice"));
        assert_eq!(source.get("42").await.unwrap().name, "Alice");

        source.set("42", ExternalIdentity::new("EXTERNAL#42", "Bob"));
        assert_eq!(source.get("42").await.unwrap().name, "Bob");
    }

    #[tokio::test]
    async fn unknown_key_is_not_found() {
        let source = StaticUserSource::new();
        assert!(matches!(
            source.get("nope").await,
            Err(SourceError::NotFound { .. })
        ));
    }

    #[test]
    fn from_json_table() {
        let source =
            StaticUserSource::from_json(r#"{"1":{"userId":"EXTERNAL#1","name":"Alice"}}"#).unwrap();
        assert_eq!(source.len(), 1);
        assert!(StaticUserSource::from_json("[]").is_err());
    }
}
