//! Response envelope handed to a request-handling layer

use crate::error::ReconError;
use recon_model::ReconciliationOutcome;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// `{statusCode, body}` pair for one reconciliation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    /// HTTP-style status code
    pub status_code: u16,
    /// Outcome on success, `{error, message}` otherwise
    pub body: Value,
}

impl ApiResponse {
    /// 200 carrying the outcome
    #[must_use]
    pub fn ok(outcome: &ReconciliationOutcome) -> Self {
        match serde_json::to_value(outcome) {
            Ok(body) => Self {
                status_code: 200,
                body,
            },
            Err(e) => Self {
                status_code: 500,
                body: json!({ "error": "serialization", "message": e.to_string() }),
            },
        }
    }

    /// Error envelope; status follows [`ReconError::status_code`]
    #[must_use]
    pub fn from_error(error: &ReconError) -> Self {
        Self {
            status_code: error.status_code(),
            body: json!({ "error": error.kind(), "message": error.to_string() }),
        }
    }

    /// Envelope for a driver result
    #[must_use]
    pub fn from_result(result: &Result<ReconciliationOutcome, ReconError>) -> Self {
        match result {
            Ok(outcome) => Self::ok(outcome),
            Err(error) => Self::from_error(error),
        }
    }

    /// Whether the status is 2xx
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Collaborator;
    use pretty_assertions::assert_eq;
    use recon_model::UserStatus;

    #[test]
    fn success_envelope() {
        let outcome = ReconciliationOutcome {
            id: "U1".into(),
            name: "Alice".into(),
            status: UserStatus::Locked,
            user_locked: true,
            name_changed: false,
            inserted: false,
        };
        let response = ApiResponse::ok(&outcome);
        assert!(response.is_success());
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"statusCode":200,"body":{"id":"U1","name":"Alice","status":"LOCKED","userLocked":true,"nameChanged":false,"inserted":false}}"#
        );
    }

    #[test]
    fn error_envelopes() {
        let bad = ApiResponse::from_error(&ReconError::invalid_input("field 'name' must not be empty"));
        assert_eq!(bad.status_code, 400);
        assert_eq!(bad.body["error"], "invalid_input");

        let down = ApiResponse::from_result(&Err(ReconError::unavailable(
            Collaborator::ExternalSource,
            3,
            "connection refused",
        )));
        assert_eq!(down.status_code, 502);
        assert!(!down.is_success());
    }
}
