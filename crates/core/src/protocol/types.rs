use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::program::Program;

/// Errors raised while driving a verification session.
///
/// These never cross the client's public boundary: `VerificationClient::execute`
/// converts them into a failed `VerificationOutcome`.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid verification link: no verification id found")]
    InvalidUrl,

    /// The remote rejected a step or returned an error state.
    #[error("step {step} failed: {detail}")]
    Protocol { step: String, detail: String },

    /// A document upload was refused or aborted.
    #[error("upload of {file_name} failed: {detail}")]
    Upload { file_name: String, detail: String },

    /// Network-level failure talking to the remote.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,
}

/// One in-flight verification session.
///
/// The id is immutable for the session's lifetime; `current_step` only moves
/// forward as step responses come back.
#[derive(Debug, Clone)]
pub struct VerificationSession {
    pub verification_id: String,
    pub program: Program,
    pub current_step: String,
    pub created_at: DateTime<Utc>,
}

impl VerificationSession {
    pub fn new(verification_id: impl Into<String>, program: Program) -> Self {
        Self {
            verification_id: verification_id.into(),
            program,
            current_step: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Adopt the step the server says the session is now in.
    pub fn advance(&mut self, step: &str) {
        self.current_step = step.to_string();
    }
}

/// A step response, parsed leniently.
///
/// The remote varies its payload shape per step, so every field here is
/// optional in the wire format; absent fields parse to empty/`None` and the
/// raw payload is kept for anything not modeled.
#[derive(Debug, Clone)]
pub struct StepResponse {
    pub status: u16,
    pub current_step: String,
    pub error_ids: Vec<String>,
    pub upload_slots: Vec<String>,
    pub redirect_url: Option<String>,
    pub reward_code: Option<String>,
    pub raw: Value,
}

impl StepResponse {
    /// Parse a step payload from an HTTP status and JSON body.
    pub fn from_wire(status: u16, body: Value) -> Self {
        let current_step = body
            .get("currentStep")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let error_ids = body
            .get("errorIds")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let upload_slots = body
            .get("documents")
            .and_then(Value::as_array)
            .map(|docs| {
                docs.iter()
                    .filter_map(|doc| doc.get("uploadUrl").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let redirect_url = body
            .get("redirectUrl")
            .and_then(Value::as_str)
            .map(str::to_string);

        // The code shows up either top-level or nested under rewardData.
        let reward_code = body
            .get("rewardCode")
            .and_then(Value::as_str)
            .or_else(|| {
                body.get("rewardData")
                    .and_then(|data| data.get("rewardCode"))
                    .and_then(Value::as_str)
            })
            .map(str::to_string);

        Self {
            status,
            current_step,
            error_ids,
            upload_slots,
            redirect_url,
            reward_code,
            raw: body,
        }
    }

    pub fn is_error(&self) -> bool {
        self.current_step == "error" || !self.error_ids.is_empty()
    }

    pub fn joined_errors(&self) -> String {
        if self.error_ids.is_empty() {
            "unspecified error".to_string()
        } else {
            self.error_ids.join(", ")
        }
    }
}

/// Final result of one `execute` run, reported to the caller as a value.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    /// Whether the documents made it through submission.
    pub success: bool,
    /// True when the remote still has to review the documents.
    pub pending: bool,
    pub message: String,
    pub verification_id: String,
    pub redirect_url: Option<String>,
}

impl VerificationOutcome {
    pub fn failure(verification_id: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            pending: false,
            message: message.into(),
            verification_id: verification_id.to_string(),
            redirect_url: None,
        }
    }

    pub fn pending(verification_id: &str, redirect_url: Option<String>) -> Self {
        Self {
            success: true,
            pending: true,
            message: "documents submitted, awaiting review".to_string(),
            verification_id: verification_id.to_string(),
            redirect_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parses_upload_slots_in_order() {
        let response = StepResponse::from_wire(
            200,
            json!({
                "currentStep": "docUpload",
                "documents": [
                    {"uploadUrl": "https://u.example/1"},
                    {"uploadUrl": "https://u.example/2"},
                ],
            }),
        );
        assert_eq!(response.current_step, "docUpload");
        assert_eq!(
            response.upload_slots,
            vec!["https://u.example/1", "https://u.example/2"]
        );
        assert!(!response.is_error());
    }

    #[test]
    fn test_error_ids_detected() {
        let response = StepResponse::from_wire(
            200,
            json!({"currentStep": "error", "errorIds": ["invalidEmail", "underReview"]}),
        );
        assert!(response.is_error());
        assert_eq!(response.joined_errors(), "invalidEmail, underReview");
    }

    #[test]
    fn test_reward_code_top_level_and_nested() {
        let top = StepResponse::from_wire(200, json!({"rewardCode": "ABC-123"}));
        assert_eq!(top.reward_code.as_deref(), Some("ABC-123"));

        let nested =
            StepResponse::from_wire(200, json!({"rewardData": {"rewardCode": "XYZ-789"}}));
        assert_eq!(nested.reward_code.as_deref(), Some("XYZ-789"));

        let neither = StepResponse::from_wire(200, json!({"currentStep": "pending"}));
        assert_eq!(neither.reward_code, None);
    }

    #[test]
    fn test_lenient_on_unexpected_shape() {
        let response = StepResponse::from_wire(502, json!("Bad Gateway"));
        assert_eq!(response.status, 502);
        assert_eq!(response.current_step, "");
        assert!(response.upload_slots.is_empty());
    }

    #[test]
    fn test_outcome_constructors() {
        let failure = VerificationOutcome::failure("abc123", "step collect failed");
        assert!(!failure.success);
        assert!(!failure.pending);

        let pending = VerificationOutcome::pending("abc123", Some("https://r.example".into()));
        assert!(pending.success);
        assert!(pending.pending);
        assert_eq!(pending.redirect_url.as_deref(), Some("https://r.example"));
    }
}
