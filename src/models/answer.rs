use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// How the final answer of a pipeline run was obtained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
    Approved,
    Fallback,
}

/// Outcome of a successful pipeline run, attached to a completed job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerPayload {
    pub message: String,
    pub verification_status: VerificationStatus,
    /// Reformulate/generate/verify cycles executed, always >= 1.
    pub attempts: u32,
    /// Last reformulation produced, kept on fallback for diagnosis.
    pub reformulated_query: Option<String>,
    pub verifier_feedback: Option<String>,
    /// When the pipeline produced this answer.
    pub created_at: DateTime<Utc>,
}

/// Verifier decision on a candidate answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Verdict {
    Approved,
    Revise,
}

/// Typed reply of the verifier agent.
///
/// LLM verifiers answer with `{"status": "approved|revise", ...}`, so `status`
/// is accepted as an alias of `verdict`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifierReply {
    #[serde(alias = "status")]
    pub verdict: Verdict,
    #[serde(default)]
    pub final_answer: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

impl VerifierReply {
    pub fn approved(final_answer: Option<&str>, feedback: Option<&str>) -> Self {
        Self {
            verdict: Verdict::Approved,
            final_answer: final_answer.map(str::to_string),
            feedback: feedback.map(str::to_string),
        }
    }

    pub fn revise(feedback: &str) -> Self {
        Self {
            verdict: Verdict::Revise,
            final_answer: None,
            feedback: Some(feedback.to_string()),
        }
    }

    /// The verifier's edited answer, ignoring blank strings.
    pub fn usable_final_answer(&self) -> Option<&str> {
        self.final_answer
            .as_deref()
            .map(str::trim)
            .filter(|answer| !answer.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_alias_accepted() {
        let reply: VerifierReply = serde_json::from_str(
            r#"{"status": "approved", "final_answer": "Ouvert de 8h à 20h.", "feedback": "ok"}"#,
        )
        .unwrap();

        assert_eq!(reply.verdict, Verdict::Approved);
        assert_eq!(reply.usable_final_answer(), Some("Ouvert de 8h à 20h."));
        assert_eq!(reply.feedback.as_deref(), Some("ok"));
    }

    #[test]
    fn test_optional_fields_default() {
        let reply: VerifierReply = serde_json::from_str(r#"{"verdict": "revise"}"#).unwrap();
        assert_eq!(reply, VerifierReply {
            verdict: Verdict::Revise,
            final_answer: None,
            feedback: None,
        });
    }

    #[test]
    fn test_unknown_verdict_rejected() {
        assert!(serde_json::from_str::<VerifierReply>(r#"{"status": "maybe"}"#).is_err());
    }

    #[test]
    fn test_blank_final_answer_ignored() {
        let reply = VerifierReply::approved(Some("   "), None);
        assert_eq!(reply.usable_final_answer(), None);
    }

    #[test]
    fn test_payload_serializes_snake_case_status() {
        let payload = AnswerPayload {
            message: "fallback".to_string(),
            verification_status: VerificationStatus::Fallback,
            attempts: 3,
            reformulated_query: None,
            verifier_feedback: None,
            created_at: DateTime::<Utc>::default(),
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["verification_status"], "fallback");
        assert_eq!(VerificationStatus::Approved.to_string(), "approved");
    }
}
