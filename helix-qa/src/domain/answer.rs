use std::time::Duration;

use serde::{Serialize, Serializer};

use super::ScoredChunk;
use crate::error::{ErrorReport, HelixQaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerStatus {
    Answered,
    NoContext,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: Option<String>,
    pub status: AnswerStatus,
    pub retrieved_chunks: Vec<ScoredChunk>,
    #[serde(rename = "latency_ms", serialize_with = "serialize_millis")]
    pub latency: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
}

impl AnswerRecord {
    pub fn answered(
        question: impl Into<String>,
        answer: String,
        retrieved_chunks: Vec<ScoredChunk>,
        latency: Duration,
    ) -> Self {
        Self {
            question: question.into(),
            answer: Some(answer),
            status: AnswerStatus::Answered,
            retrieved_chunks,
            latency,
            error: None,
        }
    }

    /// Error-shaped record returned when nothing relevant has been indexed.
    pub fn no_context(question: impl Into<String>, latency: Duration) -> Self {
        Self {
            question: question.into(),
            answer: None,
            status: AnswerStatus::NoContext,
            retrieved_chunks: Vec::new(),
            latency,
            error: Some(HelixQaError::NoContext.report()),
        }
    }

    pub fn response_time(&self) -> String {
        format!("Response time: {:.2} seconds.", self.latency.as_secs_f64())
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)] // signature fixed by serde
fn serialize_millis<S: Serializer>(latency: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(latency.as_millis()).unwrap_or(u64::MAX))
}
