use std::fmt;

use thiserror::Error;

/// A single broken rule on one field of a generated entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Dotted path into the entity, e.g. `answers[3].justification`.
    pub field: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Parsed model output that does not conform to its stage contract.
///
/// Distinct from transport and parse failures: the payload was well-formed
/// JSON but semantically wrong (missing question, unknown party, score out of
/// range, ...). All violations found are reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{entity} failed validation: {}", summarize(.violations))]
pub struct ValidationError {
    pub entity: &'static str,
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(entity: &'static str, violations: Vec<Violation>) -> Self {
        Self { entity, violations }
    }

    /// The payload did not even have the expected shape (wrong JSON types,
    /// missing fields).
    pub fn malformed(entity: &'static str, err: serde_json::Error) -> Self {
        Self {
            entity,
            violations: vec![Violation {
                field: "$".to_string(),
                message: err.to_string(),
            }],
        }
    }

    pub fn single(entity: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            entity,
            violations: vec![Violation {
                field: field.into(),
                message: message.into(),
            }],
        }
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Startup-time configuration problems. Never recovered: the batch aborts
/// before any record is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("generation-service credential missing (set OPENAI_API_KEY or pass --api-key)")]
    MissingCredential,

    #[error("invalid party set: {0}")]
    InvalidPartySet(String),

    #[error("invalid question list: {0}")]
    InvalidQuestionnaire(String),

    #[error("no party program for {0}")]
    MissingProgram(String),

    #[error("party program for unknown party {0}")]
    UnknownProgram(String),

    #[error("{0}")]
    Invalid(String),
}
