//! The fixed 35-item political-stance questionnaire.

use serde::Serialize;

use crate::error::ConfigError;

pub const QUESTION_COUNT: u32 = 35;

/// One questionnaire thesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
}

/// Question list covering ids `1..=35` exactly once, sorted by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Questionnaire {
    questions: Vec<Question>,
}

impl Questionnaire {
    pub fn new(mut questions: Vec<Question>) -> Result<Self, ConfigError> {
        questions.sort_by_key(|q| q.id);
        let ids: Vec<u32> = questions.iter().map(|q| q.id).collect();
        let expected: Vec<u32> = (1..=QUESTION_COUNT).collect();
        if ids != expected {
            return Err(ConfigError::InvalidQuestionnaire(format!(
                "expected question ids 1..={QUESTION_COUNT}, got {} questions with ids {ids:?}",
                ids.len()
            )));
        }
        if let Some(q) = questions.iter().find(|q| q.text.trim().is_empty()) {
            return Err(ConfigError::InvalidQuestionnaire(format!(
                "question {} has no text",
                q.id
            )));
        }
        Ok(Self { questions })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// JSON rendering used inside prompts.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(&self.questions).unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) fn sample_questions() -> Vec<Question> {
    (1..=QUESTION_COUNT)
        .map(|id| Question {
            id,
            title: Some(format!("Thema {id}")),
            text: format!("These Nummer {id}"),
        })
        .collect()
}
