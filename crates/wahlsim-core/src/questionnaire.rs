//! Stage 2 output: the persona's answers to all 35 theses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::checks::Checks;
use crate::error::ValidationError;
use crate::question::QUESTION_COUNT;

const ENTITY: &str = "questionnaire";

/// Position on a thesis. Serialized as `-1`, `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stance {
    Against,
    Neutral,
    For,
}

impl Stance {
    pub fn value(self) -> i8 {
        match self {
            Self::Against => -1,
            Self::Neutral => 0,
            Self::For => 1,
        }
    }

    pub fn from_value(v: i64) -> Option<Self> {
        match v {
            -1 => Some(Self::Against),
            0 => Some(Self::Neutral),
            1 => Some(Self::For),
            _ => None,
        }
    }
}

impl Serialize for Stance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.value())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    question_id: u32,
    stance: Stance,
    justification: String,
}

impl Answer {
    pub fn question_id(&self) -> u32 {
        self.question_id
    }

    pub fn stance(&self) -> Stance {
        self.stance
    }

    pub fn justification(&self) -> &str {
        &self.justification
    }
}

/// Exactly one answer per question id `1..=35`, sorted by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionnaireResponseSet {
    answers: Vec<Answer>,
}

#[derive(Deserialize)]
struct AnswerDraft {
    question_id: i64,
    stance: i64,
    justification: String,
}

#[derive(Deserialize)]
struct ResponseSetDraft {
    answers: Vec<AnswerDraft>,
}

impl QuestionnaireResponseSet {
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let draft: ResponseSetDraft =
            serde_json::from_value(value).map_err(|e| ValidationError::malformed(ENTITY, e))?;

        let mut checks = Checks::new(ENTITY);
        checks.items(
            "answers",
            draft.answers.len(),
            QUESTION_COUNT as usize,
            QUESTION_COUNT as usize,
        );

        let mut seen: BTreeMap<i64, usize> = BTreeMap::new();
        for (i, a) in draft.answers.iter().enumerate() {
            checks.int_range(
                format!("answers[{i}].question_id"),
                a.question_id,
                1,
                QUESTION_COUNT as i64,
            );
            if Stance::from_value(a.stance).is_none() {
                checks.push(
                    format!("answers[{i}].stance"),
                    format!("must be -1, 0 or 1, got {}", a.stance),
                );
            }
            checks.chars(format!("answers[{i}].justification"), &a.justification, 20, 500);
            *seen.entry(a.question_id).or_default() += 1;
        }

        for (id, count) in &seen {
            if *count > 1 {
                checks.push("answers", format!("question {id} answered {count} times"));
            }
        }
        let missing: Vec<i64> = (1..=QUESTION_COUNT as i64)
            .filter(|id| !seen.contains_key(id))
            .collect();
        if !missing.is_empty() {
            checks.push("answers", format!("missing question ids {missing:?}"));
        }
        checks.finish()?;

        let mut answers: Vec<Answer> = draft
            .answers
            .into_iter()
            .filter_map(|a| {
                Some(Answer {
                    question_id: a.question_id as u32,
                    stance: Stance::from_value(a.stance)?,
                    justification: a.justification,
                })
            })
            .collect();
        answers.sort_by_key(|a| a.question_id);

        Ok(Self { answers })
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn get(&self, question_id: u32) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) fn sample_answers_json() -> Value {
    let answers: Vec<Value> = (1..=QUESTION_COUNT)
        .map(|id| {
            let stance = match id % 3 {
                0 => -1,
                1 => 0,
                _ => 1,
            };
            serde_json::json!({
                "question_id": id,
                "stance": stance,
                "justification": format!("Begründung der Persona zu These {id}."),
            })
        })
        .collect();
    serde_json::json!({ "answers": answers })
}
