//! Stage 1 output: a synthetic voter profile.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checks::Checks;
use crate::error::ValidationError;

const ENTITY: &str = "persona";

/// A validated synthetic voter profile.
///
/// Only obtainable through [`Persona::from_value`], so holding one means every
/// field rule has passed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Persona {
    name: String,
    age: u8,
    occupation: String,
    residence: String,
    description: String,
    political_stance: String,
    core_topics: Vec<String>,
    voting_pattern: String,
    concerns: Vec<String>,
    hopes: Vec<String>,
}

#[derive(Deserialize)]
struct PersonaDraft {
    name: String,
    age: i64,
    occupation: String,
    residence: String,
    description: String,
    political_stance: String,
    core_topics: Vec<String>,
    voting_pattern: String,
    concerns: Vec<String>,
    hopes: Vec<String>,
}

impl Persona {
    /// Construct-and-validate from a loosely typed model payload.
    ///
    /// No coercion: `"34"` or `34.0` for `age` is rejected as malformed.
    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        let draft: PersonaDraft =
            serde_json::from_value(value).map_err(|e| ValidationError::malformed(ENTITY, e))?;

        let mut checks = Checks::new(ENTITY);
        checks.chars("name", &draft.name, 2, 100);
        checks.int_range("age", draft.age, 16, 100);
        checks.chars("occupation", &draft.occupation, 2, 100);
        checks.chars("residence", &draft.residence, 2, 100);
        checks.chars("description", &draft.description, 50, 1000);
        checks.chars("political_stance", &draft.political_stance, 20, 500);
        checks.items("core_topics", draft.core_topics.len(), 2, 10);
        checks.chars("voting_pattern", &draft.voting_pattern, 20, 500);
        checks.items("concerns", draft.concerns.len(), 1, 10);
        checks.items("hopes", draft.hopes.len(), 1, 10);
        checks.finish()?;

        Ok(Self {
            name: draft.name,
            // Range checked above.
            age: draft.age as u8,
            occupation: draft.occupation,
            residence: draft.residence,
            description: draft.description,
            political_stance: draft.political_stance,
            core_topics: draft.core_topics,
            voting_pattern: draft.voting_pattern,
            concerns: draft.concerns,
            hopes: draft.hopes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> u8 {
        self.age
    }

    pub fn occupation(&self) -> &str {
        &self.occupation
    }

    pub fn residence(&self) -> &str {
        &self.residence
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn political_stance(&self) -> &str {
        &self.political_stance
    }

    pub fn core_topics(&self) -> &[String] {
        &self.core_topics
    }

    pub fn voting_pattern(&self) -> &str {
        &self.voting_pattern
    }

    pub fn concerns(&self) -> &[String] {
        &self.concerns
    }

    pub fn hopes(&self) -> &[String] {
        &self.hopes
    }

    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) fn sample_persona_json() -> Value {
    serde_json::json!({
        "name": "Jonas Berger",
        "age": 34,
        "occupation": "Lehrer",
        "residence": "Berlin-Neukölln",
        "description": "Jonas unterrichtet Mathematik und Physik an einer Gesamtschule und engagiert sich im Elternbeirat.",
        "political_stance": "Sozialliberal mit starkem Fokus auf Bildungsgerechtigkeit.",
        "core_topics": ["Bildung", "Klimaschutz", "Mieten"],
        "voting_pattern": "Wählt regelmäßig, entscheidet sich meist kurz vor der Wahl.",
        "concerns": ["Steigende Mieten in Berlin"],
        "hopes": ["Mehr Investitionen in Schulen"]
    })
}
