//! Stage 4 output: the persona's simulated vote.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checks::Checks;
use crate::error::ValidationError;
use crate::party::PartySet;

const ENTITY: &str = "final_decision";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalDecision {
    party: String,
    justification: String,
    certainty: u8,
}

#[derive(Deserialize)]
struct FinalDecisionDraft {
    party: String,
    justification: String,
    certainty: i64,
}

impl FinalDecision {
    pub fn from_value(value: Value, parties: &PartySet) -> Result<Self, ValidationError> {
        let draft: FinalDecisionDraft =
            serde_json::from_value(value).map_err(|e| ValidationError::malformed(ENTITY, e))?;

        let mut checks = Checks::new(ENTITY);
        if !parties.contains(&draft.party) {
            checks.push(
                "party",
                format!("{:?} is not one of {}", draft.party, parties.joined()),
            );
        }
        checks.chars("justification", &draft.justification, 50, 1000);
        checks.words("justification", &draft.justification, 10, 200);
        checks.int_range("certainty", draft.certainty, 0, 100);
        checks.finish()?;

        Ok(Self {
            party: draft.party,
            justification: draft.justification,
            certainty: draft.certainty as u8,
        })
    }

    pub fn party(&self) -> &str {
        &self.party
    }

    pub fn justification(&self) -> &str {
        &self.justification
    }

    pub fn certainty(&self) -> u8 {
        self.certainty
    }
}

#[cfg(test)]
pub(crate) fn sample_decision_json() -> Value {
    serde_json::json!({
        "party": "GRÜNE",
        "justification": "Als Lehrer in Berlin sind mir Bildung und Klimaschutz am wichtigsten, \
            und hier sehe ich bei den Grünen die größte Übereinstimmung.",
        "certainty": 78
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_decision() {
        let d = FinalDecision::from_value(sample_decision_json(), &PartySet::default()).unwrap();
        assert_eq!(d.party(), "GRÜNE");
        assert_eq!(d.certainty(), 78);
    }

    #[test]
    fn rejects_party_outside_set() {
        let mut v = sample_decision_json();
        v["party"] = "CDU/CSU".into();
        let err = FinalDecision::from_value(v, &PartySet::default()).unwrap_err();
        assert_eq!(err.violations[0].field, "party");
    }

    #[test]
    fn rejects_case_variant_party() {
        let mut v = sample_decision_json();
        v["party"] = "Grüne".into();
        assert!(FinalDecision::from_value(v, &PartySet::default()).is_err());
    }

    #[test]
    fn rejects_certainty_above_hundred() {
        let mut v = sample_decision_json();
        v["certainty"] = 101.into();
        let err = FinalDecision::from_value(v, &PartySet::default()).unwrap_err();
        assert_eq!(err.violations[0].field, "certainty");
    }

    #[test]
    fn rejects_fractional_certainty() {
        let mut v = sample_decision_json();
        v["certainty"] = serde_json::json!(77.5);
        assert!(FinalDecision::from_value(v, &PartySet::default()).is_err());
    }

    #[test]
    fn justification_word_and_char_bounds_are_independent() {
        let mut v = sample_decision_json();
        // 60 characters but a single word.
        v["justification"] = "a".repeat(60).into();
        let err = FinalDecision::from_value(v, &PartySet::default()).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert!(err.violations[0].message.contains("words"));
    }
}
