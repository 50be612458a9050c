//! Stage 3 output: per-party match scores plus a narrative analysis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checks::Checks;
use crate::error::ValidationError;
use crate::party::PartySet;

const ENTITY: &str = "match_assessment";

/// Validated judge result. Holds a score for every party in the configured
/// [`PartySet`] and nothing else; scores are in `[0, 100]` and rounded to two
/// decimals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchAssessment {
    matches: BTreeMap<String, f64>,
    analysis: String,
}

#[derive(Deserialize)]
struct MatchAssessmentDraft {
    matches: BTreeMap<String, f64>,
    analysis: String,
}

impl MatchAssessment {
    pub fn from_value(value: Value, parties: &PartySet) -> Result<Self, ValidationError> {
        let draft: MatchAssessmentDraft =
            serde_json::from_value(value).map_err(|e| ValidationError::malformed(ENTITY, e))?;

        let mut checks = Checks::new(ENTITY);
        for party in parties.iter() {
            match draft.matches.get(party) {
                None => checks.push(format!("matches.{party}"), "missing score"),
                // Raw value is range-checked before any rounding.
                Some(score) if !(0.0..=100.0).contains(score) => checks.push(
                    format!("matches.{party}"),
                    format!("must be between 0 and 100, got {score}"),
                ),
                Some(_) => {}
            }
        }
        for key in draft.matches.keys() {
            if !parties.contains(key) {
                checks.push(format!("matches.{key}"), "not one of the configured parties");
            }
        }
        checks.chars("analysis", &draft.analysis, 100, 2000);
        checks.words("analysis", &draft.analysis, 20, 400);
        checks.finish()?;

        let matches = draft
            .matches
            .into_iter()
            .map(|(party, score)| (party, round2(score)))
            .collect();

        Ok(Self {
            matches,
            analysis: draft.analysis,
        })
    }

    pub fn matches(&self) -> &BTreeMap<String, f64> {
        &self.matches
    }

    pub fn score(&self, party: &str) -> Option<f64> {
        self.matches.get(party).copied()
    }

    /// Highest-scoring party. Ties go to the party that sorts first.
    pub fn top_party(&self) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (party, &score) in &self.matches {
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((party.as_str(), score));
            }
        }
        best.map(|(party, _)| party)
    }

    pub fn analysis(&self) -> &str {
        &self.analysis
    }

    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
pub(crate) fn sample_judge_json() -> Value {
    serde_json::json!({
        "matches": {
            "CDU": 41.256,
            "SPD": 72.5,
            "GRÜNE": 80.0,
            "FDP": 35.0,
            "LINKE": 60.333,
            "AFD": 5.0
        },
        "analysis": "Die Antworten der Persona zeigen eine deutliche Nähe zu Positionen, \
            die soziale Gerechtigkeit und Klimaschutz verbinden. Besonders bei Bildung \
            und Mieten stimmt sie mit den Grünen und der SPD überein, während sie \
            wirtschaftsliberale Forderungen überwiegend ablehnt."
    })
}
