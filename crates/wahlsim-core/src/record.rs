//! The persisted unit: one fully generated voter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::decision::FinalDecision;
use crate::error::ValidationError;
use crate::judge::MatchAssessment;
use crate::party::PartySet;
use crate::persona::Persona;
use crate::questionnaire::QuestionnaireResponseSet;

const ENTITY: &str = "result_record";

/// All four stage artifacts for one source record.
///
/// Serialized as one JSON object per output line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    id: u64,
    persona: Persona,
    questionnaire: QuestionnaireResponseSet,
    judge_distribution: MatchAssessment,
    final_decision: FinalDecision,
}

#[derive(Deserialize)]
struct StoredRecord {
    id: u64,
    persona: Value,
    questionnaire: Value,
    judge_distribution: Value,
    final_decision: Value,
}

impl ResultRecord {
    /// Combine validated artifacts.
    ///
    /// The chosen party must be a key of the match map. Both are validated
    /// against the same party set, so a miss means the artifacts were produced
    /// under different configurations and is reported, never corrected.
    pub fn assemble(
        id: u64,
        persona: Persona,
        questionnaire: QuestionnaireResponseSet,
        judge_distribution: MatchAssessment,
        final_decision: FinalDecision,
    ) -> Result<Self, ValidationError> {
        if judge_distribution.score(final_decision.party()).is_none() {
            return Err(ValidationError::single(
                ENTITY,
                "final_decision.party",
                format!(
                    "{} has no match score in judge_distribution",
                    final_decision.party()
                ),
            ));
        }
        Ok(Self {
            id,
            persona,
            questionnaire,
            judge_distribution,
            final_decision,
        })
    }

    /// Parse one stored line and re-validate every artifact in it.
    pub fn from_json_line(line: &str, parties: &PartySet) -> Result<Self, ValidationError> {
        let stored: StoredRecord =
            serde_json::from_str(line).map_err(|e| ValidationError::malformed(ENTITY, e))?;
        Self::assemble(
            stored.id,
            Persona::from_value(stored.persona)?,
            QuestionnaireResponseSet::from_value(stored.questionnaire)?,
            MatchAssessment::from_value(stored.judge_distribution, parties)?,
            FinalDecision::from_value(stored.final_decision, parties)?,
        )
    }

    /// Single-line JSON, no trailing newline.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn questionnaire(&self) -> &QuestionnaireResponseSet {
        &self.questionnaire
    }

    pub fn judge_distribution(&self) -> &MatchAssessment {
        &self.judge_distribution
    }

    pub fn final_decision(&self) -> &FinalDecision {
        &self.final_decision
    }
}
