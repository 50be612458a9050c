//! Read-only reference material substituted into stage prompts.

use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::party::PartySet;
use crate::question::Questionnaire;

/// News digest, party programs, question list and the party set.
///
/// Loaded once before the batch starts and shared immutably by every record.
#[derive(Debug, Clone)]
pub struct ReferenceCorpora {
    news: String,
    parties: PartySet,
    /// Program texts in party-set order.
    programs: Vec<(String, String)>,
    questions: Questionnaire,
}

impl ReferenceCorpora {
    /// Every party needs exactly one program; programs for parties outside the
    /// set are rejected.
    pub fn new(
        news: String,
        parties: PartySet,
        mut programs: BTreeMap<String, String>,
        questions: Questionnaire,
    ) -> Result<Self, ConfigError> {
        let mut ordered = Vec::with_capacity(parties.len());
        for party in parties.iter() {
            let text = programs
                .remove(party)
                .ok_or_else(|| ConfigError::MissingProgram(party.to_string()))?;
            ordered.push((party.to_string(), text));
        }
        if let Some(extra) = programs.into_keys().next() {
            return Err(ConfigError::UnknownProgram(extra));
        }
        Ok(Self {
            news,
            parties,
            programs: ordered,
            questions,
        })
    }

    pub fn news(&self) -> &str {
        &self.news
    }

    pub fn parties(&self) -> &PartySet {
        &self.parties
    }

    pub fn questions(&self) -> &Questionnaire {
        &self.questions
    }

    pub fn program(&self, party: &str) -> Option<&str> {
        self.programs
            .iter()
            .find(|(p, _)| p == party)
            .map(|(_, text)| text.as_str())
    }

    /// All programs, each headed by its party identifier.
    pub fn programs_text(&self) -> String {
        self.programs
            .iter()
            .map(|(party, text)| format!("## {party}\n{}", text.trim()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
pub(crate) fn sample_programs(parties: &PartySet) -> BTreeMap<String, String> {
    parties
        .iter()
        .map(|p| (p.to_string(), format!("Wahlprogramm der {p}.")))
        .collect()
}
