//! The closed set of party identifiers every stage contract refers to.

use std::collections::HashSet;

use serde::Serialize;

use crate::error::ConfigError;

pub const PARTY_COUNT: usize = 6;

const DEFAULT_PARTIES: [&str; PARTY_COUNT] = ["CDU", "SPD", "GRÜNE", "FDP", "LINKE", "AFD"];

/// Ordered, immutable set of exactly [`PARTY_COUNT`] party identifiers.
///
/// Loaded once at startup and shared read-only. The same set drives the judge
/// schema's required match keys and the final-choice enum, so a chosen party
/// always resolves to a match key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PartySet {
    ids: Vec<String>,
}

impl PartySet {
    pub fn new(ids: Vec<String>) -> Result<Self, ConfigError> {
        if ids.len() != PARTY_COUNT {
            return Err(ConfigError::InvalidPartySet(format!(
                "expected {PARTY_COUNT} parties, got {}",
                ids.len()
            )));
        }
        let mut seen = HashSet::new();
        for id in &ids {
            if id.trim().is_empty() {
                return Err(ConfigError::InvalidPartySet("empty party identifier".into()));
            }
            if id.trim() != id {
                return Err(ConfigError::InvalidPartySet(format!(
                    "party identifier {id:?} has surrounding whitespace"
                )));
            }
            if !seen.insert(id.as_str()) {
                return Err(ConfigError::InvalidPartySet(format!("duplicate party {id}")));
            }
        }
        Ok(Self { ids })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|p| p == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Comma-separated list for prompt text.
    pub fn joined(&self) -> String {
        self.ids.join(", ")
    }
}

impl Default for PartySet {
    fn default() -> Self {
        Self {
            ids: DEFAULT_PARTIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_has_six_parties() {
        let parties = PartySet::default();
        assert_eq!(parties.len(), PARTY_COUNT);
        assert!(parties.contains("GRÜNE"));
        assert!(!parties.contains("CSU"));
    }

    #[test]
    fn rejects_wrong_count() {
        let err = PartySet::new(ids(&["CDU", "SPD"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPartySet(_)));
    }

    #[test]
    fn rejects_duplicates() {
        let err = PartySet::new(ids(&["CDU", "SPD", "FDP", "LINKE", "AFD", "SPD"])).unwrap_err();
        assert!(err.to_string().contains("duplicate party SPD"));
    }

    #[test]
    fn rejects_padded_identifier() {
        assert!(PartySet::new(ids(&["CDU ", "SPD", "FDP", "LINKE", "AFD", "GRÜNE"])).is_err());
    }

    #[test]
    fn preserves_configured_order() {
        let parties = PartySet::new(ids(&["A", "B", "C", "D", "E", "F"])).unwrap();
        assert_eq!(parties.joined(), "A, B, C, D, E, F");
        let json = serde_json::to_string(&parties).unwrap();
        assert_eq!(json, r#"["A","B","C","D","E","F"]"#);
    }
}
