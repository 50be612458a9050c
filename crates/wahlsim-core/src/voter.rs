//! Raw demographic seed records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of the source survey table: demographic attribute name → value.
///
/// Fields keep the column order of the source header. Immutable once
/// loaded; consumed by the persona stage only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterRecord {
    fields: Map<String, Value>,
}

impl VoterRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// JSON object rendering used inside prompts.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_default()
    }
}

impl FromIterator<(String, Value)> for VoterRecord {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
