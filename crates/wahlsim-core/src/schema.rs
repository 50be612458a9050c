//! JSON schema descriptors sent to the generation service, one per stage.
//!
//! Each schema encodes the same field constraints the entity validators
//! enforce. The service is only *asked* to conform; the validators remain the
//! authority.

use serde_json::{Value, json};

use crate::party::PartySet;
use crate::question::QUESTION_COUNT;

/// Named schema for a structured-output request.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDescriptor {
    pub name: &'static str,
    pub schema: Value,
}

impl SchemaDescriptor {
    /// OpenAI-compatible `response_format` body.
    pub fn response_format(&self) -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.name,
                "schema": self.schema,
            }
        })
    }
}

pub fn persona() -> SchemaDescriptor {
    let text = |min: u32, max: u32, description: &str| {
        json!({ "type": "string", "minLength": min, "maxLength": max, "description": description })
    };
    let list = |min: u32, max: u32, description: &str| {
        json!({
            "type": "array",
            "items": { "type": "string" },
            "minItems": min,
            "maxItems": max,
            "description": description,
        })
    };
    SchemaDescriptor {
        name: "persona",
        schema: json!({
            "type": "object",
            "properties": {
                "name": text(2, 100, "Realistic German full name"),
                "age": { "type": "integer", "minimum": 16, "maximum": 100 },
                "occupation": text(2, 100, "Current or last occupation"),
                "residence": text(2, 100, "City or region in Germany"),
                "description": text(50, 1000, "Detailed description of the person"),
                "political_stance": text(20, 500, "Basic political attitude"),
                "core_topics": list(2, 10, "Most important political topics"),
                "voting_pattern": text(20, 500, "Typical voting behaviour"),
                "concerns": list(1, 10, "Current worries"),
                "hopes": list(1, 10, "Hopes and wishes"),
            },
            "required": [
                "name", "age", "occupation", "residence", "description",
                "political_stance", "core_topics", "voting_pattern", "concerns", "hopes"
            ],
            "additionalProperties": false,
        }),
    }
}

pub fn questionnaire() -> SchemaDescriptor {
    SchemaDescriptor {
        name: "questionnaire_response",
        schema: json!({
            "type": "object",
            "properties": {
                "answers": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "question_id": { "type": "integer", "minimum": 1, "maximum": QUESTION_COUNT },
                            "stance": { "type": "integer", "enum": [-1, 0, 1] },
                            "justification": { "type": "string", "minLength": 20, "maxLength": 500 },
                        },
                        "required": ["question_id", "stance", "justification"],
                        "additionalProperties": false,
                    },
                    "minItems": QUESTION_COUNT,
                    "maxItems": QUESTION_COUNT,
                }
            },
            "required": ["answers"],
            "additionalProperties": false,
        }),
    }
}

pub fn judge(parties: &PartySet) -> SchemaDescriptor {
    let properties: serde_json::Map<String, Value> = parties
        .iter()
        .map(|p| {
            (
                p.to_string(),
                json!({ "type": "number", "minimum": 0, "maximum": 100 }),
            )
        })
        .collect();
    SchemaDescriptor {
        name: "judge_response",
        schema: json!({
            "type": "object",
            "properties": {
                "matches": {
                    "type": "object",
                    "properties": properties,
                    "required": parties,
                    "additionalProperties": false,
                },
                "analysis": { "type": "string", "minLength": 100, "maxLength": 2000 },
            },
            "required": ["matches", "analysis"],
            "additionalProperties": false,
        }),
    }
}

pub fn final_choice(parties: &PartySet) -> SchemaDescriptor {
    SchemaDescriptor {
        name: "final_choice_response",
        schema: json!({
            "type": "object",
            "properties": {
                "party": { "type": "string", "enum": parties, "description": "One of the parties" },
                "justification": {
                    "type": "string",
                    "minLength": 50,
                    "maxLength": 1000,
                    "description": "Reasoning for the choice, in the persona's voice",
                },
                "certainty": { "type": "integer", "minimum": 0, "maximum": 100, "description": "Percent" },
            },
            "required": ["party", "justification", "certainty"],
            "additionalProperties": false,
        }),
    }
}
