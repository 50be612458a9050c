//! Test doubles: a scripted transport and canned stage payloads that pass
//! validation against the default party set.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Value, json};
use wahlsim_core::{PartySet, Question, Questionnaire, ReferenceCorpora};

use crate::TransportError;
use crate::transport::{CompletionRequest, Transport};

type Responder = dyn Fn(&CompletionRequest, usize) -> Result<String, TransportError> + Send + Sync;

/// Transport whose replies come from a closure receiving the request and the
/// 0-based call index.
pub struct ScriptedTransport {
    respond: Box<Responder>,
    calls: AtomicUsize,
    schemas: Mutex<Vec<&'static str>>,
}

impl ScriptedTransport {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&CompletionRequest, usize) -> Result<String, TransportError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: AtomicUsize::new(0),
            schemas: Mutex::new(Vec::new()),
        }
    }

    /// Answers every stage with a valid payload.
    pub fn valid() -> Self {
        Self::new(|req, _| respond_valid(req))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Schema names of every request, in call order.
    pub fn schemas(&self) -> Vec<&'static str> {
        self.schemas.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut schemas) = self.schemas.lock() {
            schemas.push(request.schema.name);
        }
        (self.respond)(request, call)
    }
}

/// Valid reply for whichever stage the request belongs to.
pub fn respond_valid(request: &CompletionRequest) -> Result<String, TransportError> {
    let value = match request.schema.name {
        "persona" => persona_json(),
        "questionnaire_response" => answers_json(),
        "judge_response" => judge_json(),
        "final_choice_response" => decision_json("GRÜNE"),
        other => json!({ "unexpected_schema": other }),
    };
    Ok(value.to_string())
}

pub fn persona_json() -> Value {
    json!({
        "name": "Jonas Berger",
        "age": 34,
        "occupation": "Lehrer",
        "residence": "Berlin",
        "description": "Jonas unterrichtet Mathematik an einer Gesamtschule in Neukölln und ist Vater von zwei Kindern.",
        "political_stance": "Sozialliberal, Bildungsgerechtigkeit steht für ihn an erster Stelle.",
        "core_topics": ["Bildung", "Klimaschutz", "Wohnen"],
        "voting_pattern": "Wählt bei jeder Bundestagswahl, meist links der Mitte.",
        "concerns": ["Lehrermangel", "Mieten"],
        "hopes": ["Sanierte Schulen"]
    })
}

pub fn answers_json() -> Value {
    let answers: Vec<Value> = (1..=35)
        .map(|id| {
            json!({
                "question_id": id,
                "stance": if id % 2 == 0 { 1 } else { -1 },
                "justification": format!("Aus meiner Sicht als Lehrer zu These {id}."),
            })
        })
        .collect();
    json!({ "answers": answers })
}

pub fn judge_json() -> Value {
    json!({
        "matches": {
            "CDU": 38.5,
            "SPD": 71.25,
            "GRÜNE": 82.125,
            "FDP": 33.0,
            "LINKE": 64.0,
            "AFD": 4.75
        },
        "analysis": "Die Antworten zeigen eine klare Nähe zu sozial- und klimapolitischen \
            Positionen. Bei Bildung, Wohnen und Klimaschutz stimmt die Persona weitgehend mit \
            Grünen und SPD überein, wirtschaftsliberale Thesen lehnt sie dagegen ab."
    })
}

pub fn decision_json(party: &str) -> Value {
    json!({
        "party": party,
        "justification": "Bildung und Klimaschutz sind mir am wichtigsten, und dort passt diese \
            Partei am besten zu meinen Überzeugungen als Lehrer in Berlin.",
        "certainty": 74
    })
}

/// In-memory corpora with the default party set and 35 questions.
pub fn sample_corpora() -> ReferenceCorpora {
    let parties = PartySet::default();
    let programs: BTreeMap<String, String> = parties
        .iter()
        .map(|p| (p.to_string(), format!("Programm der Partei {p}.")))
        .collect();
    let questions = (1..=35)
        .map(|id| Question {
            id,
            title: None,
            text: format!("These {id}"),
        })
        .collect();
    // Fixture data satisfies every constructor rule.
    let questions = Questionnaire::new(questions).unwrap_or_else(|e| panic!("fixture: {e}"));
    ReferenceCorpora::new("Nachrichten der Woche.".into(), parties, programs, questions)
        .unwrap_or_else(|e| panic!("fixture: {e}"))
}
