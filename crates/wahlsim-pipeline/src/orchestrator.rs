//! One voter record through persona, questionnaire, judge and final choice.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use wahlsim_ai::stages::{answer_questionnaire, final_choice, generate_persona, judge_matches};
use wahlsim_ai::{Stage, StageError, StructuredClient};
use wahlsim_core::{ReferenceCorpora, ResultRecord, VoterRecord};

/// Lifecycle of a single record run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Created,
    PersonaReady,
    AnswersReady,
    JudgeReady,
    Decided,
    Complete,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::PersonaReady => "persona_ready",
            Self::AnswersReady => "answers_ready",
            Self::JudgeReady => "judge_ready",
            Self::Decided => "decided",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A state entered, stamped when it was entered.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: PipelineState,
    pub timestamp: DateTime<Utc>,
}

/// The stage that ended a record run, and why.
#[derive(Debug, Error)]
#[error("stage {} ({}) failed: {}", .stage.number(), .stage, .error)]
pub struct StageFailure {
    pub stage: Stage,
    #[source]
    pub error: StageError,
}

impl StageFailure {
    /// Short cause, e.g. `persona generation failed`.
    pub fn cause(&self) -> String {
        format!("{} generation failed", self.stage)
    }
}

/// Result of running one record.
///
/// On failure no partial artifacts survive; only the failing stage and the
/// transitions reached are kept.
#[derive(Debug)]
pub struct RecordRun {
    pub id: u64,
    pub outcome: Result<ResultRecord, StageFailure>,
    pub transitions: Vec<Transition>,
}

impl RecordRun {
    /// Final state: `Complete` or `Failed`.
    pub fn state(&self) -> PipelineState {
        self.transitions
            .last()
            .map(|t| t.state)
            .unwrap_or(PipelineState::Created)
    }

    pub fn states(&self) -> Vec<PipelineState> {
        self.transitions.iter().map(|t| t.state).collect()
    }
}

struct Trail {
    id: u64,
    transitions: Vec<Transition>,
}

impl Trail {
    fn new(id: u64) -> Self {
        let mut trail = Self {
            id,
            transitions: Vec::with_capacity(7),
        };
        trail.enter(PipelineState::Created);
        trail
    }

    fn enter(&mut self, state: PipelineState) {
        debug!(record_id = self.id, state = %state, "state transition");
        self.transitions.push(Transition {
            state,
            timestamp: Utc::now(),
        });
    }
}

/// Runs the four stages for one record at a time.
///
/// Holds only read-only state, so it can be shared across concurrent runs.
pub struct Orchestrator {
    client: StructuredClient,
    corpora: Arc<ReferenceCorpora>,
}

impl Orchestrator {
    pub fn new(client: StructuredClient, corpora: Arc<ReferenceCorpora>) -> Self {
        Self { client, corpora }
    }

    pub fn corpora(&self) -> &ReferenceCorpora {
        &self.corpora
    }

    /// Run all stages in order for `voter`, assigning the result `id`.
    ///
    /// Never returns an error: a failing stage ends this record in
    /// [`PipelineState::Failed`] and is reported through the outcome.
    pub async fn run(&self, id: u64, voter: &VoterRecord) -> RecordRun {
        let mut trail = Trail::new(id);
        let outcome = self.run_stages(id, voter, &mut trail).await;
        match &outcome {
            Ok(record) => {
                trail.enter(PipelineState::Complete);
                info!(
                    record_id = id,
                    party = record.final_decision().party(),
                    "record complete"
                );
            }
            Err(failure) => {
                trail.enter(PipelineState::Failed);
                warn!(
                    record_id = id,
                    stage = %failure.stage,
                    error = %failure.error,
                    "{}",
                    failure.cause()
                );
            }
        }
        RecordRun {
            id,
            outcome,
            transitions: trail.transitions,
        }
    }

    async fn run_stages(
        &self,
        id: u64,
        voter: &VoterRecord,
        trail: &mut Trail,
    ) -> Result<ResultRecord, StageFailure> {
        let client = &self.client;
        let corpora = self.corpora.as_ref();

        let persona = generate_persona(client, corpora, voter)
            .await
            .map_err(failed_at(Stage::Persona))?;
        trail.enter(PipelineState::PersonaReady);

        let answers = answer_questionnaire(client, corpora, &persona)
            .await
            .map_err(failed_at(Stage::Questionnaire))?;
        trail.enter(PipelineState::AnswersReady);

        let assessment = judge_matches(client, corpora, &persona, &answers)
            .await
            .map_err(failed_at(Stage::Judge))?;
        trail.enter(PipelineState::JudgeReady);

        let decision = final_choice(client, corpora, &persona, &answers, &assessment)
            .await
            .map_err(failed_at(Stage::FinalChoice))?;
        trail.enter(PipelineState::Decided);

        ResultRecord::assemble(id, persona, answers, assessment, decision)
            .map_err(|e| failed_at(Stage::FinalChoice)(e.into()))
    }
}

fn failed_at(stage: Stage) -> impl FnOnce(StageError) -> StageFailure {
    move |error| StageFailure { stage, error }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wahlsim_ai::testing::{ScriptedTransport, respond_valid, sample_corpora};
    use wahlsim_core::GenerationConfig;

    fn orchestrator(transport: ScriptedTransport) -> (Orchestrator, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        let client = StructuredClient::new(transport.clone(), GenerationConfig::default());
        (
            Orchestrator::new(client, Arc::new(sample_corpora())),
            transport,
        )
    }

    fn lehrer_in_berlin() -> VoterRecord {
        [
            ("age".to_string(), json!(34)),
            ("occupation".to_string(), json!("Lehrer")),
            ("region".to_string(), json!("Berlin")),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn runs_all_four_stages() {
        let (orch, transport) = orchestrator(ScriptedTransport::valid());
        let run = orch.run(7, &lehrer_in_berlin()).await;

        assert_eq!(run.state(), PipelineState::Complete);
        assert_eq!(
            run.states(),
            vec![
                PipelineState::Created,
                PipelineState::PersonaReady,
                PipelineState::AnswersReady,
                PipelineState::JudgeReady,
                PipelineState::Decided,
                PipelineState::Complete,
            ]
        );
        assert!(
            run.transitions
                .windows(2)
                .all(|w| w[0].timestamp <= w[1].timestamp)
        );

        let record = run.outcome.unwrap();
        assert_eq!(record.id(), 7);
        assert_eq!(record.persona().age(), 34);
        assert_eq!(record.questionnaire().answers().len(), 35);
        assert_eq!(record.judge_distribution().matches().len(), 6);
        assert!(
            record
                .judge_distribution()
                .matches()
                .values()
                .all(|s| (0.0..=100.0).contains(s))
        );
        assert!(orch.corpora().parties().contains(record.final_decision().party()));
        assert!(record.final_decision().certainty() <= 100);
        assert_eq!(
            transport.schemas(),
            vec![
                "persona",
                "questionnaire_response",
                "judge_response",
                "final_choice_response"
            ]
        );
    }

    #[tokio::test]
    async fn questionnaire_failure_stops_the_record() {
        let (orch, transport) = orchestrator(ScriptedTransport::new(|req, _| {
            if req.schema.name == "questionnaire_response" {
                // Only 34 answers.
                let answers: Vec<_> = (1..=34)
                    .map(|id| json!({ "question_id": id, "stance": 0, "justification": "Das sehe ich neutral." }))
                    .collect();
                return Ok(json!({ "answers": answers }).to_string());
            }
            respond_valid(req)
        }));
        let run = orch.run(1, &lehrer_in_berlin()).await;

        assert_eq!(run.state(), PipelineState::Failed);
        assert_eq!(
            run.states(),
            vec![
                PipelineState::Created,
                PipelineState::PersonaReady,
                PipelineState::Failed
            ]
        );
        let failure = run.outcome.unwrap_err();
        assert_eq!(failure.stage, Stage::Questionnaire);
        assert_eq!(failure.stage.number(), 2);
        assert_eq!(failure.cause(), "questionnaire generation failed");
        assert!(matches!(failure.error, StageError::Validation(_)));
        // Judge and final choice never ran.
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn persona_transport_failure_names_stage_one() {
        let (orch, _) = orchestrator(ScriptedTransport::new(|_, _| {
            Err(wahlsim_ai::TransportError::Server {
                status: 500,
                body: "boom".into(),
            })
        }));
        let run = orch.run(1, &lehrer_in_berlin()).await;
        let failure = run.outcome.unwrap_err();
        assert_eq!(failure.stage, Stage::Persona);
        assert_eq!(failure.cause(), "persona generation failed");
        assert!(failure.to_string().starts_with("stage 1 (persona) failed"));
    }
}
