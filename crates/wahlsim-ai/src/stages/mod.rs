//! The four stage contracts. Each builds a prompt from prior artifacts and the
//! reference corpora, calls the [`StructuredClient`], and constructs the
//! validated entity from the reply.

mod final_choice;
mod judge;
mod persona;
mod questionnaire;

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use wahlsim_core::{SchemaDescriptor, ValidationError};

use crate::{GenerationError, StructuredClient};

pub use final_choice::final_choice;
pub use judge::judge_matches;
pub use persona::generate_persona;
pub use questionnaire::answer_questionnaire;

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Persona,
    Questionnaire,
    Judge,
    FinalChoice,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Persona,
        Stage::Questionnaire,
        Stage::Judge,
        Stage::FinalChoice,
    ];

    /// 1-based position in the pipeline.
    pub fn number(self) -> u8 {
        match self {
            Self::Persona => 1,
            Self::Questionnaire => 2,
            Self::Judge => 3,
            Self::FinalChoice => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Persona => "persona",
            Self::Questionnaire => "questionnaire",
            Self::Judge => "judge",
            Self::FinalChoice => "final_choice",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a stage produced no entity.
#[derive(Debug, Error)]
pub enum StageError {
    /// Transport or parse failures outlasted the client's retries.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The reply parsed but broke the entity's constraints.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Call the client and validate, re-prompting up to
/// `validation_retries` times when the reply parses but does not validate.
async fn run_stage<T, F>(
    client: &StructuredClient,
    stage: Stage,
    system_prompt: &str,
    user_prompt: &str,
    schema: &SchemaDescriptor,
    validate: F,
) -> Result<T, StageError>
where
    F: Fn(Value) -> Result<T, ValidationError>,
{
    let config = client.config();
    let rounds = config.validation_retries.saturating_add(1);
    let mut round = 0u32;
    loop {
        round += 1;
        debug!(stage = %stage, round, "calling generation service");
        let value = client
            .call(system_prompt, user_prompt, schema, config.max_output_tokens)
            .await?;
        match validate(value) {
            Ok(entity) => return Ok(entity),
            Err(e) if round < rounds => {
                warn!(stage = %stage, round, rounds, error = %e, "reply failed validation, re-prompting");
            }
            Err(e) => return Err(e.into()),
        }
    }
}
