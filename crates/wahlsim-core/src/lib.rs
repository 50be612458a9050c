//! Core types for the voter simulation: the entities each generation stage
//! produces, the rules they are validated against, and the schema descriptors
//! handed to the generation service.

mod checks;
pub mod config;
pub mod corpus;
pub mod decision;
pub mod error;
pub mod judge;
pub mod party;
pub mod persona;
pub mod question;
pub mod questionnaire;
pub mod record;
pub mod schema;
pub mod voter;

pub use config::{ApiKey, GenerationConfig};
pub use corpus::ReferenceCorpora;
pub use decision::FinalDecision;
pub use error::{ConfigError, ValidationError, Violation};
pub use judge::MatchAssessment;
pub use party::{PARTY_COUNT, PartySet};
pub use persona::Persona;
pub use question::{QUESTION_COUNT, Question, Questionnaire};
pub use questionnaire::{Answer, QuestionnaireResponseSet, Stance};
pub use record::ResultRecord;
pub use schema::SchemaDescriptor;
pub use voter::VoterRecord;
