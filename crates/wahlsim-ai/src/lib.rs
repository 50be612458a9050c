//! Generation layer: a schema-constrained client for the text model and the
//! four stage contracts (persona, questionnaire, judge, final choice) built on
//! top of it.

mod client;
mod error;
pub mod stages;
mod transport;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use client::StructuredClient;
pub use error::{GenerationError, TransportError};
pub use stages::{Stage, StageError};
pub use transport::{CompletionRequest, OpenAiTransport, Transport};
