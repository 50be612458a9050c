//! Storage layer: reference corpora, voter CSV input, JSONL result output.

mod error;
pub use error::StoreError;

pub mod corpus;
pub mod sink;
pub mod voters;

pub use corpus::{CorpusPaths, load_corpora};
pub use sink::{JsonlSink, MemorySink, RecordSink, read_results};
pub use voters::load_voters;
