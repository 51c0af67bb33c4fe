mod controller;
mod error;
mod local;
mod pipeline;
mod scanner;
pub mod tags;
mod translate;

#[cfg(test)]
mod testing;

pub use controller::{PipelineController, Session};
pub use error::{locale_decode, PipelineError, ScanError};
pub use local::{resolve_uri, FilePipeline};
pub use pipeline::{Message, MessageSource, Pipeline, PipelineState, StateChange};
pub use scanner::{query_duration, ScanPhase, ScanResult, Scanner, ScannerConfig};
pub use tags::{TagList, TagMap, TagValue};
pub use translate::tags_to_track;
