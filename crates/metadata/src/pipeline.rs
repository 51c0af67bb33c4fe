use std::time::Duration;

use crate::tags::TagList;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Null,
    Ready,
    Paused,
    Playing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateChange {
    Success,
    Async,
    /// The state was reached but no data will flow until playing; live
    /// sources answer this to a paused request.
    NoPreroll,
    Failure,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageSource {
    Pipeline,
    Element(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Error {
        message: Vec<u8>,
        debug: Option<String>,
    },
    Eos,
    AsyncDone {
        source: MessageSource,
    },
    Tag(TagList),
    StateChanged {
        source: MessageSource,
        old: PipelineState,
        new: PipelineState,
    },
    Other(String),
}

impl Message {
    pub fn kind(&self) -> &str {
        match self {
            Message::Error { .. } => "error",
            Message::Eos => "eos",
            Message::AsyncDone { .. } => "async-done",
            Message::Tag(_) => "tag",
            Message::StateChanged { .. } => "state-changed",
            Message::Other(name) => name,
        }
    }
}

/// A decode pipeline together with its message bus.
///
/// Durations are in nanoseconds. A negative or missing duration means the
/// pipeline could not tell.
pub trait Pipeline {
    fn set_uri(&mut self, uri: &str);

    fn set_state(&mut self, state: PipelineState) -> StateChange;

    /// While flushing the bus drops everything posted to it and queued
    /// messages are discarded.
    fn set_flushing(&mut self, flushing: bool);

    /// Pops the next bus message, waiting at most `timeout` for one to
    /// arrive. Buses without a blocking primitive may return `None` at once.
    fn pop_message(&mut self, timeout: Duration) -> Option<Message>;

    fn query_duration(&mut self) -> Option<i64>;
}
