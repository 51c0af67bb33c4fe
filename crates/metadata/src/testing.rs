use std::collections::VecDeque;
use std::time::Duration;

use crate::pipeline::{Message, Pipeline, PipelineState, StateChange};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    SetUri(String),
    SetState(PipelineState),
    SetFlushing(bool),
    QueryDuration,
}

/// In-memory pipeline. Every paused request posts the next script onto the
/// bus, the way a real pipeline posts while pre-rolling.
pub struct ScriptedPipeline {
    pub scripts: VecDeque<Vec<Message>>,
    pub paused_result: StateChange,
    pub null_result: StateChange,
    pub duration: Option<i64>,
    pub calls: Vec<Call>,
    bus: VecDeque<Message>,
    flushing: bool,
}

impl ScriptedPipeline {
    pub fn new() -> Self {
        Self {
            scripts: VecDeque::new(),
            paused_result: StateChange::Async,
            null_result: StateChange::Success,
            duration: None,
            calls: Vec::new(),
            bus: VecDeque::new(),
            flushing: false,
        }
    }

    pub fn with_messages(messages: Vec<Message>) -> Self {
        let mut pipeline = Self::new();
        pipeline.scripts.push_back(messages);
        pipeline
    }

    pub fn resets(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == Call::SetState(PipelineState::Null))
            .count()
    }
}

impl Pipeline for ScriptedPipeline {
    fn set_uri(&mut self, uri: &str) {
        self.calls.push(Call::SetUri(uri.to_string()));
    }

    fn set_state(&mut self, state: PipelineState) -> StateChange {
        self.calls.push(Call::SetState(state));
        match state {
            PipelineState::Paused => {
                if let Some(script) = self.scripts.pop_front() {
                    if !self.flushing {
                        self.bus.extend(script);
                    }
                }
                self.paused_result
            }
            PipelineState::Null => self.null_result,
            _ => StateChange::Success,
        }
    }

    fn set_flushing(&mut self, flushing: bool) {
        self.calls.push(Call::SetFlushing(flushing));
        self.flushing = flushing;
        if flushing {
            self.bus.clear();
        }
    }

    fn pop_message(&mut self, timeout: Duration) -> Option<Message> {
        let message = self.bus.pop_front();
        if message.is_none() {
            std::thread::sleep(timeout.min(Duration::from_millis(1)));
        }
        message
    }

    fn query_duration(&mut self) -> Option<i64> {
        self.calls.push(Call::QueryDuration);
        self.duration
    }
}
