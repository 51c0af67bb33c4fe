use tracing::{debug, warn};

use crate::pipeline::{Pipeline, PipelineState, StateChange};

pub struct PipelineController<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> PipelineController<P> {
    pub fn new(mut pipeline: P) -> Self {
        pipeline.set_flushing(true);
        Self { pipeline }
    }

    /// Points the pipeline at `uri` and asks it to pre-roll.
    pub fn setup(&mut self, uri: &str) {
        self.pipeline.set_state(PipelineState::Ready);
        self.pipeline.set_uri(uri);
        self.pipeline.set_flushing(false);
        if self.pipeline.set_state(PipelineState::Paused) == StateChange::NoPreroll {
            // Live sources never pre-roll; data only flows once playing.
            debug!("No pre-roll for {}; switching to playing", uri);
            self.pipeline.set_state(PipelineState::Playing);
        }
    }

    pub fn reset(&mut self) {
        self.pipeline.set_flushing(true);
        if self.pipeline.set_state(PipelineState::Null) == StateChange::Failure {
            warn!("Pipeline refused to return to the null state");
        }
    }

    /// Runs `setup` and hands back a guard that resets the pipeline when it
    /// goes out of scope, whichever way the caller leaves.
    pub fn session(&mut self, uri: &str) -> Session<'_, P> {
        self.setup(uri);
        Session { controller: self }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }
}

pub struct Session<'a, P: Pipeline> {
    controller: &'a mut PipelineController<P>,
}

impl<P: Pipeline> Session<'_, P> {
    pub fn pipeline_mut(&mut self) -> &mut P {
        &mut self.controller.pipeline
    }
}

impl<P: Pipeline> Drop for Session<'_, P> {
    fn drop(&mut self) {
        self.controller.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineController;
    use crate::pipeline::{PipelineState, StateChange};
    use crate::testing::{Call, ScriptedPipeline};

    #[test]
    fn setup_primes_in_order() {
        let mut controller = PipelineController::new(ScriptedPipeline::new());
        controller.setup("file:///music/a.flac");

        assert_eq!(
            controller.pipeline().calls,
            vec![
                Call::SetFlushing(true),
                Call::SetState(PipelineState::Ready),
                Call::SetUri("file:///music/a.flac".to_string()),
                Call::SetFlushing(false),
                Call::SetState(PipelineState::Paused),
            ]
        );
    }

    #[test]
    fn live_source_is_switched_to_playing() {
        let mut pipeline = ScriptedPipeline::new();
        pipeline.paused_result = StateChange::NoPreroll;
        let mut controller = PipelineController::new(pipeline);
        controller.setup("http://radio.example/stream");

        assert_eq!(
            controller.pipeline().calls.last(),
            Some(&Call::SetState(PipelineState::Playing))
        );
    }

    #[test]
    fn session_resets_on_drop() {
        let mut controller = PipelineController::new(ScriptedPipeline::new());
        {
            let mut session = controller.session("file:///music/a.flac");
            assert!(session.pipeline_mut().calls.contains(&Call::SetFlushing(false)));
        }

        let calls = &controller.pipeline().calls;
        assert_eq!(
            &calls[calls.len() - 2..],
            &[Call::SetFlushing(true), Call::SetState(PipelineState::Null)]
        );
    }

    #[test]
    fn failed_reset_is_swallowed() {
        let mut pipeline = ScriptedPipeline::new();
        pipeline.null_result = StateChange::Failure;
        let mut controller = PipelineController::new(pipeline);
        controller.setup("file:///music/a.flac");
        controller.reset();

        assert_eq!(
            controller.pipeline().calls.last(),
            Some(&Call::SetState(PipelineState::Null))
        );
    }
}
