use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::controller::PipelineController;
use crate::error::{locale_decode, ScanError};
use crate::pipeline::{Message, MessageSource, Pipeline};
use crate::tags::TagMap;

const NANOS_PER_MILLI: u64 = 1_000_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub timeout_ms: u64,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self { timeout_ms: 1000 }
    }
}

impl ScannerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanPhase {
    Idle,
    Priming,
    Polling,
    Done,
    Failed,
    TimedOut,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanResult {
    pub tags: TagMap,
    pub duration_ms: Option<u64>,
}

/// Collects tags and duration for one URI at a time. The scanner owns its
/// pipeline; run one scanner per concurrent scan.
pub struct Scanner<P: Pipeline> {
    controller: PipelineController<P>,
    config: ScannerConfig,
    phase: ScanPhase,
}

impl<P: Pipeline> Scanner<P> {
    pub fn new(pipeline: P) -> Self {
        Self::with_config(pipeline, ScannerConfig::default())
    }

    pub fn with_config(pipeline: P, config: ScannerConfig) -> Self {
        Self {
            controller: PipelineController::new(pipeline),
            config,
            phase: ScanPhase::Idle,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn pipeline(&self) -> &P {
        self.controller.pipeline()
    }

    pub fn scan(&mut self, uri: &str) -> Result<ScanResult, ScanError> {
        debug!("Scanning {}", uri);
        self.phase = ScanPhase::Priming;
        let result = {
            let mut session = self.controller.session(uri);
            self.phase = ScanPhase::Polling;
            match collect(session.pipeline_mut(), &self.config) {
                Ok(tags) => {
                    self.phase = ScanPhase::Done;
                    let duration_ms = query_duration(session.pipeline_mut());
                    Ok(ScanResult { tags, duration_ms })
                }
                Err(err) => {
                    self.phase = match err {
                        ScanError::Timeout(_) => ScanPhase::TimedOut,
                        ScanError::Pipeline(_) => ScanPhase::Failed,
                    };
                    Err(err)
                }
            }
        };
        debug!("Scan of {} finished as {:?}", uri, self.phase);
        self.phase = ScanPhase::Idle;
        result
    }
}

fn collect<P: Pipeline>(pipeline: &mut P, config: &ScannerConfig) -> Result<TagMap, ScanError> {
    let timeout = config.timeout();
    let start = Instant::now();
    let mut tags = TagMap::new();

    while start.elapsed() < timeout {
        let remaining = timeout.saturating_sub(start.elapsed());
        let message = match pipeline.pop_message(remaining) {
            Some(message) => message,
            None => continue,
        };

        match message {
            Message::Error {
                message,
                debug: details,
            } => {
                let text = locale_decode(&message);
                if let Some(details) = details {
                    debug!("Pipeline error details: {}", details);
                }
                return Err(ScanError::Pipeline(text));
            }
            Message::Eos => return Ok(tags),
            Message::AsyncDone {
                source: MessageSource::Pipeline,
            } => return Ok(tags),
            Message::Tag(list) => tags.merge(list),
            other => trace!("Ignoring {} message", other.kind()),
        }
    }

    Err(ScanError::Timeout(config.timeout_ms))
}

/// Stream duration in whole milliseconds, or `None` when the pipeline cannot
/// tell.
pub fn query_duration<P: Pipeline + ?Sized>(pipeline: &mut P) -> Option<u64> {
    let duration = pipeline.query_duration()?;
    if duration < 0 {
        return None;
    }
    Some(duration as u64 / NANOS_PER_MILLI)
}

#[cfg(test)]
mod tests {
    use super::{query_duration, ScanPhase, Scanner, ScannerConfig};
    use crate::error::ScanError;
    use crate::pipeline::{Message, MessageSource, PipelineState};
    use crate::tags::{TagList, TagValue, ARTIST, GENRE, TITLE};
    use crate::testing::{Call, ScriptedPipeline};

    fn tag(name: &str, value: &str) -> Message {
        Message::Tag(TagList::new().with(name, value))
    }

    fn pipeline_done() -> Message {
        Message::AsyncDone {
            source: MessageSource::Pipeline,
        }
    }

    fn short_timeout() -> ScannerConfig {
        ScannerConfig { timeout_ms: 30 }
    }

    #[test]
    fn default_timeout_is_one_second() {
        assert_eq!(ScannerConfig::default().timeout_ms, 1000);
    }

    #[test]
    fn last_tag_event_wins_per_name() {
        let pipeline = ScriptedPipeline::with_messages(vec![
            Message::Tag(TagList::new().with(ARTIST, "A").with(ARTIST, "B")),
            tag(GENRE, "Rock"),
            tag(ARTIST, "C"),
            Message::Eos,
        ]);
        let mut scanner = Scanner::new(pipeline);
        let result = scanner.scan("file:///music/a.mp3").unwrap();

        assert_eq!(result.tags.get(ARTIST), Some(&[TagValue::from("C")][..]));
        assert_eq!(result.tags.get(GENRE), Some(&[TagValue::from("Rock")][..]));
    }

    #[test]
    fn error_wins_over_pending_terminal_messages() {
        let pipeline = ScriptedPipeline::with_messages(vec![
            tag(TITLE, "Song"),
            Message::Error {
                message: b"Could not open resource".to_vec(),
                debug: Some("filesrc0".to_string()),
            },
            Message::Eos,
            pipeline_done(),
        ]);
        let mut scanner = Scanner::new(pipeline);
        let err = scanner.scan("file:///music/missing.mp3").unwrap_err();

        assert_eq!(err, ScanError::Pipeline("Could not open resource".to_string()));
        assert_eq!(scanner.pipeline().resets(), 1);
        assert!(!scanner.pipeline().calls.contains(&Call::QueryDuration));
    }

    #[test]
    fn timeout_names_budget_and_still_resets() {
        let pipeline = ScriptedPipeline::with_messages(vec![tag(TITLE, "Song")]);
        let mut scanner = Scanner::with_config(pipeline, short_timeout());
        let err = scanner.scan("file:///music/slow.mp3").unwrap_err();

        assert_eq!(err, ScanError::Timeout(30));
        assert!(err.to_string().contains("30ms"));
        assert_eq!(scanner.pipeline().resets(), 1);
        assert_eq!(
            scanner.pipeline().calls.last(),
            Some(&Call::SetState(PipelineState::Null))
        );
    }

    #[test]
    fn element_async_done_does_not_terminate() {
        let pipeline = ScriptedPipeline::with_messages(vec![
            Message::AsyncDone {
                source: MessageSource::Element("decodebin0".to_string()),
            },
            tag(TITLE, "Song"),
        ]);
        let mut scanner = Scanner::with_config(pipeline, short_timeout());

        assert_eq!(
            scanner.scan("file:///music/a.mp3").unwrap_err(),
            ScanError::Timeout(30)
        );
    }

    #[test]
    fn pipeline_async_done_terminates() {
        let pipeline = ScriptedPipeline::with_messages(vec![
            Message::AsyncDone {
                source: MessageSource::Element("decodebin0".to_string()),
            },
            tag(TITLE, "Song"),
            pipeline_done(),
            tag(TITLE, "Ignored"),
        ]);
        let mut scanner = Scanner::new(pipeline);
        let result = scanner.scan("file:///music/a.mp3").unwrap();

        assert_eq!(result.tags.get(TITLE), Some(&[TagValue::from("Song")][..]));
    }

    #[test]
    fn eos_returns_partial_tags() {
        let pipeline = ScriptedPipeline::with_messages(vec![
            Message::StateChanged {
                source: MessageSource::Pipeline,
                old: PipelineState::Ready,
                new: PipelineState::Paused,
            },
            tag(ARTIST, "Jane Doe"),
            Message::Other("buffering".to_string()),
            Message::Eos,
        ]);
        let mut scanner = Scanner::new(pipeline);
        let result = scanner.scan("file:///music/a.mp3").unwrap();

        assert_eq!(result.tags.len(), 1);
        assert!(result.tags.contains(ARTIST));
        assert_eq!(scanner.phase(), ScanPhase::Idle);
    }

    #[test]
    fn duration_is_truncated_to_milliseconds() {
        let mut pipeline = ScriptedPipeline::with_messages(vec![Message::Eos]);
        pipeline.duration = Some(215_999_999_999);
        let mut scanner = Scanner::new(pipeline);
        let result = scanner.scan("file:///music/a.mp3").unwrap();

        assert_eq!(result.duration_ms, Some(215_999));
    }

    #[test]
    fn negative_or_missing_duration_is_unknown() {
        let mut pipeline = ScriptedPipeline::new();
        pipeline.duration = Some(-1);
        assert_eq!(query_duration(&mut pipeline), None);

        pipeline.duration = None;
        assert_eq!(query_duration(&mut pipeline), None);

        let mut pipeline = ScriptedPipeline::with_messages(vec![pipeline_done()]);
        pipeline.duration = Some(-1);
        let mut scanner = Scanner::new(pipeline);
        assert_eq!(scanner.scan("file:///music/a.mp3").unwrap().duration_ms, None);
    }

    #[test]
    fn consecutive_scans_do_not_share_state() {
        let mut pipeline = ScriptedPipeline::new();
        pipeline.scripts.push_back(vec![tag(TITLE, "First"), Message::Eos]);
        pipeline.scripts.push_back(vec![tag(ARTIST, "Second"), Message::Eos]);
        let mut scanner = Scanner::new(pipeline);

        let first = scanner.scan("file:///music/1.mp3").unwrap();
        let second = scanner.scan("file:///music/2.mp3").unwrap();

        assert!(first.tags.contains(TITLE));
        assert!(!second.tags.contains(TITLE));
        assert!(second.tags.contains(ARTIST));
        assert_eq!(scanner.pipeline().resets(), 2);
    }
}
