use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lofty::prelude::{AudioFile, ItemKey, TaggedFileExt};
use lofty::tag::{ItemValue, Tag};
use time::{Date, Month};
use tracing::debug;
use url::Url;

use crate::error::PipelineError;
use crate::pipeline::{Message, MessageSource, Pipeline, PipelineState, StateChange};
use crate::tags::{self, TagList};

const DEMUXER: &str = "demuxer";

#[derive(Clone, Copy)]
enum ValueKind {
    Text,
    Number,
    Date,
}

struct Probe {
    tag_lists: Vec<TagList>,
    duration_ns: Option<i64>,
}

/// Pipeline over local files. Tags and stream properties are read with
/// lofty when the pipeline pre-rolls; everything is posted synchronously so
/// the bus never has to wait.
pub struct FilePipeline {
    uri: Option<String>,
    state: PipelineState,
    flushing: bool,
    bus: VecDeque<Message>,
    duration_ns: Option<i64>,
}

impl Default for FilePipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl FilePipeline {
    pub fn new() -> Self {
        Self {
            uri: None,
            state: PipelineState::Null,
            flushing: false,
            bus: VecDeque::new(),
            duration_ns: None,
        }
    }

    fn post(&mut self, message: Message) {
        if !self.flushing {
            self.bus.push_back(message);
        }
    }

    fn preroll(&mut self) -> StateChange {
        let path = match self.uri.as_deref() {
            Some(uri) => resolve_uri(uri),
            None => Err(PipelineError::NoUri),
        };
        let probed = path.and_then(|path| {
            probe(&path).map_err(|err| {
                debug!("Failed to read {:?}: {}", path, err);
                err
            })
        });

        match probed {
            Ok(probe) => {
                self.duration_ns = probe.duration_ns;
                for list in probe.tag_lists {
                    self.post(Message::Tag(list));
                }
                self.post(Message::StateChanged {
                    source: MessageSource::Pipeline,
                    old: self.state,
                    new: PipelineState::Paused,
                });
                self.post(Message::AsyncDone {
                    source: MessageSource::Element(DEMUXER.to_string()),
                });
                self.post(Message::AsyncDone {
                    source: MessageSource::Pipeline,
                });
                StateChange::Async
            }
            Err(err) => {
                self.post(Message::Error {
                    message: err.to_string().into_bytes(),
                    debug: self.uri.clone(),
                });
                StateChange::Failure
            }
        }
    }
}

impl Pipeline for FilePipeline {
    fn set_uri(&mut self, uri: &str) {
        self.uri = Some(uri.to_string());
    }

    fn set_state(&mut self, state: PipelineState) -> StateChange {
        let prerolled = matches!(self.state, PipelineState::Paused | PipelineState::Playing);
        match state {
            PipelineState::Null | PipelineState::Ready => {
                self.duration_ns = None;
                self.state = state;
                StateChange::Success
            }
            PipelineState::Paused | PipelineState::Playing if prerolled => {
                self.state = state;
                StateChange::Success
            }
            PipelineState::Paused | PipelineState::Playing => {
                let result = self.preroll();
                if result != StateChange::Failure {
                    self.state = state;
                }
                result
            }
        }
    }

    fn set_flushing(&mut self, flushing: bool) {
        self.flushing = flushing;
        if flushing {
            self.bus.clear();
        }
    }

    fn pop_message(&mut self, _timeout: Duration) -> Option<Message> {
        self.bus.pop_front()
    }

    fn query_duration(&mut self) -> Option<i64> {
        match self.state {
            PipelineState::Paused | PipelineState::Playing => self.duration_ns,
            _ => None,
        }
    }
}

/// Accepts `file://` URIs and plain paths.
pub fn resolve_uri(uri: &str) -> Result<PathBuf, PipelineError> {
    match Url::parse(uri) {
        // Windows drive letters parse as one-letter schemes.
        Ok(url) if url.scheme().len() == 1 => Ok(PathBuf::from(uri)),
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map_err(|_| PipelineError::UnsupportedUri(uri.to_string())),
        Ok(_) => Err(PipelineError::UnsupportedUri(uri.to_string())),
        Err(_) => Ok(PathBuf::from(uri)),
    }
}

fn probe(path: &Path) -> Result<Probe, PipelineError> {
    let tagged_file = lofty::read_from_path(path)?;
    let properties = tagged_file.properties();

    let duration = properties.duration();
    let duration_ns = if duration.is_zero() {
        None
    } else {
        i64::try_from(duration.as_nanos()).ok()
    };

    // Lossy blocks (ID3v1 next to ID3v2) go first so the primary tag wins
    // the per-name merge.
    let primary = tagged_file.primary_tag_type();
    let secondary = tagged_file
        .tags()
        .iter()
        .filter(|tag| tag.tag_type() != primary);
    let mut tag_lists: Vec<TagList> = secondary
        .chain(tagged_file.primary_tag())
        .map(convert_tag)
        .filter(|list| !list.is_empty())
        .collect();

    let mut stream = TagList::new();
    if let Some(kbps) = properties.audio_bitrate().or(properties.overall_bitrate()) {
        if kbps > 0 {
            stream.add(tags::BITRATE, kbps.saturating_mul(1000));
        }
    }
    if !stream.is_empty() {
        tag_lists.push(stream);
    }

    Ok(Probe {
        tag_lists,
        duration_ns,
    })
}

fn convert_tag(tag: &Tag) -> TagList {
    let mut list = TagList::new();
    for item in tag.items() {
        let text = match item.value() {
            ItemValue::Text(text) | ItemValue::Locator(text) => text.trim(),
            ItemValue::Binary(_) => continue,
        };
        if text.is_empty() {
            continue;
        }

        let (name, kind) = match tag_name(item.key()) {
            Some(mapped) => mapped,
            None => match item.key() {
                ItemKey::Unknown(key) => {
                    list.add(&key.to_lowercase(), text);
                    continue;
                }
                _ => continue,
            },
        };

        match kind {
            ValueKind::Text => list.add(name, text),
            ValueKind::Number => add_number(&mut list, name, text),
            ValueKind::Date => match parse_date(text) {
                Some(date) => list.add(name, date),
                None => list.add(name, text),
            },
        }
    }
    list
}

fn tag_name(key: &ItemKey) -> Option<(&'static str, ValueKind)> {
    let mapped = match key {
        ItemKey::TrackTitle => (tags::TITLE, ValueKind::Text),
        ItemKey::TrackArtist => (tags::ARTIST, ValueKind::Text),
        ItemKey::AlbumTitle => (tags::ALBUM, ValueKind::Text),
        ItemKey::AlbumArtist => (tags::ALBUM_ARTIST, ValueKind::Text),
        ItemKey::Composer => (tags::COMPOSER, ValueKind::Text),
        ItemKey::Performer => (tags::PERFORMER, ValueKind::Text),
        ItemKey::Genre => (tags::GENRE, ValueKind::Text),
        ItemKey::Comment => (tags::COMMENT, ValueKind::Text),
        ItemKey::CopyrightMessage => (tags::COPYRIGHT, ValueKind::Text),
        ItemKey::Label => (tags::ORGANIZATION, ValueKind::Text),
        ItemKey::EncoderSoftware => (tags::ENCODER, ValueKind::Text),
        ItemKey::Lyrics => (tags::LYRICS, ValueKind::Text),
        ItemKey::RecordingDate | ItemKey::Year => (tags::DATE, ValueKind::Date),
        ItemKey::TrackNumber => (tags::TRACK_NUMBER, ValueKind::Number),
        ItemKey::TrackTotal => (tags::TRACK_COUNT, ValueKind::Number),
        ItemKey::DiscNumber => (tags::ALBUM_DISC_NUMBER, ValueKind::Number),
        ItemKey::DiscTotal => (tags::ALBUM_DISC_COUNT, ValueKind::Number),
        ItemKey::MusicBrainzRecordingId => (tags::MUSICBRAINZ_TRACKID, ValueKind::Text),
        ItemKey::MusicBrainzArtistId => (tags::MUSICBRAINZ_ARTISTID, ValueKind::Text),
        ItemKey::MusicBrainzReleaseId => (tags::MUSICBRAINZ_ALBUMID, ValueKind::Text),
        ItemKey::MusicBrainzReleaseArtistId => (tags::MUSICBRAINZ_ALBUMARTISTID, ValueKind::Text),
        _ => return None,
    };
    Some(mapped)
}

// "3/12" carries the total as well.
fn add_number(list: &mut TagList, name: &'static str, text: &str) {
    let mut parts = text.splitn(2, '/');
    if let Some(number) = parts.next().and_then(leading_number) {
        list.add(name, number);
    }
    let total_name = match name {
        tags::TRACK_NUMBER => tags::TRACK_COUNT,
        tags::ALBUM_DISC_NUMBER => tags::ALBUM_DISC_COUNT,
        _ => return,
    };
    if let Some(total) = parts.next().and_then(leading_number) {
        list.add(total_name, total);
    }
}

fn leading_number(text: &str) -> Option<u32> {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Reads `YYYY`, `YYYY-MM` or `YYYY-MM-DD` (anything after the day is
/// ignored). Missing month or day default to the first.
fn parse_date(text: &str) -> Option<Date> {
    let mut parts = text.splitn(3, '-');
    let year = parse_year(parts.next()?)?;
    let month = match parts.next() {
        Some(part) => Month::try_from(u8::try_from(leading_number(part)?).ok()?).ok()?,
        None => Month::January,
    };
    let day = match parts.next() {
        Some(part) => u8::try_from(leading_number(part)?).ok()?,
        None => 1,
    };
    Date::from_calendar_date(year, month, day).ok()
}

fn parse_year(text: &str) -> Option<i32> {
    let mut digits = String::new();
    for ch in text.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            if digits.len() == 4 {
                break;
            }
        } else if !digits.is_empty() {
            break;
        }
    }
    if digits.len() == 4 {
        digits.parse().ok()
    } else {
        None
    }
}
