use std::collections::BTreeMap;
use std::fmt;

use time::Date;

pub const TITLE: &str = "title";
pub const ORGANIZATION: &str = "organization";
pub const ARTIST: &str = "artist";
pub const ALBUM_ARTIST: &str = "album-artist";
pub const COMPOSER: &str = "composer";
pub const PERFORMER: &str = "performer";
pub const ALBUM: &str = "album";
pub const GENRE: &str = "genre";
pub const COMMENT: &str = "comment";
pub const LOCATION: &str = "location";
pub const COPYRIGHT: &str = "copyright";
pub const DATE: &str = "date";
pub const TRACK_NUMBER: &str = "track-number";
pub const TRACK_COUNT: &str = "track-count";
pub const ALBUM_DISC_NUMBER: &str = "album-disc-number";
pub const ALBUM_DISC_COUNT: &str = "album-disc-count";
pub const BITRATE: &str = "bitrate";
pub const ENCODER: &str = "encoder";
pub const LYRICS: &str = "lyrics";
pub const MUSICBRAINZ_TRACKID: &str = "musicbrainz-trackid";
pub const MUSICBRAINZ_ARTISTID: &str = "musicbrainz-artistid";
pub const MUSICBRAINZ_ALBUMID: &str = "musicbrainz-albumid";
pub const MUSICBRAINZ_ALBUMARTISTID: &str = "musicbrainz-albumartistid";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagValue {
    Text(String),
    UInt(u32),
    Date(Date),
}

impl TagValue {
    /// Numeric view of the value. Text is accepted when it holds a plain
    /// number, which is how some containers store track numbers.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            TagValue::UInt(value) => Some(*value),
            TagValue::Text(text) => text.trim().parse().ok(),
            TagValue::Date(_) => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Text(text) => f.write_str(text),
            TagValue::UInt(value) => write!(f, "{}", value),
            TagValue::Date(date) => f.write_str(&iso_date(date)),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Text(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Text(value)
    }
}

impl From<u32> for TagValue {
    fn from(value: u32) -> Self {
        TagValue::UInt(value)
    }
}

impl From<Date> for TagValue {
    fn from(value: Date) -> Self {
        TagValue::Date(value)
    }
}

pub fn iso_date(date: &Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// The payload of a single tag message. A name may carry several values; a
/// name never appears twice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagList {
    entries: Vec<(String, Vec<TagValue>)>,
}

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, name: &str, value: impl Into<TagValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| key == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name.to_string(), vec![value])),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<TagValue>) -> Self {
        self.add(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[TagValue]> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, values)| values.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl IntoIterator for TagList {
    type Item = (String, Vec<TagValue>);
    type IntoIter = std::vec::IntoIter<(String, Vec<TagValue>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Tags collected over one scan, keyed by tag name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TagMap {
    tags: BTreeMap<String, Vec<TagValue>>,
}

impl TagMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a tag message into the map. Each name in `list` replaces the
    /// whole sequence stored under that name; values are never accumulated
    /// across messages.
    pub fn merge(&mut self, list: TagList) {
        for (name, values) in list {
            self.tags.insert(name, values);
        }
    }

    pub fn get(&self, name: &str) -> Option<&[TagValue]> {
        self.tags.get(name).map(|values| values.as_slice())
    }

    pub fn first(&self, name: &str) -> Option<&TagValue> {
        self.get(name).and_then(|values| values.first())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Vec<TagValue>)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, Vec<TagValue>)>>(iter: I) -> Self {
        let tags = iter
            .into_iter()
            .map(|(name, values)| (name.into(), values))
            .collect();
        Self { tags }
    }
}
