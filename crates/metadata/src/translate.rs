use common::{Album, Artist, Track};

use crate::tags::{
    iso_date, TagMap, TagValue, ALBUM, ALBUM_ARTIST, ALBUM_DISC_COUNT, ALBUM_DISC_NUMBER, ARTIST,
    BITRATE, COMMENT, COMPOSER, COPYRIGHT, DATE, GENRE, LOCATION, MUSICBRAINZ_ALBUMARTISTID,
    MUSICBRAINZ_ALBUMID, MUSICBRAINZ_ARTISTID, MUSICBRAINZ_TRACKID, ORGANIZATION, PERFORMER,
    TITLE, TRACK_COUNT, TRACK_NUMBER,
};

const JOIN_SEP: &str = "; ";

/// Builds a track from the tags collected by a scan. Values that come out
/// empty or zero are left unset.
pub fn tags_to_track(tags: &TagMap) -> Track {
    let mut name = join(tags, TITLE);
    if name.is_empty() {
        name = join(tags, ORGANIZATION);
    }

    let mut comment = join(tags, COMMENT);
    if comment.is_empty() {
        comment = join(tags, LOCATION);
    }
    if comment.is_empty() {
        comment = join(tags, COPYRIGHT);
    }

    let album = Album {
        name: first_text(tags, ALBUM),
        artists: artists(tags, ALBUM_ARTIST, Some(MUSICBRAINZ_ALBUMARTISTID)),
        num_tracks: first_number(tags, TRACK_COUNT),
        num_discs: first_number(tags, ALBUM_DISC_COUNT),
        musicbrainz_id: first_text(tags, MUSICBRAINZ_ALBUMID),
        ..Album::default()
    };

    Track {
        name: non_empty(name),
        artists: artists(tags, ARTIST, Some(MUSICBRAINZ_ARTISTID)),
        album: Some(album),
        composers: artists(tags, COMPOSER, None),
        performers: artists(tags, PERFORMER, None),
        genre: non_empty(join(tags, GENRE)),
        track_no: first_number(tags, TRACK_NUMBER),
        disc_no: first_number(tags, ALBUM_DISC_NUMBER),
        date: release_date(tags),
        bitrate: first_number(tags, BITRATE),
        comment: non_empty(comment),
        musicbrainz_id: first_text(tags, MUSICBRAINZ_TRACKID),
        ..Track::default()
    }
}

/// A single name paired with an id tag yields one identified artist, using
/// the first id even if several are present. Several names never get ids.
fn artists(tags: &TagMap, name_key: &str, id_key: Option<&str>) -> Vec<Artist> {
    let names = match tags.get(name_key) {
        Some(names) if !names.is_empty() => names,
        _ => return Vec::new(),
    };

    if names.len() == 1 {
        if let Some(ids) = id_key.and_then(|key| tags.get(key)) {
            let mut artist = Artist::new(names[0].to_string());
            artist.musicbrainz_id = ids.first().map(ToString::to_string).and_then(non_empty);
            return vec![artist];
        }
    }

    names
        .iter()
        .map(|name| Artist::new(name.to_string()))
        .collect()
}

fn join(tags: &TagMap, name: &str) -> String {
    tags.get(name)
        .unwrap_or_default()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(JOIN_SEP)
}

fn first_text(tags: &TagMap, name: &str) -> Option<String> {
    tags.first(name).map(ToString::to_string).and_then(non_empty)
}

fn first_number(tags: &TagMap, name: &str) -> Option<u32> {
    tags.first(name)
        .and_then(TagValue::as_u32)
        .filter(|value| *value != 0)
}

fn release_date(tags: &TagMap) -> Option<String> {
    match tags.first(DATE)? {
        TagValue::Date(date) => Some(iso_date(date)),
        TagValue::Text(text) => non_empty(text.trim().to_string()),
        TagValue::UInt(_) => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
