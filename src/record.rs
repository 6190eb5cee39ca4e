// Module Record contains the music record entity and the payloads that create or modify one
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{FieldErrors, ValidationError};

/// Text columns are `VARCHAR(255)`
pub const MAX_TEXT_LEN: usize = 255;

const MISSING: &str = "Missing data for required field.";
const NULL: &str = "Field may not be null.";
const NOT_A_STRING: &str = "Not a valid string.";
const EMPTY: &str = "Field may not be empty.";
const TOO_LONG: &str = "Longer than maximum length 255.";
const NOT_A_DATE: &str = "Not a valid date.";
const UNKNOWN: &str = "Unknown field.";

// `id` is accepted so clients can send back a record they fetched, but it is never read
const KNOWN_FIELDS: [&str; 6] = ["id", "title", "artist", "album", "release_date", "genre"];

/// A stored row of the `music_library` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MusicRecord {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub release_date: NaiveDate,
    pub genre: String,
}

/// A validated creation payload; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMusicRecord {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub release_date: NaiveDate,
    pub genre: String,
}

impl NewMusicRecord {
    pub fn new(title: &str, artist: &str, album: &str, release_date: NaiveDate, genre: &str) -> Self {
        Self {
            title: title.to_owned(),
            artist: artist.to_owned(),
            album: album.to_owned(),
            release_date,
            genre: genre.to_owned(),
        }
    }

    /// Validates a POST body. Every field is required and all problems are reported at once.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let mut reader = PayloadReader::new(payload)?;
        let title = reader.text("title", true);
        let artist = reader.text("artist", true);
        let album = reader.text("album", true);
        let release_date = reader.date("release_date", true);
        let genre = reader.text("genre", true);

        let (Some(title), Some(artist), Some(album), Some(release_date), Some(genre)) =
            (title, artist, album, release_date, genre)
        else {
            return Err(reader.into_error());
        };
        reader.finish()?;

        Ok(Self {
            title,
            artist,
            album,
            release_date,
            genre,
        })
    }
}

/// The fields supplied to a PUT; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MusicRecordPatch {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub genre: Option<String>,
}

impl MusicRecordPatch {
    /// Validates a PUT body with the same per-field rules as creation, minus presence.
    pub fn from_json(payload: &Value) -> Result<Self, ValidationError> {
        let mut reader = PayloadReader::new(payload)?;
        let patch = Self {
            title: reader.text("title", false),
            artist: reader.text("artist", false),
            album: reader.text("album", false),
            release_date: reader.date("release_date", false),
            genre: reader.text("genre", false),
        };
        reader.finish()?;
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// Reads named fields out of a JSON object, collecting every problem it finds
struct PayloadReader<'a> {
    object: &'a Map<String, Value>,
    errors: FieldErrors,
}

impl<'a> PayloadReader<'a> {
    fn new(payload: &'a Value) -> Result<Self, ValidationError> {
        let object = payload.as_object().ok_or_else(ValidationError::invalid_input)?;
        let mut errors = FieldErrors::new();
        for key in object.keys() {
            if !KNOWN_FIELDS.contains(&key.as_str()) {
                errors.entry(key.clone()).or_default().push(UNKNOWN.to_owned());
            }
        }
        Ok(Self { object, errors })
    }

    fn text(&mut self, field: &str, required: bool) -> Option<String> {
        match self.present(field, required)? {
            Value::String(text) if text.trim().is_empty() => self.reject(field, EMPTY),
            Value::String(text) if text.chars().count() > MAX_TEXT_LEN => self.reject(field, TOO_LONG),
            Value::String(text) => Some(text.clone()),
            _ => self.reject(field, NOT_A_STRING),
        }
    }

    fn date(&mut self, field: &str, required: bool) -> Option<NaiveDate> {
        let parsed = match self.present(field, required)? {
            // chrono accepts single digit months and days, the wire format does not
            Value::String(text) if text.len() == 10 => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
            _ => None,
        };
        parsed.or_else(|| self.reject(field, NOT_A_DATE))
    }

    fn present(&mut self, field: &str, required: bool) -> Option<&'a Value> {
        let object: &'a Map<String, Value> = self.object;
        match object.get(field) {
            None if required => self.reject(field, MISSING),
            None => None,
            Some(Value::Null) => self.reject(field, NULL),
            Some(value) => Some(value),
        }
    }

    fn reject<T>(&mut self, field: &str, message: &str) -> Option<T> {
        self.errors
            .entry(field.to_owned())
            .or_default()
            .push(message.to_owned());
        None
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.into_error())
        }
    }

    fn into_error(self) -> ValidationError {
        ValidationError(self.errors)
    }
}
