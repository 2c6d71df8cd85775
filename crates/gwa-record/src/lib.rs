//! Codec for GWA protocol records.
//!
//! A record is one line of positional fields. The first field is the
//! keyword, optionally preceded by a `SET` or `SET_AT <index>` verb and
//! optionally carrying a version suffix and a block of cross-system tags:
//!
//! ```text
//! SET    NODE.3:{speckle_app_id:n1}    1    base    NO_RGB    0    0    0 ...
//! SET_AT 4    LOAD_NODE.3    "" 1 to 3    1    GLOBAL ...
//! ```

mod codes;
mod color;
mod list;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use codes::{format_restraint, parse_release_code, parse_restraint};
pub use color::Color;
pub use list::{MAX_RANGE_LEN, format_handle_list, parse_handle_list};

/// Tag carrying the application id of the entity on the other side.
pub const APP_ID_TAG: &str = "speckle_app_id";
/// Tag carrying the id of the stream the entity was last sent from.
pub const STREAM_ID_TAG: &str = "speckle_stream_id";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("empty record")]
    Empty,

    #[error("malformed keyword block `{0}`")]
    Keyword(String),

    #[error("SET_AT without a numeric index: `{0}`")]
    MissingIndex(String),

    #[error("{keyword}: expected at least {expected} fields, found {found}")]
    FieldCount {
        keyword: String,
        expected: usize,
        found: usize,
    },

    #[error("{keyword}: field {index} `{value}` is not a valid {expected}")]
    FieldType {
        keyword: String,
        index: usize,
        value: String,
        expected: &'static str,
    },

    #[error("{keyword}: unknown token `{value}`")]
    UnknownToken { keyword: String, value: String },

    #[error("malformed colour `{0}`")]
    Color(String),

    #[error("malformed restraint code `{0}`")]
    Restraint(String),

    #[error("malformed release code `{0}`")]
    Release(String),

    #[error("malformed handle list `{0}`")]
    HandleList(String),

    #[error("unknown named list `{0}`")]
    UnknownList(String),
}

pub type Result<T> = std::result::Result<T, RecordError>;

/// Numeric identifier of an entity within its kind on the protocol side.
///
/// `Handle::UNSET` (zero) marks an entity that has not been given one yet.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Handle(pub u32);

impl Handle {
    pub const UNSET: Handle = Handle(0);

    pub fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Handle {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u32>().map(Handle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Bare record, as returned by query replies.
    None,
    Set,
    SetAt(Handle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GwaRecord {
    pub verb: Verb,
    pub keyword: String,
    pub version: Option<u32>,
    /// Cross-system tags in the order they appeared.
    pub tags: Vec<(String, String)>,
    /// Positional fields following the keyword.
    pub fields: Vec<String>,
}

/// The identity-carrying parts of a record, split from its positional body.
#[derive(Debug, Clone, PartialEq)]
pub struct SidParts {
    pub keyword: String,
    pub version: Option<u32>,
    pub index: Option<Handle>,
    pub stream_id: Option<String>,
    pub application_id: Option<String>,
    /// The record without verb, index or tags.
    pub remainder: String,
}

impl GwaRecord {
    pub fn new(keyword: impl Into<String>, version: Option<u32>) -> Self {
        Self {
            verb: Verb::None,
            keyword: keyword.into(),
            version,
            tags: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(RecordError::Empty);
        }
        let mut fields = split_fields(line);

        let head = fields[0].to_ascii_uppercase();
        let (verb, keyword_at) = match head.as_str() {
            "SET" => (Verb::Set, 1),
            "SET_AT" => {
                let index = fields
                    .get(1)
                    .and_then(|f| f.parse::<Handle>().ok())
                    .ok_or_else(|| RecordError::MissingIndex(line.to_string()))?;
                (Verb::SetAt(index), 2)
            }
            _ => (Verb::None, 0),
        };

        if fields.len() <= keyword_at {
            return Err(RecordError::Keyword(line.to_string()));
        }
        let rest = fields.split_off(keyword_at + 1);
        let (keyword, version, tags) = parse_keyword_block(&fields[keyword_at])?;

        Ok(Self {
            verb,
            keyword,
            version,
            tags,
            fields: rest,
        })
    }

    pub fn encode(&self) -> String {
        let mut out = Vec::with_capacity(self.fields.len() + 3);
        match self.verb {
            Verb::None => {}
            Verb::Set => out.push("SET".to_string()),
            Verb::SetAt(index) => {
                out.push("SET_AT".to_string());
                out.push(index.to_string());
            }
        }
        out.push(self.keyword_block());
        out.extend(self.fields.iter().cloned());
        join_fields(&out)
    }

    fn keyword_block(&self) -> String {
        let mut block = self.keyword.clone();
        if let Some(version) = self.version {
            block.push_str(&format!(".{version}"));
        }
        if !self.tags.is_empty() {
            block.push(':');
            for (key, value) in &self.tags {
                block.push_str(&format!("{{{key}:{value}}}"));
            }
        }
        block
    }

    pub fn with_verb(mut self, verb: Verb) -> Self {
        self.verb = verb;
        self
    }

    /// Adds or replaces a tag, skipping empty values.
    pub fn set_tag(&mut self, key: &str, value: Option<&str>) {
        self.tags.retain(|(k, _)| k != key);
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.tags.push((key.to_string(), value.to_string()));
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn application_id(&self) -> Option<&str> {
        self.tag(APP_ID_TAG)
    }

    pub fn stream_id(&self) -> Option<&str> {
        self.tag(STREAM_ID_TAG)
    }

    pub fn push(&mut self, field: impl ToString) -> &mut Self {
        self.fields.push(field.to_string());
        self
    }

    /// Pushes a name or other free text, quoting it when it holds a delimiter
    /// or edge whitespace.
    ///
    /// The format has no escape for `"`, so embedded double quotes are
    /// written as `'` and such text does not read back unchanged.
    pub fn push_text(&mut self, text: &str) -> &mut Self {
        let text = text.replace('"', "'");
        if text.contains(['\t', ',']) || text.is_empty() || text.trim() != text {
            self.fields.push(format!("\"{text}\""));
        } else {
            self.fields.push(text);
        }
        self
    }

    pub fn push_color(&mut self, color: Option<Color>) -> &mut Self {
        self.fields.push(Color::encode(color));
        self
    }

    pub fn expect_len(&self, expected: usize) -> Result<()> {
        if self.fields.len() < expected {
            return Err(RecordError::FieldCount {
                keyword: self.keyword.clone(),
                expected,
                found: self.fields.len(),
            });
        }
        Ok(())
    }

    pub fn field(&self, index: usize) -> Result<&str> {
        self.fields
            .get(index)
            .map(|s| s.as_str())
            .ok_or_else(|| RecordError::FieldCount {
                keyword: self.keyword.clone(),
                expected: index + 1,
                found: self.fields.len(),
            })
    }

    pub fn text(&self, index: usize) -> Result<String> {
        self.field(index).map(|s| unquote(s).to_string())
    }

    pub fn float(&self, index: usize) -> Result<f64> {
        self.typed(index, "number")
    }

    pub fn handle(&self, index: usize) -> Result<Handle> {
        self.typed(index, "handle")
    }

    pub fn int(&self, index: usize) -> Result<i64> {
        self.typed(index, "integer")
    }

    /// Integer field that may not be negative, such as a group number.
    pub fn unsigned(&self, index: usize) -> Result<u32> {
        self.typed(index, "non-negative integer")
    }

    pub fn color(&self, index: usize) -> Result<Option<Color>> {
        Color::decode(self.field(index)?)
    }

    fn typed<T: FromStr>(&self, index: usize, expected: &'static str) -> Result<T> {
        let raw = self.field(index)?;
        raw.trim().parse::<T>().map_err(|_| RecordError::FieldType {
            keyword: self.keyword.clone(),
            index,
            value: raw.to_string(),
            expected,
        })
    }

    pub fn unknown_token(&self, value: &str) -> RecordError {
        RecordError::UnknownToken {
            keyword: self.keyword.clone(),
            value: value.to_string(),
        }
    }
}

impl Display for GwaRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Splits a record into identity parts and the untagged remainder.
///
/// Tolerates records without a verb or tag block, as returned by queries.
/// The index is the `SET_AT` argument, otherwise the first positional field
/// when it is numeric.
pub fn extract_sid(line: &str) -> Result<SidParts> {
    let record = GwaRecord::parse(line)?;
    let index = match record.verb {
        Verb::SetAt(index) => Some(index),
        _ => record
            .fields
            .first()
            .and_then(|f| f.parse::<Handle>().ok()),
    };
    let remainder = GwaRecord {
        verb: Verb::None,
        tags: Vec::new(),
        ..record.clone()
    }
    .encode();

    Ok(SidParts {
        keyword: record.keyword.clone(),
        version: record.version,
        index,
        stream_id: record.stream_id().map(str::to_string),
        application_id: record.application_id().map(str::to_string),
        remainder,
    })
}

/// Splits on tabs when the record has any, otherwise on commas. Quoted
/// substrings are kept whole, quotes included.
pub fn split_fields(record: &str) -> Vec<String> {
    let delimiter = if record.contains('\t') { '\t' } else { ',' };
    let mut fields = Vec::<String>::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in record.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                current.push(ch);
            }
            c if c == delimiter && !quoted => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

pub fn join_fields(fields: &[String]) -> String {
    fields.join("\t")
}

pub fn unquote(field: &str) -> &str {
    let trimmed = field.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
}

fn parse_keyword_block(block: &str) -> Result<(String, Option<u32>, Vec<(String, String)>)> {
    let malformed = || RecordError::Keyword(block.to_string());
    let (head, tag_block) = match block.split_once(':') {
        Some((head, tags)) => (head, Some(tags)),
        None => (block, None),
    };

    let (keyword, version) = match head.split_once('.') {
        Some((keyword, version)) => {
            let version = version.parse::<u32>().map_err(|_| malformed())?;
            (keyword, Some(version))
        }
        None => (head, None),
    };
    let keyword = keyword.trim();
    if keyword.is_empty() || keyword.contains(char::is_whitespace) {
        return Err(malformed());
    }

    let mut tags = Vec::new();
    if let Some(mut rest) = tag_block {
        while !rest.is_empty() {
            let body = rest.strip_prefix('{').ok_or_else(malformed)?;
            let end = body.find('}').ok_or_else(malformed)?;
            let (key, value) = body[..end].split_once(':').ok_or_else(malformed)?;
            tags.push((key.to_string(), value.to_string()));
            rest = &body[end + 1..];
        }
    }

    Ok((keyword.to_ascii_uppercase(), version, tags))
}
