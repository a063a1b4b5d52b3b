//  Copyright (c) 2020 Christopher Taylor
//
//  Distributed under the Boost Software License, Version 1.0. (See accompanying
//  file LICENSE_1_0.txt or copy at http://www.boost.org/LICENSE_1_0.txt)
//
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ParseWarning, PipelineError, Result};

// Formats seen in the article dumps, tried in order once the trailing
// "a"/"p" meridiem shorthand has been expanded.
//
const DATETIME_FORMATS: [&str; 6] = [
    "%b %d, %Y, %I:%M%p",
    "%B %d, %Y, %I:%M%p",
    "%b %d, %Y %I:%M%p",
    "%B %d, %Y %I:%M%p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
];

const DATE_FORMATS: [&str; 4] = ["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%m/%d/%Y"];

/// A news article.
///
/// `tokens` stays empty until the document has been through
/// [`clean`](crate::clean).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id : String,
    pub text : String,
    pub published : Option<NaiveDateTime>,
    pub tokens : Vec<String>,
}

impl Document {
    pub fn new(id : impl Into<String>, text : impl Into<String>) -> Self {
        Document { id : id.into(), text : text.into(), published : None, tokens : Vec::new() }
    }

    pub fn with_published(mut self, published : Option<NaiveDateTime>) -> Self {
        self.published = published;
        self
    }

    /// Builds a document from one raw JSON record.
    ///
    /// The identifier is read from `_id` (either a string or a `{"$oid": ..}`
    /// object) or `id`; `text` and `date` are required. A date that cannot be
    /// normalized leaves `published` empty and is reported as a
    /// [`ParseWarning`] instead of an error.
    pub fn from_record(record : &Value, label : &str) -> Result<(Document, Option<ParseWarning>)> {
        let object = record.as_object().ok_or_else(|| PipelineError::data(label, "record is not a JSON object"))?;

        let id = match object.get("_id").or_else(|| object.get("id")) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(oid)) => match oid.get("$oid") {
                Some(Value::String(s)) => s.clone(),
                _ => return Err(PipelineError::data(label, "`_id` object has no string `$oid`")),
            },
            Some(_) => return Err(PipelineError::data(label, "`_id` is neither a string nor an object")),
            None => return Err(PipelineError::data(label, "missing field `_id`")),
        };

        let text = match object.get("text") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(PipelineError::data(label, "`text` is not a string")),
            None => return Err(PipelineError::data(label, "missing field `text`")),
        };

        let raw_date = match object.get("date") {
            Some(Value::String(s)) => Some(s.as_str()),
            Some(Value::Null) => None,
            Some(_) => return Err(PipelineError::data(label, "`date` is not a string")),
            None => return Err(PipelineError::data(label, "missing field `date`")),
        };

        let (published, warning) = match raw_date {
            None => (None, None),
            Some(raw) => match normalize_date(raw) {
                Ok(published) => (published, None),
                Err(reason) => {
                    let warning = ParseWarning { document_id : id.clone(), field : "date", value : raw.to_string(), reason };
                    (None, Some(warning))
                }
            },
        };

        Ok((Document { id, text, published, tokens : Vec::new() }, warning))
    }
}

/// Normalizes a loosely formatted publication date.
///
/// `"NULL"` and blank strings are missing values, not failures. A trailing
/// `a` / `p` is read as AM / PM (`"Jan 5, 2017, 10:00a"`).
pub fn normalize_date(raw : &str) -> std::result::Result<Option<NaiveDateTime>, String> {
    let trimmed = raw.trim();

    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
        return Ok(None);
    }

    let expanded = if let Some(head) = trimmed.strip_suffix('a') {
        format!("{}AM", head)
    } else if let Some(head) = trimmed.strip_suffix('p') {
        format!("{}PM", head)
    } else {
        trimmed.to_string()
    };
    let candidate = expanded.trim_end_matches(',').trim_end();

    if let Ok(stamp) = DateTime::parse_from_rfc3339(candidate) {
        return Ok(Some(stamp.naive_utc()));
    }

    for format in DATETIME_FORMATS.iter() {
        if let Ok(stamp) = NaiveDateTime::parse_from_str(candidate, format) {
            return Ok(Some(stamp));
        }
    }

    for format in DATE_FORMATS.iter() {
        if let Ok(day) = NaiveDate::parse_from_str(candidate, format) {
            return Ok(day.and_hms_opt(0, 0, 0));
        }
    }

    Err(String::from("unrecognized date format"))
}
