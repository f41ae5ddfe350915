//! Inference-mode JSON records.
//!
//! At inference time every input line is one JSON object carrying the raw
//! text fields the factors read (`text`, `tok_text`, `subword_text`). The
//! pipeline enriches the object in place and writes it back out as a single
//! line. Malformed input is surfaced as an error; there is no recovery and no
//! default substitution.

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors reading or writing a JSON record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid JSON record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("JSON record is not an object")]
    NotAnObject,
    #[error("record is missing field \"{0}\"")]
    MissingField(String),
    #[error("record field \"{0}\" is not a string")]
    NotText(String),
}

/// One JSON object from an inference-mode stream.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Parse one input line. The document must be a JSON object.
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        match serde_json::from_str(line)? {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(RecordError::NotAnObject),
        }
    }

    /// A field's string content. Absent and non-string fields are distinct
    /// errors so a misrouted factor is diagnosable from the message.
    pub fn text_field(&self, name: &str) -> Result<&str, RecordError> {
        match self.fields.get(name) {
            Some(Value::String(text)) => Ok(text),
            Some(_) => Err(RecordError::NotText(name.to_string())),
            None => Err(RecordError::MissingField(name.to_string())),
        }
    }

    /// Set a field, replacing any existing value.
    pub fn insert(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    /// Serialize back to a single line. Non-ASCII text passes through
    /// unescaped.
    pub fn to_line(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(&self.fields)?)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
