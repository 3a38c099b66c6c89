//! Provider schema document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ReportError, ReportResult};

/// A provider schema as produced by the host tool.
///
/// The structure belongs to the producer; only `name` and `version` are
/// interpreted here. Key order is kept as parsed so the document can be
/// written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaDocument(Map<String, Value>);

impl SchemaDocument {
    /// Parse a schema from raw JSON bytes.
    ///
    /// Fails unless the input is a JSON object with non-empty string `name`
    /// and `version` fields.
    pub fn from_slice(bytes: &[u8]) -> ReportResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> ReportResult<Self> {
        let Value::Object(map) = value else {
            return Err(ReportError::InvalidSchema(
                "schema is not a JSON object".to_string(),
            ));
        };
        for field in ["name", "version"] {
            match map.get(field) {
                Some(Value::String(s)) if !s.is_empty() => {}
                _ => {
                    return Err(ReportError::InvalidSchema(format!(
                        "field `{}` is missing or not a non-empty string",
                        field
                    )))
                }
            }
        }
        Ok(Self(map))
    }

    pub fn name(&self) -> &str {
        self.str_field("name")
    }

    pub fn version(&self) -> &str {
        self.str_field("version")
    }

    fn str_field(&self, field: &str) -> &str {
        self.0.get(field).and_then(Value::as_str).unwrap_or_default()
    }

    /// The full document.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}
