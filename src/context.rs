//! Data context driving a document build.
//!
//! The payload is a mapping whose outer collection (`images` by default)
//! holds one record per report unit. Record fields are scalars, styled
//! mappings (`{ "_": display, "bckClr": colour }`) or collections of styled
//! mappings whose length drives inner clone multiplicity.
//!
//! # Example
//!
//! ```
//! use kumquat::context::{DataContext, Value};
//!
//! let data = DataContext::from_json_str(r#"{
//!     "title": "Site survey",
//!     "images": [
//!         { "location": "Gate A", "hazard": [ { "_": "Trip", "bckClr": "FFC000" } ] }
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(data.get("title"), Some(&Value::Scalar("Site survey".into())));
//! let item = &data.items("images").unwrap()[0];
//! assert_eq!(item.field("hazard").and_then(Value::collection_len), Some(1));
//! ```
use crate::common::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Display field of a styled mapping.
pub const DISPLAY_FIELD: &str = "_";
/// Background colour field of a styled mapping.
pub const COLOR_FIELD: &str = "bckClr";

/// Named fields of a mapping.
pub type Record = BTreeMap<String, Value>;

/// A resolved data value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "serde_json::Value")]
pub enum Value {
    /// Plain display text
    Scalar(String),
    /// Display text with an optional background colour
    Styled {
        text: Option<String>,
        color: Option<String>,
    },
    /// Ordered collection, e.g. the hazards of one report unit
    Collection(Vec<Value>),
    /// A report unit of the outer collection
    Record(Record),
}

impl Value {
    /// Length of a collection value, `None` for anything else.
    pub fn collection_len(&self) -> Option<usize> {
        match self {
            Value::Collection(items) => Some(items.len()),
            _ => None,
        }
    }

    /// Check whether this value is a collection.
    #[inline]
    pub fn is_collection(&self) -> bool {
        matches!(self, Value::Collection(_))
    }

    /// Element of a collection value.
    pub fn index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Collection(items) => items.get(index),
            _ => None,
        }
    }

    /// Text a cell shows for this value: the scalar itself or the display
    /// field of a styled mapping.
    pub fn display_text(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            Value::Styled { text, .. } => text.as_deref(),
            Value::Collection(_) | Value::Record(_) => None,
        }
    }

    /// Field of a record value.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.get(key),
            _ => None,
        }
    }

    fn from_json(value: serde_json::Value, records: bool) -> Option<Self> {
        use serde_json::Value as Json;
        match value {
            Json::Null => None,
            Json::Bool(b) => Some(Value::Scalar(b.to_string())),
            Json::Number(n) => Some(Value::Scalar(n.to_string())),
            Json::String(s) => Some(Value::Scalar(s)),
            Json::Array(items) => Some(Value::Collection(
                items
                    .into_iter()
                    .map(|item| Value::from_json(item, records).unwrap_or_else(Value::empty))
                    .collect(),
            )),
            Json::Object(map) if records => Some(Value::Record(record_from_json(map))),
            Json::Object(mut map) => Some(Value::Styled {
                text: map.remove(DISPLAY_FIELD).and_then(json_text),
                color: map.remove(COLOR_FIELD).and_then(json_text),
            }),
        }
    }

    fn empty() -> Self {
        Value::Styled {
            text: None,
            color: None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::from_json(value, false).unwrap_or_else(Value::empty)
    }
}

fn json_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn record_from_json(map: serde_json::Map<String, serde_json::Value>) -> Record {
    map.into_iter()
        .filter_map(|(key, value)| Value::from_json(value, false).map(|v| (key, v)))
        .collect()
}

/// The data payload of one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataContext {
    fields: Record,
}

impl DataContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a context from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_json_value(serde_json::from_str(json)?)
    }

    /// Build a context from a JSON value, which must be an object.
    ///
    /// Objects inside top-level arrays become [`Value::Record`]s, so every
    /// collection field of the payload can serve as an outer collection.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(Error::InvalidData(
                "data context must be a JSON object".to_string(),
            ));
        };
        let fields = map
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    serde_json::Value::Array(_) => Value::from_json(value, true),
                    other => Value::from_json(other, false),
                };
                value.map(|v| (key, v))
            })
            .collect();
        Ok(Self { fields })
    }

    /// Builder: set a top-level field.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    /// Top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Items of a top-level collection, `None` when the field is absent or
    /// not a collection.
    pub fn items(&self, collection: &str) -> Option<&[Value]> {
        match self.fields.get(collection)? {
            Value::Collection(items) => Some(items),
            _ => None,
        }
    }
}
