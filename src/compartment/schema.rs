//! Strict schema checks over a generic JSON value tree.
//!
//! Parsing happens in two steps: the text is read into a [`serde_json::Value`]
//! and the typed constructors then descend into it with the helpers below,
//! threading a [`JsonPath`] so every error names the exact place that failed.
//! Nothing is coerced: a numeric string is not a number, a float is not an
//! integer.

use serde_json::{Map, Value};

use super::error::{CompartmentError, CompartmentResult};

/// Number of elements in a serialized compartment location.
pub const LOCATION_ARITY: usize = 3;

/// Largest node id or section index. Ids are signed 64-bit on disk.
pub const MAX_ID: u64 = i64::MAX as u64;

/// One step into a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// A user-chosen object key (compartment set name).
    Key(String),
    /// A fixed schema field.
    Field(&'static str),
    Index(usize),
}

/// Location of a value inside a compartment sets document, e.g.
/// `$["cs0"].compartment_set[3][2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// The document root, displayed as `$`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Descend into a user-named key.
    pub fn key(&self, key: &str) -> Self {
        self.push(Segment::Key(key.to_string()))
    }

    /// Descend into a schema field.
    pub fn field(&self, field: &'static str) -> Self {
        self.push(Segment::Field(field))
    }

    /// Descend into an array element.
    pub fn index(&self, index: usize) -> Self {
        self.push(Segment::Index(index))
    }

    /// The compartment set name this path runs through, if any.
    pub fn set_name(&self) -> Option<&str> {
        self.segments.iter().find_map(|s| match s {
            Segment::Key(k) => Some(k.as_str()),
            _ => None,
        })
    }

    /// The innermost array index on this path, if any.
    pub fn element_index(&self) -> Option<usize> {
        self.segments.iter().rev().find_map(|s| match s {
            Segment::Index(i) => Some(*i),
            _ => None,
        })
    }

    fn push(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl std::fmt::Display for JsonPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            match segment {
                Segment::Key(k) => write!(f, "[{k:?}]")?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(i) => write!(f, "[{i}]")?,
            }
        }
        Ok(())
    }
}

/// Parse JSON text into a value tree. Surrounding whitespace is accepted.
pub fn parse_document(text: &str) -> CompartmentResult<Value> {
    serde_json::from_str(text).map_err(|e| CompartmentError::InvalidJson {
        message: e.to_string(),
    })
}

/// Human name of a JSON value's type, used in error messages.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn expect_object<'a>(value: &'a Value, path: &JsonPath) -> CompartmentResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| CompartmentError::NotAnObject {
        path: path.clone(),
        found: type_name(value),
    })
}

pub fn expect_array<'a>(value: &'a Value, path: &JsonPath) -> CompartmentResult<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| CompartmentError::NotAnArray {
            path: path.clone(),
            found: type_name(value),
        })
}

pub fn expect_string<'a>(value: &'a Value, path: &JsonPath) -> CompartmentResult<&'a str> {
    value.as_str().ok_or_else(|| CompartmentError::NotAString {
        path: path.clone(),
        found: type_name(value),
    })
}

/// Look up a mandatory key of `object`.
pub fn required<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
    path: &JsonPath,
) -> CompartmentResult<&'a Value> {
    object.get(field).ok_or_else(|| CompartmentError::MissingField {
        path: path.clone(),
        field,
    })
}

/// A non-negative JSON integer. Floats (even `1.0`) and strings are rejected.
pub fn expect_u64(value: &Value, field: &'static str, path: &JsonPath) -> CompartmentResult<u64> {
    let Value::Number(n) = value else {
        return Err(CompartmentError::NotAnInteger {
            path: path.clone(),
            found: value.to_string(),
        });
    };
    if let Some(v) = n.as_u64() {
        return check_id(v, field, Some(path));
    }
    match n.as_i64() {
        Some(v) => Err(CompartmentError::NegativeId {
            path: path.clone(),
            field,
            value: v,
        }),
        None => Err(CompartmentError::NotAnInteger {
            path: path.clone(),
            found: n.to_string(),
        }),
    }
}

/// Reject ids above [`MAX_ID`]. `path` is `None` outside of a document.
pub fn check_id(value: u64, field: &'static str, path: Option<&JsonPath>) -> CompartmentResult<u64> {
    if value > MAX_ID {
        return Err(CompartmentError::IdOutOfRange {
            path: path.cloned(),
            field,
            value,
            max: MAX_ID,
        });
    }
    Ok(value)
}

/// Any JSON number, integer or float.
pub fn expect_number(value: &Value, path: &JsonPath) -> CompartmentResult<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| CompartmentError::NotANumber {
            path: path.clone(),
            found: n.to_string(),
        }),
        other => Err(CompartmentError::NotANumber {
            path: path.clone(),
            found: other.to_string(),
        }),
    }
}
