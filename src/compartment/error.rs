//! Compartment-specific error types with rich diagnostics.

use miette::Diagnostic;
use thiserror::Error;

use super::schema::JsonPath;

/// Coarse classification of a [`CompartmentError`].
///
/// Validation and I/O failures happen while building a value; lookup and
/// index failures only come from accessors on already-valid values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Io,
    Lookup,
    Index,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Io => write!(f, "io"),
            Self::Lookup => write!(f, "lookup"),
            Self::Index => write!(f, "index"),
        }
    }
}

/// Errors arising from parsing, loading, or accessing compartment sets.
#[derive(Debug, Error, Diagnostic)]
pub enum CompartmentError {
    #[error("malformed JSON: {message}")]
    #[diagnostic(
        code(sonata::compartment::invalid_json),
        help("The input is not well-formed JSON. Check for trailing commas and unquoted keys.")
    )]
    InvalidJson { message: String },

    #[error("{path}: expected an object, got {found}")]
    #[diagnostic(
        code(sonata::compartment::not_an_object),
        help(
            "Compartment sets are a JSON object keyed by set name, and every set is an \
             object with \"population\" and \"compartment_set\" keys."
        )
    )]
    NotAnObject { path: JsonPath, found: &'static str },

    #[error("{path}: missing required key \"{field}\"")]
    #[diagnostic(
        code(sonata::compartment::missing_field),
        help("Every compartment set needs both \"population\" and \"compartment_set\".")
    )]
    MissingField { path: JsonPath, field: &'static str },

    #[error("{path}: expected a string, got {found}")]
    #[diagnostic(
        code(sonata::compartment::not_a_string),
        help("The population must be given as a JSON string, e.g. \"population\": \"pop0\".")
    )]
    NotAString { path: JsonPath, found: &'static str },

    #[error("{}population name is empty", located(.path))]
    #[diagnostic(
        code(sonata::compartment::empty_population),
        help("Name the node population the locations belong to.")
    )]
    EmptyPopulation { path: Option<JsonPath> },

    #[error("{path}: expected an array, got {found}")]
    #[diagnostic(
        code(sonata::compartment::not_an_array),
        help(
            "\"compartment_set\" is an array of locations and each location is an \
             array [node_id, section_index, offset]."
        )
    )]
    NotAnArray { path: JsonPath, found: &'static str },

    #[error("{path}: expected {expected} elements, got {actual}")]
    #[diagnostic(
        code(sonata::compartment::wrong_arity),
        help("A compartment location has exactly three elements: [node_id, section_index, offset].")
    )]
    WrongArity {
        path: JsonPath,
        expected: usize,
        actual: usize,
    },

    #[error("{path}: expected an unsigned integer, got {found}")]
    #[diagnostic(
        code(sonata::compartment::not_an_integer),
        help("Node ids and section indices are written as plain JSON integers, without quotes or decimals.")
    )]
    NotAnInteger { path: JsonPath, found: String },

    #[error("{path}: {field} must be non-negative, got {value}")]
    #[diagnostic(
        code(sonata::compartment::negative_id),
        help("Node ids and section indices start at 0.")
    )]
    NegativeId {
        path: JsonPath,
        field: &'static str,
        value: i64,
    },

    #[error("{}{field} {value} is out of range, the largest id is {max}", located(.path))]
    #[diagnostic(
        code(sonata::compartment::id_out_of_range),
        help("Node ids and section indices are stored as signed 64-bit integers, so they cannot exceed 9223372036854775807.")
    )]
    IdOutOfRange {
        path: Option<JsonPath>,
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("{path}: expected a number, got {found}")]
    #[diagnostic(
        code(sonata::compartment::not_a_number),
        help("The offset is a JSON number between 0 and 1.")
    )]
    NotANumber { path: JsonPath, found: String },

    #[error("{}offset must be between 0 and 1 inclusive, got {offset}", located(.path))]
    #[diagnostic(
        code(sonata::compartment::offset_out_of_range),
        help("The offset is the normalized position along the section: 0 is the start, 1 the end.")
    )]
    OffsetOutOfRange { path: Option<JsonPath>, offset: f64 },

    #[error("cannot read compartment sets file {path}: {source}")]
    #[diagnostic(
        code(sonata::compartment::io),
        help("Check that the path exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("compartment set not found: \"{key}\"")]
    #[diagnostic(
        code(sonata::compartment::key_not_found),
        help("List the available names with `names()` or `keys()`, or test with `contains()` first.")
    )]
    KeyNotFound { key: String },

    #[error("index {index} out of range for compartment set of length {len}")]
    #[diagnostic(
        code(sonata::compartment::index_out_of_range),
        help("Valid indices are -len..len; negative indices count from the end.")
    )]
    IndexOutOfRange { index: isize, len: usize },
}

impl CompartmentError {
    /// Which family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } => ErrorKind::Io,
            Self::KeyNotFound { .. } => ErrorKind::Lookup,
            Self::IndexOutOfRange { .. } => ErrorKind::Index,
            _ => ErrorKind::Validation,
        }
    }

    /// Shorthand for `kind() == ErrorKind::Validation`.
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// `"<path>: "` when the error was raised while walking a document.
fn located(path: &Option<JsonPath>) -> String {
    path.as_ref().map(|p| format!("{p}: ")).unwrap_or_default()
}

/// Result type for compartment operations.
pub type CompartmentResult<T> = Result<T, CompartmentError>;
