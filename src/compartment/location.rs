//! A single point on a neuron morphology.

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::error::{CompartmentError, CompartmentResult};
use super::schema::{self, JsonPath, LOCATION_ARITY};

/// Offsets closer than this are treated as the same point by [`CompartmentLocation::approx_eq`].
pub const OFFSET_TOLERANCE: f64 = 1e-4;

/// A location on a cell: node id, absolute section index, and the normalized
/// offset along that section.
///
/// The offset always lies in `[0, 1]`, which also rules out NaN, so equality,
/// hashing and ordering are all exact and total.
#[derive(Clone, Copy)]
pub struct CompartmentLocation {
    gid: u64,
    section_idx: u64,
    offset: f64,
}

impl CompartmentLocation {
    /// Create a location, rejecting offsets outside `[0, 1]` and ids above
    /// [`MAX_ID`](schema::MAX_ID).
    pub fn new(gid: u64, section_idx: u64, offset: f64) -> CompartmentResult<Self> {
        let gid = schema::check_id(gid, "node id", None)?;
        let section_idx = schema::check_id(section_idx, "section index", None)?;
        let offset = checked_offset(offset, None)?;
        Ok(Self {
            gid,
            section_idx,
            offset,
        })
    }

    /// Parse a `[gid, section_idx, offset]` JSON array.
    pub fn from_json(text: &str) -> CompartmentResult<Self> {
        let value = schema::parse_document(text)?;
        Self::from_value(&value, &JsonPath::root())
    }

    pub(crate) fn from_value(value: &Value, path: &JsonPath) -> CompartmentResult<Self> {
        let elements = schema::expect_array(value, path)?;
        if elements.len() != LOCATION_ARITY {
            return Err(CompartmentError::WrongArity {
                path: path.clone(),
                expected: LOCATION_ARITY,
                actual: elements.len(),
            });
        }

        let gid = schema::expect_u64(&elements[0], "node id", &path.index(0))?;
        let section_idx = schema::expect_u64(&elements[1], "section index", &path.index(1))?;
        let offset_path = path.index(2);
        let offset = schema::expect_number(&elements[2], &offset_path)?;
        let offset = checked_offset(offset, Some(&offset_path))?;

        Ok(Self {
            gid,
            section_idx,
            offset,
        })
    }

    /// Node id of the cell.
    pub fn gid(&self) -> u64 {
        self.gid
    }

    /// Same as [`gid`](Self::gid), under the SONATA name.
    pub fn node_id(&self) -> u64 {
        self.gid
    }

    /// Absolute section index. Uniquely identifies a section within the
    /// cell's morphology (e.g. `dend[10]` maps to one such index).
    pub fn section_idx(&self) -> u64 {
        self.section_idx
    }

    /// Normalized position along the section.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// The fields in wire order.
    pub fn as_tuple(&self) -> (u64, u64, f64) {
        (self.gid, self.section_idx, self.offset)
    }

    /// Same cell and section, offsets within [`OFFSET_TOLERANCE`].
    pub fn approx_eq(&self, other: &Self) -> bool {
        self.gid == other.gid
            && self.section_idx == other.section_idx
            && (self.offset - other.offset).abs() < OFFSET_TOLERANCE
    }

    pub(crate) fn to_value(self) -> Value {
        serde_json::json!([self.gid, self.section_idx, self.offset])
    }

    /// Compact JSON array, e.g. `[4,40,0.9]`.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

/// Range-check an offset and fold `-0.0` into `0.0`.
fn checked_offset(offset: f64, path: Option<&JsonPath>) -> CompartmentResult<f64> {
    if !(0.0..=1.0).contains(&offset) {
        return Err(CompartmentError::OffsetOutOfRange {
            path: path.cloned(),
            offset,
        });
    }
    Ok(offset + 0.0)
}

impl PartialEq for CompartmentLocation {
    fn eq(&self, other: &Self) -> bool {
        self.gid == other.gid
            && self.section_idx == other.section_idx
            && self.offset.to_bits() == other.offset.to_bits()
    }
}

impl Eq for CompartmentLocation {}

impl Hash for CompartmentLocation {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.gid.hash(state);
        self.section_idx.hash(state);
        self.offset.to_bits().hash(state);
    }
}

impl Ord for CompartmentLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gid
            .cmp(&other.gid)
            .then(self.section_idx.cmp(&other.section_idx))
            .then(self.offset.total_cmp(&other.offset))
    }
}

impl PartialOrd for CompartmentLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for CompartmentLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CompartmentLocation({}, {}, {})",
            self.gid,
            self.section_idx,
            DisplayOffset(self.offset)
        )
    }
}

/// Shortest form of an offset: plain decimals, scientific notation below `1e-4`.
struct DisplayOffset(f64);

impl std::fmt::Display for DisplayOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 != 0.0 && self.0 < OFFSET_TOLERANCE {
            write!(f, "{:e}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl std::fmt::Debug for CompartmentLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl FromStr for CompartmentLocation {
    type Err = CompartmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}

impl From<CompartmentLocation> for (u64, u64, f64) {
    fn from(loc: CompartmentLocation) -> Self {
        loc.as_tuple()
    }
}

impl TryFrom<(u64, u64, f64)> for CompartmentLocation {
    type Error = CompartmentError;

    fn try_from((gid, section_idx, offset): (u64, u64, f64)) -> Result<Self, Self::Error> {
        Self::new(gid, section_idx, offset)
    }
}

impl Serialize for CompartmentLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(LOCATION_ARITY)?;
        tuple.serialize_element(&self.gid)?;
        tuple.serialize_element(&self.section_idx)?;
        tuple.serialize_element(&self.offset)?;
        tuple.end()
    }
}
