//! Compartment sets: named, population-scoped collections of locations on
//! neuron morphologies.
//!
//! A [`CompartmentLocation`] is a `(node_id, section_index, offset)` point, a
//! [`CompartmentSet`] an ordered list of them for one population, and
//! [`CompartmentSets`] the named collection read from a SONATA
//! `compartment_sets.json` file. All three parse from JSON through the strict
//! checks in [`schema`] and serialize back to compact canonical JSON.

pub mod error;
pub mod location;
pub mod schema;
pub mod set;
pub mod sets;

pub use error::{CompartmentError, CompartmentResult, ErrorKind};
pub use location::{CompartmentLocation, OFFSET_TOLERANCE};
pub use schema::JsonPath;
pub use set::{CompartmentSet, FilteredIter};
pub use sets::CompartmentSets;
