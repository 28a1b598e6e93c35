// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # sonata-compartments
//!
//! Compartment sets for SONATA circuits: typed locations on neuron
//! morphologies, grouped per population and named per file.
//!
//! ## Architecture
//!
//! - **Selections** (`selection`): compact ordered id sets built from half-open ranges
//! - **Compartments** (`compartment`): locations, sets, and named collections with
//!   strict JSON schema validation and canonical serialization
//! - **Materialization** (`materialize`): the resolver seam towards population storage
//! - **Configuration** (`config`): `csets.toml` for the command-line tool
//!
//! ## Library usage
//!
//! ```
//! use sonata_compartments::compartment::CompartmentSets;
//! use sonata_compartments::selection::Selection;
//!
//! let sets = CompartmentSets::from_json(
//!     r#"{"cs0": {"population": "pop0", "compartment_set": [[1, 10, 0.5], [2, 20, 0.25]]}}"#,
//! )
//! .unwrap();
//! let cs0 = sets.lookup("cs0").unwrap();
//! assert_eq!(cs0.size(Some(&Selection::from([2]))), 1);
//! assert_eq!(cs0.get(-1).unwrap().to_json(), "[2,20,0.25]");
//! ```

pub mod compartment;
pub mod config;
pub mod materialize;
pub mod selection;
