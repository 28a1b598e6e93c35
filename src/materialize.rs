//! Resolving compartment locations against population storage.
//!
//! This crate stops at validated, filterable compartment sets. Turning a
//! location into the compartment indices of a concrete circuit needs the
//! morphology and report layout of the population, which live elsewhere;
//! [`CompartmentResolver`] is the seam where that knowledge plugs in.

use std::ops::Range;

use crate::compartment::{CompartmentLocation, CompartmentResult, CompartmentSet};
use crate::selection::Selection;

/// Maps a location on a cell to the storage-level compartment indices that
/// cover it.
pub trait CompartmentResolver {
    /// Resolve one location of `population` into a half-open index range.
    fn resolve(&self, population: &str, location: &CompartmentLocation) -> CompartmentResult<Range<u64>>;
}

impl<R: CompartmentResolver + ?Sized> CompartmentResolver for &R {
    fn resolve(&self, population: &str, location: &CompartmentLocation) -> CompartmentResult<Range<u64>> {
        (**self).resolve(population, location)
    }
}

impl CompartmentSet {
    /// Resolve every location (or only those in `selection`) in set order.
    ///
    /// The first resolver error aborts and is returned unchanged.
    pub fn materialize<R: CompartmentResolver>(
        &self,
        resolver: &R,
        selection: Option<&Selection>,
    ) -> CompartmentResult<Vec<Range<u64>>> {
        let population = self.population();
        let resolved = match selection {
            None => self
                .iter()
                .map(|loc| resolver.resolve(population, loc))
                .collect::<CompartmentResult<Vec<_>>>()?,
            Some(sel) => self
                .filtered_iter(sel)
                .map(|loc| resolver.resolve(population, loc))
                .collect::<CompartmentResult<Vec<_>>>()?,
        };
        tracing::debug!(population, ranges = resolved.len(), "materialized compartment set");
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compartment::CompartmentError;

    /// Every cell has 100 sections of 10 compartments each.
    struct UniformCells;

    impl CompartmentResolver for UniformCells {
        fn resolve(&self, population: &str, location: &CompartmentLocation) -> CompartmentResult<Range<u64>> {
            if population != "pop0" {
                return Err(CompartmentError::KeyNotFound {
                    key: population.to_string(),
                });
            }
            let cell = location.gid() * 1000;
            let section = location.section_idx() * 10;
            let compartment = ((location.offset() * 10.0) as u64).min(9);
            let start = cell + section + compartment;
            Ok(start..start + 1)
        }
    }

    fn pop(name: &str) -> CompartmentSet {
        CompartmentSet::from_json(&format!(
            r#"{{"population": "{name}", "compartment_set": [[1, 2, 0.5], [0, 0, 1.0], [1, 2, 0.5]]}}"#
        ))
        .unwrap()
    }

    #[test]
    fn resolves_in_order() {
        let ranges = pop("pop0").materialize(&UniformCells, None).unwrap();
        assert_eq!(ranges, vec![1025..1026, 9..10, 1025..1026]);
    }

    #[test]
    fn honors_selection() {
        let sel = Selection::from([0]);
        let ranges = pop("pop0").materialize(&UniformCells, Some(&sel)).unwrap();
        assert_eq!(ranges, vec![9..10]);
    }

    #[test]
    fn resolver_errors_propagate() {
        let err = pop("other").materialize(&&UniformCells, None).unwrap_err();
        assert!(matches!(err, CompartmentError::KeyNotFound { .. }));
    }
}
