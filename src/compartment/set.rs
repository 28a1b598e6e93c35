//! Population-scoped, ordered collections of compartment locations.

use std::iter::FusedIterator;
use std::str::FromStr;

use serde::Serialize;
use serde_json::Value;

use super::error::{CompartmentError, CompartmentResult};
use super::location::CompartmentLocation;
use super::schema::{self, JsonPath};
use crate::selection::Selection;

/// The locations of one compartment set, in document order.
///
/// Duplicates are kept and order matters for equality. The population is
/// carried as metadata only; whether the node ids exist in that population is
/// for the storage layer to decide.
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CompartmentSet {
    population: String,
    #[serde(rename = "compartment_set")]
    locations: Vec<CompartmentLocation>,
}

impl CompartmentSet {
    /// Build a set directly from locations.
    pub fn new(
        population: impl Into<String>,
        locations: Vec<CompartmentLocation>,
    ) -> CompartmentResult<Self> {
        let population = population.into();
        if population.is_empty() {
            return Err(CompartmentError::EmptyPopulation { path: None });
        }
        Ok(Self {
            population,
            locations,
        })
    }

    /// Parse `{"population": ..., "compartment_set": [[gid, section, offset], ...]}`.
    pub fn from_json(text: &str) -> CompartmentResult<Self> {
        let value = schema::parse_document(text)?;
        let set = Self::from_value(&value, &JsonPath::root())?;
        tracing::debug!(
            population = %set.population,
            locations = set.locations.len(),
            "parsed compartment set"
        );
        Ok(set)
    }

    pub(crate) fn from_value(value: &Value, path: &JsonPath) -> CompartmentResult<Self> {
        let object = schema::expect_object(value, path)?;

        let population_path = path.field("population");
        let population = schema::required(object, "population", path)?;
        let population = schema::expect_string(population, &population_path)?;
        if population.is_empty() {
            return Err(CompartmentError::EmptyPopulation {
                path: Some(population_path),
            });
        }

        let elements_path = path.field("compartment_set");
        let elements = schema::required(object, "compartment_set", path)?;
        let elements = schema::expect_array(elements, &elements_path)?;

        let locations = elements
            .iter()
            .enumerate()
            .map(|(i, el)| CompartmentLocation::from_value(el, &elements_path.index(i)))
            .collect::<CompartmentResult<Vec<_>>>()?;

        Ok(Self {
            population: population.to_string(),
            locations,
        })
    }

    /// Name of the node population these locations belong to.
    pub fn population(&self) -> &str {
        &self.population
    }

    /// Number of locations, or with a selection, the number whose node id is
    /// in it. Duplicates are counted.
    pub fn size(&self, selection: Option<&Selection>) -> usize {
        match selection {
            None => self.locations.len(),
            Some(sel) => self.filtered_iter(sel).count(),
        }
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Location at `index`; negative indices count from the end (`-1` is the last).
    pub fn get(&self, index: isize) -> CompartmentResult<CompartmentLocation> {
        let len = self.locations.len();
        let position = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs())
        };
        position
            .and_then(|i| self.locations.get(i).copied())
            .ok_or(CompartmentError::IndexOutOfRange { index, len })
    }

    /// All locations in document order.
    pub fn locations(&self) -> &[CompartmentLocation] {
        &self.locations
    }

    /// Owned copy of the locations, optionally restricted to a selection.
    pub fn compartment_locations(&self, selection: Option<&Selection>) -> Vec<CompartmentLocation> {
        match selection {
            None => self.locations.clone(),
            Some(sel) => self.filtered_iter(sel).copied().collect(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompartmentLocation> {
        self.locations.iter()
    }

    /// Lazily yield the locations whose node id is in `selection`, in order.
    ///
    /// Each call starts a fresh traversal.
    pub fn filtered_iter<'a>(&'a self, selection: &'a Selection) -> FilteredIter<'a> {
        FilteredIter {
            inner: self.locations.iter(),
            selection,
        }
    }

    /// Distinct node ids present in the set.
    pub fn gids(&self) -> Selection {
        Selection::from_values(self.locations.iter().map(CompartmentLocation::gid))
    }

    /// Same as [`gids`](Self::gids), under the SONATA name.
    pub fn node_ids(&self) -> Selection {
        self.gids()
    }

    /// A new set with the same population holding only the locations in
    /// `selection` (all of them for `None`), order and duplicates preserved.
    pub fn filter(&self, selection: Option<&Selection>) -> CompartmentSet {
        let locations = self.compartment_locations(selection);
        tracing::trace!(
            population = %self.population,
            kept = locations.len(),
            total = self.locations.len(),
            "filtered compartment set"
        );
        CompartmentSet {
            population: self.population.clone(),
            locations,
        }
    }

    pub(crate) fn to_value(&self) -> Value {
        let locations: Vec<Value> = self.locations.iter().map(|l| l.to_value()).collect();
        serde_json::json!({
            "population": self.population,
            "compartment_set": locations,
        })
    }

    /// Compact JSON object; parses back into an equal set.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

/// Iterator over the locations of a [`CompartmentSet`] whose node id is in a
/// [`Selection`]. Created by [`CompartmentSet::filtered_iter`].
#[derive(Debug, Clone)]
pub struct FilteredIter<'a> {
    inner: std::slice::Iter<'a, CompartmentLocation>,
    selection: &'a Selection,
}

impl<'a> Iterator for FilteredIter<'a> {
    type Item = &'a CompartmentLocation;

    fn next(&mut self) -> Option<Self::Item> {
        let selection = self.selection;
        self.inner.find(|loc| selection.contains(loc.gid()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.inner.size_hint().1)
    }
}

impl DoubleEndedIterator for FilteredIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let selection = self.selection;
        self.inner.rfind(|loc| selection.contains(loc.gid()))
    }
}

impl FusedIterator for FilteredIter<'_> {}

impl<'a> IntoIterator for &'a CompartmentSet {
    type Item = &'a CompartmentLocation;
    type IntoIter = std::slice::Iter<'a, CompartmentLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}

impl FromStr for CompartmentSet {
    type Err = CompartmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}

impl std::fmt::Display for CompartmentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompartmentSet(population={:?}, compartments=[", self.population)?;
        for (i, loc) in self.locations.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{loc}")?;
        }
        write!(f, "])")
    }
}

impl std::fmt::Debug for CompartmentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POP0: &str = r#"{
        "population": "pop0",
        "compartment_set": [
            [1, 10, 0.5],
            [2, 20, 0.25],
            [3, 30, 0.75],
            [2, 20, 0.25]
        ]
    }"#;

    fn pop0() -> CompartmentSet {
        CompartmentSet::from_json(POP0).unwrap()
    }

    fn loc(gid: u64, section_idx: u64, offset: f64) -> CompartmentLocation {
        CompartmentLocation::new(gid, section_idx, offset).unwrap()
    }

    #[test]
    fn population_and_length() {
        let cs = pop0();
        assert_eq!(cs.population(), "pop0");
        assert_eq!(cs.len(), 4);
        assert_eq!(cs.size(None), 4);
        assert!(!cs.is_empty());
    }

    #[test]
    fn size_with_selection() {
        let cs = pop0();
        assert_eq!(cs.size(Some(&Selection::from([1, 2]))), 3);
        let sel = Selection::from_ranges(vec![2..3]).unwrap();
        assert_eq!(cs.size(Some(&sel)), 2);
        assert_eq!(cs.size(Some(&Selection::new())), 0);
    }

    #[test]
    fn positional_access() {
        let cs = pop0();
        assert_eq!(cs.get(0).unwrap().as_tuple(), (1, 10, 0.5));
        assert_eq!(cs.get(-1).unwrap().as_tuple(), (2, 20, 0.25));
        assert_eq!(cs.get(-1).unwrap(), cs.get(3).unwrap());
        assert_eq!(cs.get(-4).unwrap(), cs.get(0).unwrap());
    }

    #[test]
    fn positional_access_out_of_range() {
        let cs = pop0();
        for index in [4, 10, -5, -10, isize::MIN, isize::MAX] {
            let err = cs.get(index).unwrap_err();
            assert!(matches!(err, CompartmentError::IndexOutOfRange { len: 4, .. }));
            assert_eq!(err.kind(), crate::compartment::ErrorKind::Index);
        }
    }

    #[test]
    fn iteration_is_ordered_and_restartable() {
        let cs = pop0();
        let ids: Vec<u64> = cs.iter().map(|l| l.gid()).collect();
        assert_eq!(ids, vec![1, 2, 3, 2]);
        let again: Vec<u64> = (&cs).into_iter().map(|l| l.gid()).collect();
        assert_eq!(again, ids);
    }

    #[test]
    fn filtered_iteration() {
        let cs = pop0();
        let sel = Selection::from([2, 3]);
        let ids: Vec<u64> = cs.filtered_iter(&sel).map(|l| l.gid()).collect();
        assert_eq!(ids, vec![2, 3, 2]);
        assert_eq!(cs.filtered_iter(&sel).count(), cs.size(Some(&sel)));
        let rev: Vec<u64> = cs.filtered_iter(&sel).rev().map(|l| l.gid()).collect();
        assert_eq!(rev, vec![2, 3, 2]);
        assert_eq!(cs.filtered_iter(&Selection::from([9])).next(), None);
    }

    #[test]
    fn distinct_gids() {
        let cs = pop0();
        assert_eq!(cs.gids(), Selection::from([1, 2, 3]));
        assert_eq!(cs.node_ids().ranges(), &[1..4]);
    }

    #[test]
    fn filter_preserves_order_and_duplicates() {
        let cs = pop0();
        let all = cs.filter(None);
        assert_eq!(all, cs);

        let some = cs.filter(Some(&Selection::from([1, 2])));
        assert_eq!(some.population(), "pop0");
        assert_eq!(some.len(), 3);
        assert_eq!(
            some.locations(),
            &[loc(1, 10, 0.5), loc(2, 20, 0.25), loc(2, 20, 0.25)]
        );
        // the receiver is untouched
        assert_eq!(cs.len(), 4);
    }

    #[test]
    fn json_round_trip() {
        let cs = pop0();
        let json = cs.to_json();
        assert_eq!(
            json,
            r#"{"population":"pop0","compartment_set":[[1,10,0.5],[2,20,0.25],[3,30,0.75],[2,20,0.25]]}"#
        );
        let back: CompartmentSet = json.parse().unwrap();
        assert_eq!(back, cs);
        assert_eq!(back.size(None), cs.size(None));
        assert_eq!(serde_json::to_string(&cs).unwrap(), json);
    }

    #[test]
    fn equality_is_order_and_duplicate_sensitive() {
        let cs = pop0();
        let fewer = CompartmentSet::from_json(
            r#"{"population": "pop0", "compartment_set": [[1, 10, 0.5], [2, 20, 0.25], [3, 30, 0.75]]}"#,
        )
        .unwrap();
        assert_ne!(cs, fewer);

        let other_pop = CompartmentSet::new("pop1", cs.locations().to_vec()).unwrap();
        assert_ne!(cs, other_pop);

        let mut reversed = cs.locations().to_vec();
        reversed.reverse();
        assert_ne!(cs, CompartmentSet::new("pop0", reversed).unwrap());
    }

    #[test]
    fn schema_violations() {
        let cases = [
            (r#"[]"#, "expected an object"),
            (r#"{"compartment_set": []}"#, "missing required key \"population\""),
            (r#"{"population": "p"}"#, "missing required key \"compartment_set\""),
            (r#"{"population": 1, "compartment_set": []}"#, "$.population: expected a string"),
            (r#"{"population": "", "compartment_set": []}"#, "population name is empty"),
            (r#"{"population": "p", "compartment_set": {}}"#, "$.compartment_set: expected an array"),
            (r#"{"population": "p", "compartment_set": [1]}"#, "$.compartment_set[0]: expected an array"),
            (
                r#"{"population": "p", "compartment_set": [[1, 2, 0.5], [1, 2]]}"#,
                "$.compartment_set[1]: expected 3 elements, got 2",
            ),
            (
                r#"{"population": "p", "compartment_set": [[1, 2, 1.5]]}"#,
                "$.compartment_set[0][2]: offset must be between 0 and 1",
            ),
        ];
        for (text, expected) in cases {
            let err = CompartmentSet::from_json(text).unwrap_err();
            assert!(err.is_validation());
            assert!(err.to_string().contains(expected), "{text}: {err}");
        }
    }

    #[test]
    fn empty_set_is_valid() {
        let cs = CompartmentSet::from_json(r#"{"population": "p", "compartment_set": []}"#).unwrap();
        assert!(cs.is_empty());
        assert!(cs.gids().is_empty());
        assert!(cs.get(0).is_err());
        assert!(cs.get(-1).is_err());
    }

    #[test]
    fn new_rejects_empty_population() {
        let err = CompartmentSet::new("", vec![]).unwrap_err();
        assert!(matches!(err, CompartmentError::EmptyPopulation { path: None }));
        assert_eq!(err.to_string(), "population name is empty");

        let err = CompartmentSet::from_json(r#"{"population": "", "compartment_set": []}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "$.population: population name is empty");
    }

    #[test]
    fn every_accepted_gid_is_selectable() {
        let err = CompartmentSet::from_json(
            r#"{"population": "p", "compartment_set": [[18446744073709551615, 0, 0.5], [1, 0, 0.5]]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, CompartmentError::IdOutOfRange { .. }));

        let cs = CompartmentSet::from_json(
            r#"{"population": "p", "compartment_set": [[9223372036854775807, 0, 0.5], [1, 0, 0.5]]}"#,
        )
        .unwrap();
        let gids = cs.gids();
        assert_eq!(gids.flatten(), vec![1, i64::MAX as u64]);
        assert_eq!(cs.size(Some(&gids)), cs.len());
        assert_eq!(cs.filter(Some(&Selection::from([i64::MAX as u64]))).len(), 1);
    }

    #[test]
    fn display_dump() {
        let cs = CompartmentSet::from_json(
            r#"{"population": "pop0", "compartment_set": [[1, 10, 0.5], [2, 20, 1]]}"#,
        )
        .unwrap();
        let text = cs.to_string();
        assert!(text.starts_with("CompartmentSet(population="));
        assert_eq!(
            text,
            r#"CompartmentSet(population="pop0", compartments=[CompartmentLocation(1, 10, 0.5), CompartmentLocation(2, 20, 1)])"#
        );
        assert_eq!(format!("{cs:?}"), text);
    }
}
