//! Named collections of compartment sets, as found in a SONATA
//! `compartment_sets.json` file.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Value};

use super::error::{CompartmentError, CompartmentResult};
use super::schema::{self, JsonPath};
use super::set::CompartmentSet;

/// Compartment sets keyed by name, in document order.
///
/// Backed by a vector of entries plus a name index, so enumeration and
/// serialization follow the input document while lookups stay O(1).
#[derive(Clone, Default)]
pub struct CompartmentSets {
    entries: Vec<(String, CompartmentSet)>,
    index: HashMap<String, usize>,
}

impl CompartmentSets {
    /// Parse a `{"<name>": {"population": ..., "compartment_set": [...]}, ...}` document.
    ///
    /// Any schema violation rejects the whole document.
    pub fn from_json(text: &str) -> CompartmentResult<Self> {
        let value = schema::parse_document(text)?;
        let sets = Self::from_value(&value)?;
        tracing::debug!(
            sets = sets.len(),
            locations = sets.values().map(CompartmentSet::len).sum::<usize>(),
            "parsed compartment sets"
        );
        Ok(sets)
    }

    /// Read a compartment sets file and parse it.
    pub fn from_file(path: impl AsRef<Path>) -> CompartmentResult<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "reading compartment sets file");
        let content = std::fs::read_to_string(path).map_err(|e| CompartmentError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content)
    }

    fn from_value(value: &Value) -> CompartmentResult<Self> {
        let root = JsonPath::root();
        let object = schema::expect_object(value, &root)?;

        let mut entries = Vec::with_capacity(object.len());
        let mut index = HashMap::with_capacity(object.len());
        for (name, value) in object {
            let set = CompartmentSet::from_value(value, &root.key(name))?;
            index.insert(name.clone(), entries.len());
            entries.push((name.clone(), set));
        }
        Ok(Self { entries, index })
    }

    /// Number of compartment sets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&CompartmentSet> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Like [`get`](Self::get), but a missing name is an error.
    pub fn lookup(&self, name: &str) -> CompartmentResult<&CompartmentSet> {
        self.get(name).ok_or_else(|| CompartmentError::KeyNotFound {
            key: name.to_string(),
        })
    }

    /// Set names in document order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Sets in document order.
    pub fn values(&self) -> impl ExactSizeIterator<Item = &CompartmentSet> + '_ {
        self.entries.iter().map(|(_, set)| set)
    }

    /// `(name, set)` pairs in document order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Set names, sorted.
    pub fn names(&self) -> BTreeSet<String> {
        self.index.keys().cloned().collect()
    }

    /// Compact JSON object in document order; parses back into an equal value.
    pub fn to_json(&self) -> String {
        let mut object = Map::with_capacity(self.entries.len());
        for (name, set) in &self.entries {
            object.insert(name.clone(), set.to_value());
        }
        Value::Object(object).to_string()
    }
}

/// Two collections are equal when they hold equal sets under the same
/// names; document order does not matter.
impl PartialEq for CompartmentSets {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(name, set)| other.get(name).is_some_and(|o| o == set))
    }
}

impl Eq for CompartmentSets {}

impl FromStr for CompartmentSets {
    type Err = CompartmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}

/// Iterator over `(name, set)` pairs of a [`CompartmentSets`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (String, CompartmentSet)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a CompartmentSet);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(name, set)| (name.as_str(), set))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a CompartmentSets {
    type Item = (&'a str, &'a CompartmentSet);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Display for CompartmentSets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CompartmentSets({{")?;
        for (i, (name, set)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name:?}: {set}")?;
        }
        write!(f, "}})")
    }
}

impl std::fmt::Debug for CompartmentSets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}
