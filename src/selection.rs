//! Compact ordered id sets built from half-open ranges.
//!
//! A [`Selection`] is the filter criterion applied to compartment sets: the
//! ids of the cells of interest, stored as sorted `[start, end)` ranges.
//! Construction always normalizes (sort, drop empty, merge overlapping and
//! adjacent ranges), so equality compares the denoted id sets.
//!
//! Ranges are half-open, so `u64::MAX` itself cannot be a member. Node ids
//! are capped at `i64::MAX` when a location is built, so every gid fits.

use std::ops::Range;

use miette::Diagnostic;
use thiserror::Error;

/// Errors from selection construction.
#[derive(Debug, Error, Diagnostic)]
pub enum SelectionError {
    #[error("invalid range [{start}, {end}): start is greater than end")]
    #[diagnostic(
        code(sonata::selection::invalid_range),
        help("Ranges are half-open [start, end) with start <= end.")
    )]
    InvalidRange { start: u64, end: u64 },

    #[error("cannot parse \"{input}\" as an id or id range")]
    #[diagnostic(
        code(sonata::selection::parse),
        help("Use comma-separated ids and inclusive ranges, e.g. \"1,2,5-9\".")
    )]
    Parse { input: String },
}

pub type SelectionResult<T> = std::result::Result<T, SelectionError>;

/// An ordered set of `u64` ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    ranges: Vec<Range<u64>>,
}

impl Selection {
    /// The empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from explicit ids, in any order, duplicates allowed.
    pub fn from_values<I: IntoIterator<Item = u64>>(values: I) -> Self {
        let mut values: Vec<u64> = values.into_iter().collect();
        values.sort_unstable();
        values.dedup();

        let mut ranges: Vec<Range<u64>> = Vec::new();
        for v in values.into_iter().take_while(|&v| v != u64::MAX) {
            match ranges.last_mut() {
                Some(last) if last.end == v => last.end = v + 1,
                _ => ranges.push(v..v + 1),
            }
        }
        Self { ranges }
    }

    /// Build from `[start, end)` ranges. Empty ranges are dropped; a range
    /// with `start > end` is an error.
    pub fn from_ranges<I: IntoIterator<Item = Range<u64>>>(ranges: I) -> SelectionResult<Self> {
        let mut ranges: Vec<Range<u64>> = ranges.into_iter().collect();
        if let Some(bad) = ranges.iter().find(|r| r.start > r.end) {
            return Err(SelectionError::InvalidRange {
                start: bad.start,
                end: bad.end,
            });
        }
        ranges.retain(|r| !r.is_empty());
        ranges.sort_unstable_by_key(|r| r.start);
        Ok(Self {
            ranges: coalesce(ranges),
        })
    }

    /// Parse a comma-separated list of ids and inclusive `a-b` ranges,
    /// e.g. `"1,2,5-9"`.
    pub fn parse_list(input: &str) -> SelectionResult<Self> {
        let parse_err = || SelectionError::Parse {
            input: input.to_string(),
        };
        let mut ranges = Vec::new();
        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let range = match part.split_once('-') {
                Some((a, b)) => {
                    let a: u64 = a.trim().parse().map_err(|_| parse_err())?;
                    let b: u64 = b.trim().parse().map_err(|_| parse_err())?;
                    if a > b {
                        return Err(parse_err());
                    }
                    a..b.checked_add(1).ok_or_else(parse_err)?
                }
                None => {
                    let v: u64 = part.parse().map_err(|_| parse_err())?;
                    v..v.checked_add(1).ok_or_else(parse_err)?
                }
            };
            ranges.push(range);
        }
        Self::from_ranges(ranges)
    }

    /// The normalized ranges.
    pub fn ranges(&self) -> &[Range<u64>] {
        &self.ranges
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: u64) -> bool {
        // First range whose end is past `id`; `id` is in it iff start <= id.
        let idx = self.ranges.partition_point(|r| r.end <= id);
        self.ranges.get(idx).is_some_and(|r| r.start <= id)
    }

    /// Number of ids in the selection.
    pub fn len(&self) -> u64 {
        self.ranges.iter().map(|r| r.end - r.start).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// All ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.ranges.iter().flat_map(|r| r.clone())
    }

    /// All ids as a vector, ascending.
    pub fn flatten(&self) -> Vec<u64> {
        self.iter().collect()
    }

    /// The members of `ids` that are in this selection, in their original order.
    pub fn intersect_values(&self, ids: &[u64]) -> Vec<u64> {
        ids.iter().copied().filter(|&id| self.contains(id)).collect()
    }

    /// Ids in either selection.
    pub fn union(&self, other: &Selection) -> Selection {
        let mut ranges: Vec<Range<u64>> =
            self.ranges.iter().chain(other.ranges.iter()).cloned().collect();
        ranges.sort_unstable_by_key(|r| r.start);
        Selection {
            ranges: coalesce(ranges),
        }
    }

    /// Ids in both selections.
    pub fn intersection(&self, other: &Selection) -> Selection {
        let (mut i, mut j) = (0, 0);
        let mut ranges = Vec::new();
        while i < self.ranges.len() && j < other.ranges.len() {
            let (a, b) = (&self.ranges[i], &other.ranges[j]);
            let start = a.start.max(b.start);
            let end = a.end.min(b.end);
            if start < end {
                ranges.push(start..end);
            }
            if a.end < b.end {
                i += 1;
            } else {
                j += 1;
            }
        }
        Selection { ranges }
    }
}

/// Merge sorted ranges that overlap or touch.
fn coalesce(sorted: Vec<Range<u64>>) -> Vec<Range<u64>> {
    let mut out: Vec<Range<u64>> = Vec::with_capacity(sorted.len());
    for r in sorted {
        match out.last_mut() {
            Some(last) if r.start <= last.end => last.end = last.end.max(r.end),
            _ => out.push(r),
        }
    }
    out
}

impl From<Vec<u64>> for Selection {
    fn from(values: Vec<u64>) -> Self {
        Self::from_values(values)
    }
}

impl From<&[u64]> for Selection {
    fn from(values: &[u64]) -> Self {
        Self::from_values(values.iter().copied())
    }
}

impl<const N: usize> From<[u64; N]> for Selection {
    fn from(values: [u64; N]) -> Self {
        Self::from_values(values)
    }
}

impl TryFrom<Vec<Range<u64>>> for Selection {
    type Error = SelectionError;

    fn try_from(ranges: Vec<Range<u64>>) -> Result<Self, Self::Error> {
        Self::from_ranges(ranges)
    }
}

impl FromIterator<u64> for Selection {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

impl std::fmt::Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[{}, {})", r.start, r.end)?;
        }
        Ok(())
    }
}
