//! Ordered sets of CPU or NUMA node ids.
//!
//! [`CpuSet`] is the set type the whole engine computes with. It keeps its
//! members sorted, so iterating, listing and rendering are deterministic.
//!
//! The Linux kernel exposes these sets in the "list format" (see
//! [`cpuset(7)`](https://man7.org/linux/man-pages/man7/cpuset.7.html)), e.g.
//! `0-3,8,10-11`. [`CpuSet`] parses and renders that format.
//!
//! # Example
//!
//! ```
//! use ctralign::cpuset::CpuSet;
//!
//! let cpus: CpuSet = "0-3,8".parse().unwrap();
//! assert_eq!(cpus.to_vec(), vec![0, 1, 2, 3, 8]);
//! assert_eq!(cpus.to_string(), "0-3,8");
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Errors that may occur when parsing a list-format id set.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty element in cpu list `{0}`")]
    EmptyElement(String),

    #[error("invalid id `{token}` in cpu list `{list}`")]
    InvalidId { token: String, list: String },

    #[error("invalid range `{token}` in cpu list `{list}`: start is greater than end")]
    ReversedRange { token: String, list: String },

    #[error("id in `{token}` of cpu list `{list}` exceeds the maximum of {max}", max = MAX_ID)]
    IdOutOfRange { token: String, list: String },
}

/// Largest id accepted when parsing a list.
pub const MAX_ID: usize = 1 << 16;

/// An ordered set of logical CPU ids or NUMA node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CpuSet(BTreeSet<usize>);

impl CpuSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, id: usize) -> bool {
        self.0.insert(id)
    }

    pub fn extend(&mut self, other: &CpuSet) {
        self.0.extend(other.iter());
    }

    /// Iterates the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    pub fn union(&self, other: &CpuSet) -> CpuSet {
        self.0.union(&other.0).copied().collect()
    }

    pub fn intersection(&self, other: &CpuSet) -> CpuSet {
        self.0.intersection(&other.0).copied().collect()
    }

    pub fn difference(&self, other: &CpuSet) -> CpuSet {
        self.0.difference(&other.0).copied().collect()
    }

    pub fn is_subset(&self, other: &CpuSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn is_disjoint(&self, other: &CpuSet) -> bool {
        self.0.is_disjoint(&other.0)
    }

    /// Returns the members as a sorted vector.
    pub fn to_vec(&self) -> Vec<usize> {
        self.0.iter().copied().collect()
    }

    pub fn first(&self) -> Option<usize> {
        self.0.first().copied()
    }
}

impl FromIterator<usize> for CpuSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[usize; N]> for CpuSet {
    fn from(ids: [usize; N]) -> Self {
        ids.into_iter().collect()
    }
}

impl From<&[usize]> for CpuSet {
    fn from(ids: &[usize]) -> Self {
        ids.iter().copied().collect()
    }
}

impl FromStr for CpuSet {
    type Err = ParseError;

    /// Parses the kernel list format. Whitespace around the list is ignored and
    /// an empty (or whitespace only) input yields an empty set.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let list = s.trim();
        let mut set = CpuSet::new();
        if list.is_empty() {
            return Ok(set);
        }

        let parse_id = |token: &str| -> Result<usize, ParseError> {
            let id = token.trim().parse::<usize>().map_err(|_| ParseError::InvalidId {
                token: token.to_owned(),
                list: list.to_owned(),
            })?;
            if id > MAX_ID {
                return Err(ParseError::IdOutOfRange {
                    token: token.to_owned(),
                    list: list.to_owned(),
                });
            }
            Ok(id)
        };

        for token in list.split(',') {
            if token.trim().is_empty() {
                return Err(ParseError::EmptyElement(list.to_owned()));
            }
            match token.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (parse_id(start)?, parse_id(end)?);
                    if start > end {
                        return Err(ParseError::ReversedRange {
                            token: token.to_owned(),
                            list: list.to_owned(),
                        });
                    }
                    set.0.extend(start..=end);
                }
                None => {
                    set.insert(parse_id(token)?);
                }
            }
        }

        Ok(set)
    }
}

impl fmt::Display for CpuSet {
    /// Renders the compressed list format, e.g. `0-3,8,10-11`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids = self.iter().peekable();
        let mut first = true;
        while let Some(start) = ids.next() {
            let mut end = start;
            while ids.peek() == Some(&(end + 1)) {
                end += 1;
                ids.next();
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            if start == end {
                write!(f, "{start}")?;
            } else {
                write!(f, "{start}-{end}")?;
            }
        }
        Ok(())
    }
}
