//! Inclusive, 1-indexed line ranges

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AlignmentError;

/// A span of lines `start..=end`, 1-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineRange {
    start: usize,
    end: usize,
}

impl LineRange {
    /// Create a range, rejecting `end < start` and line zero
    pub fn new(start: usize, end: usize) -> Result<Self, AlignmentError> {
        if start == 0 || end < start {
            return Err(AlignmentError::InvalidLineRange(format!("{}-{}", start, end)));
        }
        Ok(Self { start, end })
    }

    /// Infallible constructor that clamps into a valid range
    ///
    /// Line zero becomes line one and `end` is raised to `start`.
    pub fn spanning(start: usize, end: usize) -> Self {
        let start = start.max(1);
        Self {
            start,
            end: end.max(start),
        }
    }

    /// A range covering a single line
    pub fn single(line: usize) -> Result<Self, AlignmentError> {
        Self::new(line, line)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of lines covered
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }

    /// True unless the ranges are strictly disjoint. Adjacent ranges
    /// (`a.end + 1 == b.start`) do not overlap.
    pub fn overlaps(&self, other: &LineRange) -> bool {
        !(self.end < other.start || other.end < self.start)
    }

    /// True when every line of `self` lies inside `other`
    pub fn is_subset_of(&self, other: &LineRange) -> bool {
        other.start <= self.start && self.end <= other.end
    }

    /// Smallest range covering both
    pub fn union(&self, other: &LineRange) -> LineRange {
        LineRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Distance from `line` to the closer endpoint
    pub fn distance_to(&self, line: usize) -> usize {
        self.start.abs_diff(line).min(self.end.abs_diff(line))
    }

    /// Copy with a different end line, clamped so the range stays valid
    pub fn with_end(&self, end: usize) -> LineRange {
        LineRange {
            start: self.start,
            end: end.max(self.start),
        }
    }

    /// Portion of `self` strictly before `other`, if any
    pub fn before(&self, other: &LineRange) -> Option<LineRange> {
        (self.start < other.start).then(|| LineRange {
            start: self.start,
            end: self.end.min(other.start - 1),
        })
    }

    /// Portion of `self` strictly after `other`, if any
    pub fn after(&self, other: &LineRange) -> Option<LineRange> {
        (self.end > other.end).then(|| LineRange {
            start: self.start.max(other.end + 1),
            end: self.end,
        })
    }
}

impl fmt::Display for LineRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for LineRange {
    type Err = AlignmentError;

    /// Parses `"start-end"`; a bare `"n"` is the single line `n`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AlignmentError::InvalidLineRange(s.to_string());
        let trimmed = s.trim();

        let (start, end) = match trimmed.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (trimmed, trimmed),
        };

        let start: usize = start.parse().map_err(|_| invalid())?;
        let end: usize = end.parse().map_err(|_| invalid())?;
        LineRange::new(start, end).map_err(|_| invalid())
    }
}

impl Serialize for LineRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LineRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RangeVisitor;

        impl Visitor<'_> for RangeVisitor {
            type Value = LineRange;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a line range like \"10-20\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<LineRange, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<LineRange, E> {
                LineRange::single(v as usize).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<LineRange, E> {
                let line = usize::try_from(v).map_err(E::custom)?;
                LineRange::single(line).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(RangeVisitor)
    }
}
