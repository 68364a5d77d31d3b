//! Time intervals and tiers.

use serde::{Deserialize, Serialize};

/// A labelled stretch of a recording timeline, in seconds.
///
/// `start <= end` is assumed but not enforced; decoders produce intervals in
/// that shape and the overlap arithmetic relies on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl Interval {
    /// Creates a new interval.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// A zero-length query at `time`, used to look up what is going on at
    /// one instant (e.g. the timestamp of a scene snapshot).
    pub fn instant(time: f64) -> Self {
        Self::new(time, time, "")
    }

    /// Strict open-interval overlap test.
    ///
    /// Intervals that only touch at an endpoint do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Length of the shared stretch of two intervals.
    ///
    /// Negative when the intervals are disjoint.
    #[inline]
    pub fn overlap_with(&self, other: &Interval) -> f64 {
        self.end.min(other.end) - self.start.max(other.start)
    }
}

/// A named timeline of intervals in source order.
///
/// Intervals are not guaranteed to be sorted or disjoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    pub intervals: Vec<Interval>,
}

impl Tier {
    /// Creates a new tier.
    pub fn new(name: impl Into<String>, intervals: Vec<Interval>) -> Self {
        Self {
            name: name.into(),
            intervals,
        }
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }
}

impl<'a> IntoIterator for &'a Tier {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}
