//! Overlap resolver.
//!
//! Given a query interval, the resolver picks at most one interval per tier
//! of a recording: the one that temporally corresponds to the query. Every
//! cross-tier join of the record assembler goes through [`Resolver::find`].
//!
//! Overlap is strict on both sides: an interval ending exactly where the
//! query starts (or starting exactly where it ends) is not a candidate.

use serde::{Deserialize, Serialize};

use crate::diagnostics::{DiagnosticCode, DiagnosticLog};
use crate::ir::{Interval, Recording, Tier};

/// How to pick among several overlapping intervals of one tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Largest overlap with the query; ties go to the first candidate in
    /// tier order.
    #[default]
    LargestOverlap,
    /// Selection compatible with archived datasets.
    ///
    /// The overlap score is computed once, from the *last interval of the
    /// tier* rather than from each candidate, as
    /// `min(query.end, last.end - max(query.start, last.start))`. When that
    /// score is positive the last candidate wins, otherwise the first.
    Legacy,
}

impl TieBreak {
    pub fn as_str(&self) -> &'static str {
        match self {
            TieBreak::LargestOverlap => "largest_overlap",
            TieBreak::Legacy => "legacy",
        }
    }
}

/// Decides which tiers take part in a search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TierFilter {
    /// Lower-case substrings; a tier whose lower-cased name contains any of
    /// them is skipped.
    excluded: Vec<String>,
}

impl Default for TierFilter {
    /// Skips word-level tiers and free-text comment tiers.
    fn default() -> Self {
        Self::excluding(["words", "comment"])
    }
}

impl TierFilter {
    pub fn excluding<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            excluded: fragments
                .into_iter()
                .map(|s| s.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// A filter that lets every tier through.
    pub fn none() -> Self {
        Self {
            excluded: Vec::new(),
        }
    }

    pub fn accepts(&self, tier_name: &str) -> bool {
        let lower = tier_name.to_lowercase();
        !self.excluded.iter().any(|fragment| lower.contains(fragment))
    }
}

/// The result of one search: zero or one interval per searched tier, in tier
/// order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution<'r> {
    matches: Vec<(&'r str, &'r Interval)>,
}

impl<'r> Resolution<'r> {
    /// The interval chosen in `tier`, if any candidate overlapped.
    pub fn get(&self, tier: &str) -> Option<&'r Interval> {
        self.matches
            .iter()
            .find(|(name, _)| *name == tier)
            .map(|(_, interval)| *interval)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'r str, &'r Interval)> + '_ {
        self.matches.iter().copied()
    }
}

/// Intervals of `intervals` that strictly overlap `query`, in source order.
pub fn candidates<'t>(intervals: &'t [Interval], query: &Interval) -> Vec<&'t Interval> {
    intervals
        .iter()
        .filter(|interval| interval.overlaps(query))
        .collect()
}

/// The overlap resolver.
#[derive(Clone, Debug, Default)]
pub struct Resolver {
    tie_break: TieBreak,
    filter: TierFilter,
}

impl Resolver {
    pub fn new(tie_break: TieBreak) -> Self {
        Self {
            tie_break,
            filter: TierFilter::default(),
        }
    }

    pub fn with_filter(mut self, filter: TierFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn tie_break(&self) -> TieBreak {
        self.tie_break
    }

    /// Searches every accepted tier of `recording` for the interval that
    /// corresponds to `query`.
    ///
    /// Tiers without a candidate are absent from the result. When a tier has
    /// more than one candidate, one is picked according to the tie-break
    /// policy and the ambiguity is written to `log` once.
    pub fn find<'r>(
        &self,
        recording: &'r Recording,
        query: &Interval,
        log: &mut DiagnosticLog,
    ) -> Resolution<'r> {
        let matches = recording
            .tiers
            .iter()
            .filter(|tier| self.filter.accepts(&tier.name))
            .filter_map(|tier| {
                self.find_in_tier(tier, query, log)
                    .map(|interval| (tier.name.as_str(), interval))
            })
            .collect();
        Resolution { matches }
    }

    /// Searches a single tier, ignoring the tier filter.
    pub fn find_in_tier<'t>(
        &self,
        tier: &'t Tier,
        query: &Interval,
        log: &mut DiagnosticLog,
    ) -> Option<&'t Interval> {
        let found = candidates(&tier.intervals, query);
        match found.len() {
            0 => None,
            1 => Some(found[0]),
            n => {
                log.at(
                    query.start,
                    DiagnosticCode::AmbiguousOverlap,
                    format!(
                        "{n} overlapping intervals found in tier \"{}\" for interval \"{}\". \
                         The interval with the largest overlap has been used.",
                        tier.name, query.text
                    ),
                );
                let index = match self.tie_break {
                    TieBreak::LargestOverlap => largest_overlap(&found, query),
                    TieBreak::Legacy => legacy_choice(&tier.intervals, &found, query),
                };
                Some(found[index])
            }
        }
    }
}

fn largest_overlap(found: &[&Interval], query: &Interval) -> usize {
    let mut best = 0;
    let mut best_overlap = f64::NEG_INFINITY;
    for (index, interval) in found.iter().enumerate() {
        let overlap = interval.overlap_with(query);
        if overlap > best_overlap {
            best = index;
            best_overlap = overlap;
        }
    }
    best
}

fn legacy_choice(tier: &[Interval], found: &[&Interval], query: &Interval) -> usize {
    // `found` is non-empty, so the tier is too.
    let Some(last) = tier.last() else {
        return 0;
    };
    let score = query.end.min(last.end - query.start.max(last.start));
    if score > 0.0 {
        found.len() - 1
    } else {
        0
    }
}
