//! One decoded recording ("run"): its name and its tiers.

use serde::{Deserialize, Serialize};

use super::interval::{Interval, Tier};

/// All tiers of one recording, keyed by tier name, in source order.
///
/// Tier order matters only for the order of diagnostic lines the resolver
/// writes, so it is kept as the decoder produced it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Filename stem of the annotation file.
    pub name: String,
    pub tiers: Vec<Tier>,
}

impl Recording {
    pub fn new(name: impl Into<String>, tiers: Vec<Tier>) -> Self {
        Self {
            name: name.into(),
            tiers,
        }
    }

    /// Looks up a tier by exact name.
    pub fn tier(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|tier| tier.name == name)
    }

    /// Intervals of a tier, or an empty slice when the tier is missing.
    pub fn intervals(&self, name: &str) -> &[Interval] {
        self.tier(name)
            .map(|tier| tier.intervals.as_slice())
            .unwrap_or(&[])
    }

    pub fn tier_names(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().map(|tier| tier.name.as_str())
    }

    /// Adds or replaces a tier, keeping the position of a replaced one.
    pub fn insert_tier(&mut self, tier: Tier) {
        match self.tiers.iter_mut().find(|t| t.name == tier.name) {
            Some(existing) => *existing = tier,
            None => self.tiers.push(tier),
        }
    }

    /// Total number of intervals across all tiers.
    pub fn interval_count(&self) -> usize {
        self.tiers.iter().map(Tier::len).sum()
    }
}
