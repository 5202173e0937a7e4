//! Dimensional aggregation of policy roll-ups
//!
//! Policy-level views (product, issue-year cohort, region, duration band)
//! bucket each policy's roll-up under its dimension value. The calendar-year
//! view is a separate join: premiums and claims are bucketed directly by the
//! year of the transaction date, independent of the owning policy.

use super::index::PortfolioIndex;
use super::metrics::GroupTotals;
use crate::portfolio::{Dataset, Policy, Policyholder, ProductType};
use chrono::{Datelike, NaiveDate};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// Accumulators keyed by dimension value, kept in first-appearance order.
///
/// Buckets are created lazily. Presentation order is always re-derived by
/// an explicit sort; first-appearance order only breaks ties.
#[derive(Debug, Clone)]
pub struct Groups<K> {
    slots: HashMap<K, usize>,
    groups: Vec<(K, GroupTotals)>,
}

impl<K: Eq + Hash + Clone> Groups<K> {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            groups: Vec::new(),
        }
    }

    /// Accumulator for `key`, created on first sight
    pub fn bucket(&mut self, key: K) -> &mut GroupTotals {
        let slot = match self.slots.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = self.groups.len();
                self.slots.insert(key.clone(), slot);
                self.groups.push((key, GroupTotals::default()));
                slot
            }
        };
        &mut self.groups[slot].1
    }

    pub fn get(&self, key: &K) -> Option<&GroupTotals> {
        self.slots.get(key).map(|&slot| &self.groups[slot].1)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(K, GroupTotals)> {
        self.groups.iter()
    }

    /// Groups in first-appearance order
    pub fn into_vec(self) -> Vec<(K, GroupTotals)> {
        self.groups
    }

    /// Groups sorted ascending by key (stable)
    pub fn into_sorted(self) -> Vec<(K, GroupTotals)>
    where
        K: Ord,
    {
        let mut groups = self.groups;
        groups.sort_by(|a, b| a.0.cmp(&b.0));
        groups
    }
}

impl<K: Eq + Hash + Clone> Default for Groups<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Bucket every policy's roll-up under `key_fn(policy, policyholder)`
pub fn aggregate_by<K, F>(index: &PortfolioIndex<'_>, key_fn: F) -> Groups<K>
where
    K: Eq + Hash + Clone,
    F: Fn(&Policy, &Policyholder) -> K,
{
    let mut groups = Groups::new();
    for (policy, holder) in index.policies_with_holders() {
        groups
            .bucket(key_fn(policy, holder))
            .add_policy(index.rollup(policy.policy_id));
    }
    debug!("Aggregated {} policies into {} groups", index.dataset().policies.len(), groups.len());
    groups
}

pub fn by_product(policy: &Policy, _holder: &Policyholder) -> ProductType {
    policy.product_type
}

/// Issue-year cohort
pub fn by_issue_year(policy: &Policy, _holder: &Policyholder) -> i32 {
    policy.issue_date.year()
}

pub fn by_region(_policy: &Policy, holder: &Policyholder) -> String {
    holder.region.clone()
}

/// Duration band key measured against `as_of`
pub fn by_duration(as_of: NaiveDate) -> impl Fn(&Policy, &Policyholder) -> DurationBand {
    move |policy: &Policy, _holder: &Policyholder| DurationBand::from_months(policy.months_elapsed(as_of))
}

/// Policy duration band by elapsed months since issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DurationBand {
    #[serde(rename = "Year 1")]
    Year1,
    #[serde(rename = "Year 2")]
    Year2,
    #[serde(rename = "Year 3")]
    Year3,
    #[serde(rename = "Year 4+")]
    Year4Plus,
}

impl DurationBand {
    /// Determine band from elapsed months
    pub fn from_months(months: u32) -> Self {
        if months < 12 {
            DurationBand::Year1
        } else if months < 24 {
            DurationBand::Year2
        } else if months < 36 {
            DurationBand::Year3
        } else {
            DurationBand::Year4Plus
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DurationBand::Year1 => "Year 1",
            DurationBand::Year2 => "Year 2",
            DurationBand::Year3 => "Year 3",
            DurationBand::Year4Plus => "Year 4+",
        }
    }
}

impl std::fmt::Display for DurationBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cash view by calendar year of the transaction date.
///
/// Premiums go to their payment year and claims to their claim year. A year
/// with claims but no premium still gets a bucket (its loss ratio is undefined).
/// `policy_count` is not meaningful here and stays zero.
pub fn aggregate_calendar_years(dataset: &Dataset) -> Groups<i32> {
    let mut years = Groups::new();
    for premium in &dataset.premiums {
        years.bucket(premium.payment_date.year()).add_premium(premium.premium_amount);
    }
    for claim in &dataset.claims {
        years.bucket(claim.claim_date.year()).add_claim(claim.claim_amount);
    }
    debug!("Bucketed transactions into {} calendar years", years.len());
    years
}
