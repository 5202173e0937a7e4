//! Pre-built policy index for joins and per-policy roll-ups
//!
//! Premiums and claims are bucketed by `policy_id` once per run, so every
//! aggregation pass reads its roll-ups in O(records of that policy) instead
//! of rescanning the transaction tables.

use super::metrics::PolicyRollup;
use crate::error::PortfolioResult;
use crate::portfolio::{Claim, Dataset, Policy, PolicyId, Policyholder, PolicyholderId, Premium};
use log::debug;
use std::collections::HashMap;

/// Read-only join index over one validated dataset
#[derive(Debug)]
pub struct PortfolioIndex<'a> {
    dataset: &'a Dataset,
    holders: HashMap<PolicyholderId, &'a Policyholder>,
    premiums: HashMap<PolicyId, Vec<&'a Premium>>,
    claims: HashMap<PolicyId, Vec<&'a Claim>>,
}

impl<'a> PortfolioIndex<'a> {
    /// Validate the dataset and build the index.
    ///
    /// Fails with the first integrity or value violation; nothing is indexed
    /// for a dataset that does not validate.
    pub fn build(dataset: &'a Dataset) -> PortfolioResult<Self> {
        dataset.validate()?;

        let holders = dataset
            .policyholders
            .iter()
            .map(|h| (h.policyholder_id, h))
            .collect();

        let mut premiums: HashMap<PolicyId, Vec<&'a Premium>> = HashMap::with_capacity(dataset.policies.len());
        for premium in &dataset.premiums {
            premiums.entry(premium.policy_id).or_default().push(premium);
        }

        let mut claims: HashMap<PolicyId, Vec<&'a Claim>> = HashMap::new();
        for claim in &dataset.claims {
            claims.entry(claim.policy_id).or_default().push(claim);
        }

        debug!(
            "Indexed {} premiums over {} policies, {} claims over {} policies",
            dataset.premiums.len(),
            premiums.len(),
            dataset.claims.len(),
            claims.len()
        );

        Ok(Self { dataset, holders, premiums, claims })
    }

    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    pub fn holder(&self, policyholder_id: PolicyholderId) -> Option<&'a Policyholder> {
        self.holders.get(&policyholder_id).copied()
    }

    /// Every policy joined to its policyholder
    pub fn policies_with_holders(&self) -> impl Iterator<Item = (&'a Policy, &'a Policyholder)> + '_ {
        self.dataset
            .policies
            .iter()
            .filter_map(move |policy| self.holder(policy.policyholder_id).map(|h| (policy, h)))
    }

    pub fn premiums_of(&self, policy_id: PolicyId) -> &[&'a Premium] {
        self.premiums.get(&policy_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn claims_of(&self, policy_id: PolicyId) -> &[&'a Claim] {
        self.claims.get(&policy_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total premium paid on a policy
    pub fn premiums_for(&self, policy_id: PolicyId) -> f64 {
        self.premiums_of(policy_id).iter().map(|p| p.premium_amount).sum()
    }

    /// Total claim amount and claim count on a policy
    pub fn claims_for(&self, policy_id: PolicyId) -> (f64, u32) {
        let claims = self.claims_of(policy_id);
        let total = claims.iter().map(|c| c.claim_amount).sum();
        (total, claims.len() as u32)
    }

    pub fn rollup(&self, policy_id: PolicyId) -> PolicyRollup {
        let (claims, claim_count) = self.claims_for(policy_id);
        PolicyRollup {
            premiums: self.premiums_for(policy_id),
            claims,
            claim_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PortfolioError;
    use crate::portfolio::sample_template;

    fn two_policy_dataset() -> Dataset {
        let mut data = sample_template();
        let mut second = data.policies[0].clone();
        second.policy_id = 2;
        data.policies.push(second);

        let mut premium = data.premiums[0].clone();
        premium.premium_id = 2;
        premium.premium_amount = 309.0;
        data.premiums.push(premium);

        let mut claim = data.claims[0].clone();
        claim.claim_id = 2;
        claim.claim_amount = 1_000.0;
        data.claims.push(claim);
        data
    }

    #[test]
    fn test_rollups() {
        let data = two_policy_dataset();
        let index = PortfolioIndex::build(&data).unwrap();

        assert_eq!(index.premiums_for(1), 600.0);
        assert_eq!(index.claims_for(1), (26_000.0, 2));
        assert_eq!(index.premiums_of(1).len(), 2);

        // Policy without transactions
        assert_eq!(index.premiums_for(2), 0.0);
        assert_eq!(index.claims_for(2), (0.0, 0));
        assert_eq!(index.rollup(2), PolicyRollup::default());

        // Unknown policy id
        assert_eq!(index.premiums_for(99), 0.0);
    }

    #[test]
    fn test_policies_joined_to_holders() {
        let data = two_policy_dataset();
        let index = PortfolioIndex::build(&data).unwrap();

        let joined: Vec<_> = index.policies_with_holders().collect();
        assert_eq!(joined.len(), 2);
        assert!(joined.iter().all(|(p, h)| p.policyholder_id == h.policyholder_id));
    }

    #[test]
    fn test_build_rejects_invalid_dataset() {
        let mut data = two_policy_dataset();
        data.premiums[1].policy_id = 3;
        assert!(matches!(
            PortfolioIndex::build(&data),
            Err(PortfolioError::ReferentialIntegrity { entity: "premium", .. })
        ));
    }
}
