//! Portfolio records matching the warehouse upload format

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{PortfolioError, PortfolioResult};

pub type PolicyholderId = u32;
pub type PolicyId = u32;
pub type PremiumId = u32;
pub type ClaimId = u32;

/// Gender of the policyholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

/// Income band of the policyholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncomeBand {
    Low,
    Medium,
    High,
}

/// How a claim on the product is settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenefitKind {
    /// Death benefit, pays the full sum insured
    Death,
    /// Lump sum on diagnosis, pays most of the sum insured
    CriticalIllness,
    /// Income replacement, pays a fraction of the sum insured
    Disability,
}

/// Product catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "Term Life")]
    TermLife,
    #[serde(rename = "Whole Life")]
    WholeLife,
    #[serde(rename = "Critical Illness")]
    CriticalIllness,
    #[serde(rename = "Disability Income")]
    DisabilityIncome,
}

impl ProductType {
    pub const ALL: [ProductType; 4] = [
        ProductType::TermLife,
        ProductType::WholeLife,
        ProductType::CriticalIllness,
        ProductType::DisabilityIncome,
    ];

    /// Display name, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::TermLife => "Term Life",
            ProductType::WholeLife => "Whole Life",
            ProductType::CriticalIllness => "Critical Illness",
            ProductType::DisabilityIncome => "Disability Income",
        }
    }

    pub fn benefit_kind(&self) -> BenefitKind {
        match self {
            ProductType::TermLife | ProductType::WholeLife => BenefitKind::Death,
            ProductType::CriticalIllness => BenefitKind::CriticalIllness,
            ProductType::DisabilityIncome => BenefitKind::Disability,
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy status at the snapshot date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyStatus {
    Active,
    Lapsed,
}

/// Claim settlement status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Paid,
    Pending,
    Declined,
}

/// A policyholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policyholder {
    pub policyholder_id: PolicyholderId,
    pub age: u8,
    pub gender: Gender,
    pub region: String,
    pub income_band: IncomeBand,
}

/// A single policy record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Unique policy identifier
    pub policy_id: PolicyId,

    /// Owning policyholder
    pub policyholder_id: PolicyholderId,

    /// Product from the fixed catalog
    pub product_type: ProductType,

    /// Issue date
    pub issue_date: NaiveDate,

    /// Face amount, strictly positive
    pub sum_insured: f64,

    /// Active or Lapsed
    pub policy_status: PolicyStatus,

    /// Lapse date, if known
    #[serde(default)]
    pub lapse_date: Option<NaiveDate>,
}

impl Policy {
    /// Whole days elapsed between issue and `as_of` (negative if issued later)
    pub fn days_elapsed(&self, as_of: NaiveDate) -> i64 {
        (as_of - self.issue_date).num_days()
    }

    /// Elapsed months since issue, counted as whole 30-day periods.
    /// Issue dates after `as_of` count as zero.
    pub fn months_elapsed(&self, as_of: NaiveDate) -> u32 {
        (self.days_elapsed(as_of).max(0) / 30) as u32
    }
}

/// A premium payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Premium {
    pub premium_id: PremiumId,
    pub policy_id: PolicyId,
    pub premium_amount: f64,
    pub payment_date: NaiveDate,
}

/// A claim against a policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub claim_id: ClaimId,
    pub policy_id: PolicyId,
    pub claim_date: NaiveDate,
    pub claim_amount: f64,
    pub claim_type: ProductType,
    pub claim_status: ClaimStatus,
}

/// The four linked collections of one portfolio snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub policyholders: Vec<Policyholder>,
    pub policies: Vec<Policy>,
    pub premiums: Vec<Premium>,
    pub claims: Vec<Claim>,
}

impl Dataset {
    /// Check keys, foreign keys and value constraints.
    ///
    /// Any violation rejects the whole dataset; no record is silently dropped.
    pub fn validate(&self) -> PortfolioResult<()> {
        let mut holder_ids = HashSet::with_capacity(self.policyholders.len());
        for holder in &self.policyholders {
            if !holder_ids.insert(holder.policyholder_id) {
                return Err(duplicate("policyholder", holder.policyholder_id));
            }
        }

        let mut policy_issue = std::collections::HashMap::with_capacity(self.policies.len());
        for policy in &self.policies {
            if !holder_ids.contains(&policy.policyholder_id) {
                return Err(PortfolioError::ReferentialIntegrity {
                    entity: "policy",
                    id: policy.policy_id,
                    parent: "policyholder",
                    parent_id: policy.policyholder_id,
                });
            }
            if !(policy.sum_insured.is_finite() && policy.sum_insured > 0.0) {
                return Err(invalid("policy", policy.policy_id, "sum insured must be positive"));
            }
            if policy_issue.insert(policy.policy_id, policy.issue_date).is_some() {
                return Err(duplicate("policy", policy.policy_id));
            }
        }

        let mut premium_ids = HashSet::with_capacity(self.premiums.len());
        for premium in &self.premiums {
            if !premium_ids.insert(premium.premium_id) {
                return Err(duplicate("premium", premium.premium_id));
            }
            if !policy_issue.contains_key(&premium.policy_id) {
                return Err(PortfolioError::ReferentialIntegrity {
                    entity: "premium",
                    id: premium.premium_id,
                    parent: "policy",
                    parent_id: premium.policy_id,
                });
            }
            if !non_negative(premium.premium_amount) {
                return Err(invalid("premium", premium.premium_id, "amount must be non-negative"));
            }
        }

        let mut claim_ids = HashSet::with_capacity(self.claims.len());
        for claim in &self.claims {
            if !claim_ids.insert(claim.claim_id) {
                return Err(duplicate("claim", claim.claim_id));
            }
            let issue_date = policy_issue.get(&claim.policy_id).ok_or(
                PortfolioError::ReferentialIntegrity {
                    entity: "claim",
                    id: claim.claim_id,
                    parent: "policy",
                    parent_id: claim.policy_id,
                },
            )?;
            if !non_negative(claim.claim_amount) {
                return Err(invalid("claim", claim.claim_id, "amount must be non-negative"));
            }
            if claim.claim_date < *issue_date {
                return Err(invalid(
                    "claim",
                    claim.claim_id,
                    &format!("claim date {} precedes issue date {}", claim.claim_date, issue_date),
                ));
            }
        }

        Ok(())
    }
}

fn non_negative(amount: f64) -> bool {
    amount.is_finite() && amount >= 0.0
}

fn duplicate(entity: &'static str, id: u32) -> PortfolioError {
    invalid(entity, id, "duplicate identifier")
}

fn invalid(entity: &'static str, id: u32, reason: &str) -> PortfolioError {
    PortfolioError::InvalidRecord {
        entity,
        id,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn small_dataset() -> Dataset {
        Dataset {
            policyholders: vec![Policyholder {
                policyholder_id: 1,
                age: 35,
                gender: Gender::Male,
                region: "North".to_string(),
                income_band: IncomeBand::Medium,
            }],
            policies: vec![Policy {
                policy_id: 1,
                policyholder_id: 1,
                product_type: ProductType::TermLife,
                issue_date: date(2023, 1, 15),
                sum_insured: 100_000.0,
                policy_status: PolicyStatus::Active,
                lapse_date: None,
            }],
            premiums: vec![Premium {
                premium_id: 1,
                policy_id: 1,
                premium_amount: 291.0,
                payment_date: date(2023, 1, 15),
            }],
            claims: vec![Claim {
                claim_id: 1,
                policy_id: 1,
                claim_date: date(2023, 6, 20),
                claim_amount: 25_000.0,
                claim_type: ProductType::CriticalIllness,
                claim_status: ClaimStatus::Paid,
            }],
        }
    }

    #[test]
    fn test_product_benefit_kind() {
        assert_eq!(ProductType::TermLife.benefit_kind(), BenefitKind::Death);
        assert_eq!(ProductType::WholeLife.benefit_kind(), BenefitKind::Death);
        assert_eq!(ProductType::CriticalIllness.benefit_kind(), BenefitKind::CriticalIllness);
        assert_eq!(ProductType::DisabilityIncome.benefit_kind(), BenefitKind::Disability);
        assert_eq!(ProductType::DisabilityIncome.to_string(), "Disability Income");
    }

    #[test]
    fn test_policy_timing() {
        let policy = &small_dataset().policies[0];

        assert_eq!(policy.months_elapsed(date(2023, 1, 15)), 0);
        // 29 days is still month 0, 30 days is month 1
        assert_eq!(policy.months_elapsed(date(2023, 2, 13)), 0);
        assert_eq!(policy.months_elapsed(date(2023, 2, 14)), 1);
        // 365 days -> 12 thirty-day periods
        assert_eq!(policy.months_elapsed(date(2024, 1, 15)), 12);
        // Issued after the reference date
        assert_eq!(policy.months_elapsed(date(2022, 12, 31)), 0);
    }

    #[test]
    fn test_validate_accepts_consistent_dataset() {
        assert!(small_dataset().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_orphan_claim() {
        let mut data = small_dataset();
        data.claims[0].policy_id = 99;

        match data.validate() {
            Err(PortfolioError::ReferentialIntegrity { entity, parent_id, .. }) => {
                assert_eq!(entity, "claim");
                assert_eq!(parent_id, 99);
            }
            other => panic!("expected integrity error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_orphan_policy() {
        let mut data = small_dataset();
        data.policies[0].policyholder_id = 7;
        assert!(matches!(
            data.validate(),
            Err(PortfolioError::ReferentialIntegrity { entity: "policy", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut data = small_dataset();
        data.premiums[0].premium_amount = -1.0;
        assert!(matches!(data.validate(), Err(PortfolioError::InvalidRecord { entity: "premium", .. })));

        let mut data = small_dataset();
        data.policies[0].sum_insured = 0.0;
        assert!(matches!(data.validate(), Err(PortfolioError::InvalidRecord { entity: "policy", .. })));

        let mut data = small_dataset();
        data.claims[0].claim_date = date(2022, 12, 1);
        assert!(matches!(data.validate(), Err(PortfolioError::InvalidRecord { entity: "claim", .. })));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut data = small_dataset();
        let extra = data.premiums[0].clone();
        data.premiums.push(extra);
        assert!(matches!(data.validate(), Err(PortfolioError::InvalidRecord { entity: "premium", .. })));
    }
}
