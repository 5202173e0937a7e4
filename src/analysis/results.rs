//! Analysis output structures
//!
//! Field names serialize in camelCase and `None` serializes as `null`, which
//! is the shape downstream renderers and the narrative collaborator consume.

use super::aggregate::DurationBand;
use super::metrics::{round0, GroupTotals};
use super::ranking::{LagDelta, Ranked};
use crate::portfolio::ProductType;
use serde::{Deserialize, Serialize};

/// Product view row, ranked by loss ratio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLossRatio {
    pub product: ProductType,
    pub rank: u32,
    pub loss_ratio: Option<f64>,
    pub total_premiums: f64,
    pub total_claims: f64,
    pub policy_count: u32,
    pub claim_count: u32,
    pub avg_premium_per_policy: Option<f64>,
    pub avg_claim_severity: f64,
    pub claim_frequency: Option<f64>,
    pub pure_premium: Option<f64>,
}

impl ProductLossRatio {
    /// Unranked row; `dense_rank` assigns the rank
    pub fn from_group(product: ProductType, group: &GroupTotals) -> Self {
        Self {
            product,
            rank: 0,
            loss_ratio: group.loss_ratio(),
            total_premiums: group.total_premiums,
            total_claims: group.total_claims,
            policy_count: group.policy_count,
            claim_count: group.claim_count,
            avg_premium_per_policy: group.avg_premium_per_policy(),
            avg_claim_severity: group.avg_claim_severity(),
            claim_frequency: group.claim_frequency(),
            pure_premium: group.pure_premium(),
        }
    }
}

impl Ranked for ProductLossRatio {
    fn loss_ratio(&self) -> Option<f64> {
        self.loss_ratio
    }

    fn set_rank(&mut self, rank: u32) {
        self.rank = rank;
    }
}

/// Issue-year cohort row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortFrequency {
    /// Issue year, e.g. "2023"
    pub cohort: String,
    /// Claim frequency, percent
    pub frequency: Option<f64>,
    pub loss_ratio: Option<f64>,
    pub policy_count: u32,
    pub claim_count: u32,
    pub total_premiums: f64,
    pub total_claims: f64,
    pub yoy_change: Option<f64>,
    pub yoy_change_abs: Option<f64>,
}

impl CohortFrequency {
    pub fn from_group(issue_year: i32, group: &GroupTotals, lag: LagDelta) -> Self {
        Self {
            cohort: issue_year.to_string(),
            frequency: group.claim_frequency(),
            loss_ratio: group.loss_ratio(),
            policy_count: group.policy_count,
            claim_count: group.claim_count,
            total_premiums: group.total_premiums,
            total_claims: group.total_claims,
            yoy_change: lag.yoy_change,
            yoy_change_abs: lag.yoy_change_abs,
        }
    }
}

/// Region row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionLossRatio {
    pub region: String,
    pub loss_ratio: Option<f64>,
    pub total_premiums: f64,
    pub total_claims: f64,
    pub policy_count: u32,
    pub claim_count: u32,
}

impl RegionLossRatio {
    pub fn from_group(region: String, group: &GroupTotals) -> Self {
        Self {
            region,
            loss_ratio: group.loss_ratio(),
            total_premiums: group.total_premiums,
            total_claims: group.total_claims,
            policy_count: group.policy_count,
            claim_count: group.claim_count,
        }
    }
}

/// Calendar-year cash row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// Calendar year, e.g. "2024"
    pub year: String,
    pub loss_ratio: Option<f64>,
    /// Premiums in thousands
    pub premiums: f64,
    /// Claims in thousands
    pub claims: f64,
    pub total_premiums: f64,
    pub total_claims: f64,
    pub claim_count: u32,
    pub yoy_change: Option<f64>,
    pub yoy_change_abs: Option<f64>,
}

impl TrendPoint {
    pub fn from_group(year: i32, group: &GroupTotals, lag: LagDelta) -> Self {
        Self {
            year: year.to_string(),
            loss_ratio: group.loss_ratio(),
            premiums: round0(group.total_premiums / 1000.0),
            claims: round0(group.total_claims / 1000.0),
            total_premiums: group.total_premiums,
            total_claims: group.total_claims,
            claim_count: group.claim_count,
            yoy_change: lag.yoy_change,
            yoy_change_abs: lag.yoy_change_abs,
        }
    }
}

/// Duration band row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationLossRatio {
    pub duration: DurationBand,
    pub loss_ratio: Option<f64>,
    pub policy_count: u32,
    pub claim_count: u32,
    pub total_premiums: f64,
    pub total_claims: f64,
}

impl DurationLossRatio {
    pub fn from_group(duration: DurationBand, group: &GroupTotals) -> Self {
        Self {
            duration,
            loss_ratio: group.loss_ratio(),
            policy_count: group.policy_count,
            claim_count: group.claim_count,
            total_premiums: group.total_premiums,
            total_claims: group.total_claims,
        }
    }
}

/// Portfolio-wide totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub total_policies: usize,
    pub total_policyholders: usize,
    pub total_premiums: f64,
    pub total_claims: f64,
    pub claim_count: usize,
    pub overall_loss_ratio: Option<f64>,
}

/// Complete analysis of one portfolio snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Sorted by rank ascending
    pub loss_ratio_by_product: Vec<ProductLossRatio>,
    /// Sorted by issue year ascending
    pub frequency_by_cohort: Vec<CohortFrequency>,
    /// Sorted by region name
    pub loss_ratio_by_region: Vec<RegionLossRatio>,
    /// Sorted by calendar year ascending
    pub trend_data: Vec<TrendPoint>,
    /// Year 1 through Year 4+, bands present only
    pub duration_data: Vec<DurationLossRatio>,
    pub summary: PortfolioSummary,
}

impl AnalysisResult {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(premiums: f64, claims: f64, policies: u32, claim_count: u32) -> GroupTotals {
        GroupTotals {
            total_premiums: premiums,
            total_claims: claims,
            policy_count: policies,
            claim_count,
        }
    }

    #[test]
    fn test_product_row_field_names() {
        let row = ProductLossRatio::from_group(ProductType::WholeLife, &group(2_000.0, 500.0, 4, 1));
        let json = serde_json::to_value(&row).unwrap();

        assert_eq!(json["product"], "Whole Life");
        assert_eq!(json["lossRatio"], 25.0);
        assert_eq!(json["avgPremiumPerPolicy"], 500.0);
        assert_eq!(json["avgClaimSeverity"], 500.0);
        assert_eq!(json["claimFrequency"], 25.0);
        assert_eq!(json["purePremium"], 125.0);
        assert_eq!(json["policyCount"], 4);
    }

    #[test]
    fn test_null_loss_ratio_serializes_as_null() {
        let row = RegionLossRatio::from_group("East".to_string(), &group(0.0, 100.0, 1, 1));
        let json = serde_json::to_value(&row).unwrap();
        assert!(json["lossRatio"].is_null());
    }

    #[test]
    fn test_trend_point_thousands() {
        let point = TrendPoint::from_group(2024, &group(1_234_567.0, 456_499.0, 0, 12), LagDelta::default());
        assert_eq!(point.year, "2024");
        assert_eq!(point.premiums, 1235.0);
        assert_eq!(point.claims, 456.0);

        let json = serde_json::to_value(&point).unwrap();
        assert!(json["yoyChange"].is_null());
        assert!(json["yoyChangeAbs"].is_null());
    }

    #[test]
    fn test_duration_row_label() {
        let row = DurationLossRatio::from_group(DurationBand::Year3, &group(100.0, 10.0, 2, 1));
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["duration"], "Year 3");
        assert_eq!(json["lossRatio"], 10.0);
    }
}
