//! Group accumulators and derived actuarial metrics
//!
//! Rounding matches the published output contract: loss ratios to 2 decimal
//! places, frequencies to 3, YoY deltas to 1, dollar averages to whole units.

use crate::error::{PortfolioError, PortfolioResult};

/// Round half away from zero to `places` decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn round0(value: f64) -> f64 {
    value.round()
}

pub fn round1(value: f64) -> f64 {
    round_to(value, 1)
}

pub fn round2(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn round3(value: f64) -> f64 {
    round_to(value, 3)
}

/// `numerator / denominator`, or `DivisionUndefined` naming the denominator
pub fn safe_div(numerator: f64, denominator: f64, denominator_name: &'static str) -> PortfolioResult<f64> {
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(PortfolioError::DivisionUndefined(denominator_name));
    }
    Ok(numerator / denominator)
}

/// Ratio expressed as a percentage, `None` when the denominator is zero
pub fn percent(numerator: f64, denominator: f64, denominator_name: &'static str) -> Option<f64> {
    safe_div(numerator, denominator, denominator_name)
        .ok()
        .map(|ratio| ratio * 100.0)
}

/// Premium and claim roll-up of a single policy
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PolicyRollup {
    pub premiums: f64,
    pub claims: f64,
    pub claim_count: u32,
}

/// Running totals for one dimension value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupTotals {
    pub total_premiums: f64,
    pub total_claims: f64,
    pub policy_count: u32,
    pub claim_count: u32,
}

impl GroupTotals {
    /// Accumulate one policy's roll-up
    pub fn add_policy(&mut self, rollup: PolicyRollup) {
        self.total_premiums += rollup.premiums;
        self.total_claims += rollup.claims;
        self.policy_count += 1;
        self.claim_count += rollup.claim_count;
    }

    pub fn add_premium(&mut self, amount: f64) {
        self.total_premiums += amount;
    }

    pub fn add_claim(&mut self, amount: f64) {
        self.total_claims += amount;
        self.claim_count += 1;
    }

    /// Claims / premiums as a percentage, 2dp. `None` when no premium was collected.
    pub fn loss_ratio(&self) -> Option<f64> {
        percent(self.total_claims, self.total_premiums, "total premiums").map(round2)
    }

    /// Claims per policy as a percentage, 3dp
    pub fn claim_frequency(&self) -> Option<f64> {
        percent(self.claim_count as f64, self.policy_count as f64, "policy count").map(round3)
    }

    /// Average claim amount, 0 when there are no claims
    pub fn avg_claim_severity(&self) -> f64 {
        safe_div(self.total_claims, self.claim_count as f64, "claim count")
            .map(round0)
            .unwrap_or(0.0)
    }

    /// Claim cost per policy
    pub fn pure_premium(&self) -> Option<f64> {
        safe_div(self.total_claims, self.policy_count as f64, "policy count")
            .ok()
            .map(round0)
    }

    pub fn avg_premium_per_policy(&self) -> Option<f64> {
        safe_div(self.total_premiums, self.policy_count as f64, "policy count")
            .ok()
            .map(round0)
    }
}
