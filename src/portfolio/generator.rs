//! Synthetic portfolio generator
//!
//! Produces a referentially consistent book of policyholders, policies,
//! premiums and claims calibrated to per-product claim frequency and premium
//! rate. All randomness flows through the caller's RNG so a seed fully
//! determines the dataset.

use super::data::{
    BenefitKind, Claim, ClaimStatus, Dataset, Gender, IncomeBand, Policy, PolicyStatus,
    Policyholder, PolicyholderId, Premium, ProductType,
};
use crate::error::{PortfolioError, PortfolioResult};
use chrono::{Days, Local, Months, NaiveDate};
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Premium history is capped at 3 years of elapsed lifetime
pub const MAX_PREMIUM_MONTHS: u32 = 36;

/// Only the trailing 12 months of premium history are emitted
pub const PREMIUM_WINDOW_MONTHS: u32 = 12;

/// Claims fall within the first 3 years of elapsed lifetime
pub const CLAIM_HORIZON_DAYS: i64 = 1095;

/// Policies younger than this cannot claim
pub const CLAIM_WAITING_DAYS: i64 = 30;

/// Upper bound on policies so every premium id fits in a `u32`
pub const MAX_POLICY_COUNT: u32 = u32::MAX / PREMIUM_WINDOW_MONTHS;

/// Sum insured is drawn in steps of $10,000 from $100k to $540k
const SUM_INSURED_STEP: f64 = 10_000.0;
const SUM_INSURED_STEPS: std::ops::RangeInclusive<u32> = 10..=54;

/// Policyholder ages 25..=74
const AGE_RANGE: std::ops::RangeInclusive<u8> = 25..=74;

const GENDERS: [Gender; 2] = [Gender::Male, Gender::Female];
const INCOME_BANDS: [IncomeBand; 3] = [IncomeBand::Low, IncomeBand::Medium, IncomeBand::High];

/// Calibration parameters for one product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    /// Catalog product
    pub product: ProductType,

    /// Target loss ratio as a fraction (0.42 = 42%)
    pub target_loss_ratio: f64,

    /// Annual probability that a policy claims
    pub claim_frequency: f64,

    /// Annual premium per unit of sum insured
    pub premium_rate: f64,
}

impl ProductSpec {
    pub fn new(product: ProductType, target_loss_ratio: f64, claim_frequency: f64, premium_rate: f64) -> Self {
        Self { product, target_loss_ratio, claim_frequency, premium_rate }
    }

    /// Annual premium, truncated to whole dollars
    pub fn annual_premium(&self, sum_insured: f64) -> f64 {
        (sum_insured * self.premium_rate).floor()
    }

    /// Monthly installment, truncated to whole dollars
    pub fn monthly_premium(&self, sum_insured: f64) -> f64 {
        (self.annual_premium(sum_insured) / 12.0).floor()
    }
}

/// Generator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Product catalog with calibration targets
    #[serde(default = "default_catalog")]
    pub products: Vec<ProductSpec>,

    #[serde(default = "default_policyholder_count")]
    pub policyholder_count: u32,

    #[serde(default = "default_policy_count")]
    pub policy_count: u32,

    /// First issue year of the historical window (inclusive)
    #[serde(default = "default_first_issue_year")]
    pub first_issue_year: i32,

    /// Last issue year of the historical window (inclusive)
    #[serde(default = "default_last_issue_year")]
    pub last_issue_year: i32,

    /// Probability a policy is Active at the snapshot date
    #[serde(default = "default_active_probability")]
    pub active_probability: f64,

    #[serde(default = "default_regions")]
    pub regions: Vec<String>,

    /// Snapshot date used for elapsed lifetimes (default: today)
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

fn default_catalog() -> Vec<ProductSpec> {
    vec![
        ProductSpec::new(ProductType::TermLife, 0.42, 0.020, 0.025),
        ProductSpec::new(ProductType::WholeLife, 0.52, 0.025, 0.035),
        ProductSpec::new(ProductType::CriticalIllness, 0.48, 0.032, 0.028),
        ProductSpec::new(ProductType::DisabilityIncome, 0.45, 0.045, 0.032),
    ]
}
fn default_policyholder_count() -> u32 { 3500 }
fn default_policy_count() -> u32 { 5000 }
fn default_first_issue_year() -> i32 { 2020 }
fn default_last_issue_year() -> i32 { 2024 }
fn default_active_probability() -> f64 { 0.85 }
fn default_regions() -> Vec<String> {
    ["North", "South", "East", "West", "Central"]
        .iter()
        .map(|r| r.to_string())
        .collect()
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            products: default_catalog(),
            policyholder_count: default_policyholder_count(),
            policy_count: default_policy_count(),
            first_issue_year: default_first_issue_year(),
            last_issue_year: default_last_issue_year(),
            active_probability: default_active_probability(),
            regions: default_regions(),
            as_of: None,
        }
    }
}

impl GeneratorConfig {
    /// Reject configurations that could produce an empty or inconsistent book
    pub fn validate(&self) -> PortfolioResult<()> {
        if self.products.is_empty() {
            return Err(config_error("product catalog is empty"));
        }
        for spec in &self.products {
            if !unit_interval(spec.target_loss_ratio) {
                return Err(config_error(format!(
                    "{}: target loss ratio {} outside [0, 1]",
                    spec.product, spec.target_loss_ratio
                )));
            }
            if !unit_interval(spec.claim_frequency) {
                return Err(config_error(format!(
                    "{}: claim frequency {} outside [0, 1]",
                    spec.product, spec.claim_frequency
                )));
            }
            if !(spec.premium_rate.is_finite() && spec.premium_rate > 0.0) {
                return Err(config_error(format!(
                    "{}: premium rate must be positive",
                    spec.product
                )));
            }
        }
        if self.policyholder_count == 0 {
            return Err(config_error("policyholder count must be positive"));
        }
        if self.policy_count == 0 {
            return Err(config_error("policy count must be positive"));
        }
        if self.policy_count > MAX_POLICY_COUNT {
            return Err(config_error(format!(
                "policy count {} exceeds {}",
                self.policy_count, MAX_POLICY_COUNT
            )));
        }
        if self.first_issue_year > self.last_issue_year {
            return Err(config_error(format!(
                "issue window {}..={} is empty",
                self.first_issue_year, self.last_issue_year
            )));
        }
        self.issue_window_start()?;
        if !unit_interval(self.active_probability) {
            return Err(config_error("active probability outside [0, 1]"));
        }
        if self.regions.is_empty() {
            return Err(config_error("region list is empty"));
        }
        Ok(())
    }

    /// First day of the issue window; fails when either end is not a representable date
    fn issue_window_start(&self) -> PortfolioResult<NaiveDate> {
        let unrepresentable = || {
            config_error(format!(
                "issue window {}..={} is outside the supported date range",
                self.first_issue_year, self.last_issue_year
            ))
        };
        NaiveDate::from_ymd_opt(self.last_issue_year, 12, 28).ok_or_else(unrepresentable)?;
        NaiveDate::from_ymd_opt(self.first_issue_year, 1, 1).ok_or_else(unrepresentable)
    }

    fn snapshot_date(&self) -> NaiveDate {
        self.as_of.unwrap_or_else(|| Local::now().date_naive())
    }
}

fn unit_interval(x: f64) -> bool {
    (0.0..=1.0).contains(&x)
}

fn config_error(msg: impl Into<String>) -> PortfolioError {
    PortfolioError::Config(msg.into())
}

/// Claim probability multiplier by policyholder, three tiers keyed on id mod 5
pub fn regional_multiplier(policyholder_id: PolicyholderId) -> f64 {
    match policyholder_id % 5 {
        0 => 1.15,
        1 => 0.90,
        _ => 1.0,
    }
}

/// Claim amount for a settled claim, `u` drawn uniformly from [0, 1)
pub fn claim_severity(kind: BenefitKind, sum_insured: f64, u: f64) -> f64 {
    let fraction = match kind {
        // Full face with a small shave for partial settlements
        BenefitKind::Death => 0.95 + u * 0.05,
        BenefitKind::CriticalIllness => 0.70 + u * 0.30,
        BenefitKind::Disability => 0.12 + u * 0.20,
    };
    (sum_insured * fraction).floor()
}

/// Validated generator, reusable across seeds
#[derive(Debug, Clone)]
pub struct PortfolioGenerator {
    config: GeneratorConfig,
    as_of: NaiveDate,
    window_start: NaiveDate,
}

impl PortfolioGenerator {
    pub fn new(config: GeneratorConfig) -> PortfolioResult<Self> {
        config.validate()?;
        let as_of = config.snapshot_date();
        let window_start = config.issue_window_start()?;
        Ok(Self { config, as_of, window_start })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Snapshot date the elapsed lifetimes are measured against
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Generate a dataset drawing from a seeded ChaCha stream
    pub fn generate_seeded(&self, seed: u64) -> Dataset {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        self.generate(&mut rng)
    }

    /// Generate a dataset drawing from the supplied RNG
    pub fn generate(&self, rng: &mut impl Rng) -> Dataset {
        let policyholders = self.generate_policyholders(rng);
        let (policies, specs) = self.generate_policies(rng);
        let premiums = self.generate_premiums(&policies, &specs);
        let claims = self.generate_claims(&policies, &specs, rng);

        let dataset = Dataset { policyholders, policies, premiums, claims };
        info!(
            "Generated {} policyholders, {} policies, {} premiums, {} claims (as of {})",
            dataset.policyholders.len(),
            dataset.policies.len(),
            dataset.premiums.len(),
            dataset.claims.len(),
            self.as_of
        );
        self.log_calibration(&dataset);
        dataset
    }

    fn generate_policyholders(&self, rng: &mut impl Rng) -> Vec<Policyholder> {
        (1..=self.config.policyholder_count)
            .map(|policyholder_id| Policyholder {
                policyholder_id,
                age: rng.random_range(AGE_RANGE),
                gender: GENDERS[rng.random_range(0..GENDERS.len())],
                region: self.config.regions[rng.random_range(0..self.config.regions.len())].clone(),
                income_band: INCOME_BANDS[rng.random_range(0..INCOME_BANDS.len())],
            })
            .collect()
    }

    /// Policies plus the catalog entry each one was drawn from
    fn generate_policies<'a>(&'a self, rng: &mut impl Rng) -> (Vec<Policy>, Vec<&'a ProductSpec>) {
        let count = self.config.policy_count as usize;
        let mut policies = Vec::with_capacity(count);
        let mut specs = Vec::with_capacity(count);

        for policy_id in 1..=self.config.policy_count {
            let year = rng.random_range(self.config.first_issue_year..=self.config.last_issue_year);
            let month = rng.random_range(1..=12);
            let day = rng.random_range(1..=28);
            // Day <= 28 exists in every month of a validated window
            let issue_date = NaiveDate::from_ymd_opt(year, month, day).unwrap_or(self.window_start);

            let spec = &self.config.products[rng.random_range(0..self.config.products.len())];
            let sum_insured = f64::from(rng.random_range(SUM_INSURED_STEPS)) * SUM_INSURED_STEP;
            let policyholder_id = rng.random_range(1..=self.config.policyholder_count);
            let policy_status = if rng.random::<f64>() < self.config.active_probability {
                PolicyStatus::Active
            } else {
                PolicyStatus::Lapsed
            };

            policies.push(Policy {
                policy_id,
                policyholder_id,
                product_type: spec.product,
                issue_date,
                sum_insured,
                policy_status,
                lapse_date: None,
            });
            specs.push(spec);
        }

        (policies, specs)
    }

    /// One monthly installment per elapsed month, trailing window only
    fn generate_premiums(&self, policies: &[Policy], specs: &[&ProductSpec]) -> Vec<Premium> {
        let mut premiums = Vec::new();

        for (policy, spec) in policies.iter().zip(specs) {
            let monthly = spec.monthly_premium(policy.sum_insured);
            let months_active = policy.months_elapsed(self.as_of).min(MAX_PREMIUM_MONTHS);
            let first_month = months_active.saturating_sub(PREMIUM_WINDOW_MONTHS);

            for month in first_month..months_active {
                let Some(payment_date) = policy.issue_date.checked_add_months(Months::new(month)) else {
                    continue;
                };
                premiums.push(Premium {
                    // At most PREMIUM_WINDOW_MONTHS per policy, bounded by MAX_POLICY_COUNT
                    premium_id: premiums.len() as u32 + 1,
                    policy_id: policy.policy_id,
                    premium_amount: monthly,
                    payment_date,
                });
            }
        }

        premiums
    }

    fn generate_claims(
        &self,
        policies: &[Policy],
        specs: &[&ProductSpec],
        rng: &mut impl Rng,
    ) -> Vec<Claim> {
        let mut claims = Vec::new();

        for (policy, spec) in policies.iter().zip(specs) {
            let probability = spec.claim_frequency * regional_multiplier(policy.policyholder_id);
            if rng.random::<f64>() >= probability {
                continue;
            }

            let days_active = policy.days_elapsed(self.as_of).min(CLAIM_HORIZON_DAYS);
            if days_active <= CLAIM_WAITING_DAYS {
                continue;
            }

            let offset = rng.random_range(0..days_active) as u64;
            let Some(claim_date) = policy.issue_date.checked_add_days(Days::new(offset)) else {
                continue;
            };
            let claim_amount = claim_severity(
                policy.product_type.benefit_kind(),
                policy.sum_insured,
                rng.random::<f64>(),
            );

            claims.push(Claim {
                claim_id: claims.len() as u32 + 1,
                policy_id: policy.policy_id,
                claim_date,
                claim_amount,
                claim_type: policy.product_type,
                claim_status: ClaimStatus::Paid,
            });
        }

        claims
    }

    /// Debug-log realized claim frequency and loss ratio against catalog targets
    fn log_calibration(&self, dataset: &Dataset) {
        if !log::log_enabled!(log::Level::Debug) {
            return;
        }

        let product_of: HashMap<u32, ProductType> = dataset
            .policies
            .iter()
            .map(|p| (p.policy_id, p.product_type))
            .collect();

        // (policies, claims, premium total, claim total)
        let mut realized: HashMap<ProductType, (u32, u32, f64, f64)> = HashMap::new();
        for policy in &dataset.policies {
            realized.entry(policy.product_type).or_default().0 += 1;
        }
        for premium in &dataset.premiums {
            if let Some(product) = product_of.get(&premium.policy_id) {
                realized.entry(*product).or_default().2 += premium.premium_amount;
            }
        }
        for claim in &dataset.claims {
            if let Some(product) = product_of.get(&claim.policy_id) {
                let entry = realized.entry(*product).or_default();
                entry.1 += 1;
                entry.3 += claim.claim_amount;
            }
        }

        for spec in &self.config.products {
            let (policies, claims, premiums, claim_total) =
                realized.get(&spec.product).copied().unwrap_or_default();
            let frequency = if policies > 0 { claims as f64 / policies as f64 } else { 0.0 };
            let loss_ratio = if premiums > 0.0 { claim_total / premiums } else { 0.0 };
            debug!(
                "{}: frequency {:.4} vs target {:.4}, loss ratio {:.3} vs target {:.3}",
                spec.product,
                frequency,
                spec.claim_frequency,
                loss_ratio,
                spec.target_loss_ratio
            );
        }
    }
}

/// Validate `config` and generate one dataset from `rng`
pub fn generate(config: GeneratorConfig, rng: &mut impl Rng) -> PortfolioResult<Dataset> {
    Ok(PortfolioGenerator::new(config)?.generate(rng))
}

/// Validate `config` and generate one dataset from a seed
pub fn generate_seeded(config: GeneratorConfig, seed: u64) -> PortfolioResult<Dataset> {
    Ok(PortfolioGenerator::new(config)?.generate_seeded(seed))
}
