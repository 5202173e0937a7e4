//! Analysis engine: runs every aggregation view over one portfolio snapshot

use super::aggregate::{
    aggregate_by, aggregate_calendar_years, by_duration, by_issue_year, by_product, by_region,
    DurationBand, Groups,
};
use super::index::PortfolioIndex;
use super::metrics::{percent, round2};
use super::ranking::{dense_rank, lag_deltas};
use super::results::{
    AnalysisResult, CohortFrequency, DurationLossRatio, PortfolioSummary, ProductLossRatio,
    RegionLossRatio, TrendPoint,
};
use crate::error::PortfolioResult;
use crate::portfolio::{Dataset, ProductType};
use chrono::{Local, NaiveDate};
use log::{info, warn};
use std::time::Instant;

/// Configuration for an analysis run
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Reference date for policy durations
    pub as_of: NaiveDate,

    /// Run the independent aggregations on the rayon pool
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            as_of: Local::now().date_naive(),
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    pub fn as_of(as_of: NaiveDate) -> Self {
        Self { as_of, ..Self::default() }
    }
}

/// Raw per-dimension accumulators, before ordering and derivation
struct DimensionGroups {
    products: Groups<ProductType>,
    cohorts: Groups<i32>,
    regions: Groups<String>,
    durations: Groups<DurationBand>,
    years: Groups<i32>,
}

/// Main analysis engine
pub struct AnalysisEngine {
    config: AnalysisConfig,
}

impl AnalysisEngine {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse a dataset.
    ///
    /// Either every view is produced or the run fails with the first
    /// integrity error; no partial result is returned.
    pub fn analyze(&self, dataset: &Dataset) -> PortfolioResult<AnalysisResult> {
        let start = Instant::now();
        let index = PortfolioIndex::build(dataset)?;

        let groups = if self.config.parallel {
            self.aggregate_parallel(&index)
        } else {
            self.aggregate_serial(&index)
        };

        let result = AnalysisResult {
            loss_ratio_by_product: product_view(groups.products),
            frequency_by_cohort: cohort_view(groups.cohorts),
            loss_ratio_by_region: region_view(groups.regions),
            trend_data: trend_view(groups.years),
            duration_data: duration_view(groups.durations),
            summary: summarize(dataset),
        };

        warn_undefined(&result);
        info!(
            "Analysed {} policies ({} products, {} cohorts, {} regions, {} calendar years) in {:?}",
            result.summary.total_policies,
            result.loss_ratio_by_product.len(),
            result.frequency_by_cohort.len(),
            result.loss_ratio_by_region.len(),
            result.trend_data.len(),
            start.elapsed()
        );
        Ok(result)
    }

    fn aggregate_serial(&self, index: &PortfolioIndex<'_>) -> DimensionGroups {
        DimensionGroups {
            products: aggregate_by(index, by_product),
            cohorts: aggregate_by(index, by_issue_year),
            regions: aggregate_by(index, by_region),
            durations: aggregate_by(index, by_duration(self.config.as_of)),
            years: aggregate_calendar_years(index.dataset()),
        }
    }

    /// Each branch reads the shared index and owns its output buckets
    fn aggregate_parallel(&self, index: &PortfolioIndex<'_>) -> DimensionGroups {
        let as_of = self.config.as_of;
        let ((products, cohorts), ((regions, durations), years)) = rayon::join(
            || {
                rayon::join(
                    || aggregate_by(index, by_product),
                    || aggregate_by(index, by_issue_year),
                )
            },
            || {
                rayon::join(
                    || {
                        rayon::join(
                            || aggregate_by(index, by_region),
                            || aggregate_by(index, by_duration(as_of)),
                        )
                    },
                    || aggregate_calendar_years(index.dataset()),
                )
            },
        );
        DimensionGroups { products, cohorts, regions, durations, years }
    }
}

fn product_view(products: Groups<ProductType>) -> Vec<ProductLossRatio> {
    let mut rows: Vec<ProductLossRatio> = products
        .into_vec()
        .into_iter()
        .map(|(product, group)| ProductLossRatio::from_group(product, &group))
        .collect();
    dense_rank(&mut rows);
    rows
}

fn cohort_view(cohorts: Groups<i32>) -> Vec<CohortFrequency> {
    let cohorts = cohorts.into_sorted();
    let loss_ratios: Vec<_> = cohorts.iter().map(|(_, g)| g.loss_ratio()).collect();
    cohorts
        .iter()
        .zip(lag_deltas(&loss_ratios))
        .map(|((year, group), lag)| CohortFrequency::from_group(*year, group, lag))
        .collect()
}

fn region_view(regions: Groups<String>) -> Vec<RegionLossRatio> {
    regions
        .into_sorted()
        .into_iter()
        .map(|(region, group)| RegionLossRatio::from_group(region, &group))
        .collect()
}

fn trend_view(years: Groups<i32>) -> Vec<TrendPoint> {
    let years = years.into_sorted();
    let loss_ratios: Vec<_> = years.iter().map(|(_, g)| g.loss_ratio()).collect();
    years
        .iter()
        .zip(lag_deltas(&loss_ratios))
        .map(|((year, group), lag)| TrendPoint::from_group(*year, group, lag))
        .collect()
}

fn duration_view(durations: Groups<DurationBand>) -> Vec<DurationLossRatio> {
    durations
        .into_sorted()
        .into_iter()
        .map(|(band, group)| DurationLossRatio::from_group(band, &group))
        .collect()
}

fn summarize(dataset: &Dataset) -> PortfolioSummary {
    let total_premiums: f64 = dataset.premiums.iter().map(|p| p.premium_amount).sum();
    let total_claims: f64 = dataset.claims.iter().map(|c| c.claim_amount).sum();

    PortfolioSummary {
        total_policies: dataset.policies.len(),
        total_policyholders: dataset.policyholders.len(),
        total_premiums,
        total_claims,
        claim_count: dataset.claims.len(),
        overall_loss_ratio: percent(total_claims, total_premiums, "total premiums").map(round2),
    }
}

fn warn_undefined(result: &AnalysisResult) {
    let undefined = result.loss_ratio_by_product.iter().filter(|r| r.loss_ratio.is_none()).count()
        + result.frequency_by_cohort.iter().filter(|r| r.loss_ratio.is_none()).count()
        + result.loss_ratio_by_region.iter().filter(|r| r.loss_ratio.is_none()).count()
        + result.trend_data.iter().filter(|r| r.loss_ratio.is_none()).count()
        + result.duration_data.iter().filter(|r| r.loss_ratio.is_none()).count();
    if undefined > 0 {
        warn!("{} groups collected no premium; their loss ratio is null", undefined);
    }
    if result.summary.overall_loss_ratio.is_none() {
        warn!("Portfolio collected no premium; overall loss ratio is null");
    }
}

/// Analyse a dataset with durations measured against today's date
pub fn compute_analysis(dataset: &Dataset) -> PortfolioResult<AnalysisResult> {
    AnalysisEngine::new(AnalysisConfig::default()).analyze(dataset)
}

/// Analyse a dataset with durations measured against `as_of`
pub fn compute_analysis_as_of(dataset: &Dataset, as_of: NaiveDate) -> PortfolioResult<AnalysisResult> {
    AnalysisEngine::new(AnalysisConfig::as_of(as_of)).analyze(dataset)
}
