//! Portfolio analysis: roll-ups, dimensional aggregation, ranking and trends

pub mod aggregate;
pub mod engine;
pub mod index;
pub mod metrics;
pub mod ranking;
pub mod results;

pub use aggregate::{aggregate_by, aggregate_calendar_years, DurationBand, Groups};
pub use engine::{compute_analysis, compute_analysis_as_of, AnalysisConfig, AnalysisEngine};
pub use index::PortfolioIndex;
pub use metrics::{GroupTotals, PolicyRollup};
pub use ranking::{dense_rank, lag_deltas, LagDelta, Ranked};
pub use results::{
    AnalysisResult, CohortFrequency, DurationLossRatio, PortfolioSummary, ProductLossRatio,
    RegionLossRatio, TrendPoint,
};
