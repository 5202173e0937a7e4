//! Pricing Warehouse - portfolio experience analytics for life and health products
//!
//! This library provides:
//! - Portfolio records (policyholders, policies, premiums, claims) with integrity checks
//! - JSON loading and a seeded synthetic portfolio generator
//! - Loss ratio, frequency and severity roll-ups by product, cohort, region,
//!   calendar year and policy duration
//! - Loss-ratio ranking and year-over-year trend deltas
//! - A boundary for narrative insights and CSV export of every view

pub mod error;
pub mod portfolio;
pub mod analysis;
pub mod narrative;
pub mod export;

// Re-export commonly used types
pub use error::{PortfolioError, PortfolioResult};
pub use portfolio::{Dataset, GeneratorConfig, PortfolioGenerator, ProductType};
pub use analysis::{AnalysisConfig, AnalysisEngine, AnalysisResult, compute_analysis, compute_analysis_as_of};
pub use narrative::{Insight, InsightProvider};
