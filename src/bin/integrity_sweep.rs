//! Generate many seeded portfolios and check each one analyses cleanly
//!
//! Every dataset must pass integrity validation and the analysis must
//! conserve premium across all five views.

use anyhow::{bail, Context, Result};
use clap::Parser;
use pricing_warehouse::analysis::{AnalysisConfig, AnalysisEngine};
use pricing_warehouse::portfolio::{GeneratorConfig, PortfolioGenerator};
use rayon::prelude::*;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "integrity-sweep")]
struct Args {
    /// Number of seeds to run
    #[arg(long, default_value_t = 1000)]
    seeds: u64,

    /// First seed
    #[arg(long, default_value_t = 0)]
    start: u64,

    #[arg(long, default_value_t = 200)]
    policies: u32,

    #[arg(long, default_value_t = 120)]
    policyholders: u32,
}

/// Largest relative gap between a view's premium total and the portfolio total
fn premium_drift(seed: u64, generator: &PortfolioGenerator) -> Result<f64> {
    let dataset = generator.generate_seeded(seed);
    dataset.validate().with_context(|| format!("seed {} failed validation", seed))?;

    let config = AnalysisConfig { as_of: generator.as_of(), parallel: false };
    let result = AnalysisEngine::new(config)
        .analyze(&dataset)
        .with_context(|| format!("seed {} failed analysis", seed))?;

    let total = result.summary.total_premiums;
    let views = [
        result.loss_ratio_by_product.iter().map(|r| r.total_premiums).sum::<f64>(),
        result.frequency_by_cohort.iter().map(|r| r.total_premiums).sum::<f64>(),
        result.loss_ratio_by_region.iter().map(|r| r.total_premiums).sum::<f64>(),
        result.trend_data.iter().map(|r| r.total_premiums).sum::<f64>(),
        result.duration_data.iter().map(|r| r.total_premiums).sum::<f64>(),
    ];
    Ok(views
        .iter()
        .map(|v| if total > 0.0 { (v - total).abs() / total } else { v.abs() })
        .fold(0.0, f64::max))
}

/// Seeds `start..start + count`, clipped at `u64::MAX`
fn seed_range(start: u64, count: u64) -> std::ops::Range<u64> {
    start..start.saturating_add(count)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = GeneratorConfig {
        policy_count: args.policies,
        policyholder_count: args.policyholders,
        ..GeneratorConfig::default()
    };
    let generator = PortfolioGenerator::new(config).context("Invalid generator config")?;

    let seeds = seed_range(args.start, args.seeds);
    println!("Sweeping {} seeds from {}...", seeds.end - seeds.start, seeds.start);
    let start = Instant::now();

    let outcomes: Vec<(u64, Result<f64>)> = seeds
        .into_par_iter()
        .map(|seed| (seed, premium_drift(seed, &generator)))
        .collect();

    let mut failures = 0;
    let mut worst = 0.0_f64;
    for (seed, outcome) in &outcomes {
        match outcome {
            Ok(drift) => worst = worst.max(*drift),
            Err(e) => {
                failures += 1;
                println!("  seed {}: {:#}", seed, e);
            }
        }
    }

    println!("Completed in {:?}", start.elapsed());
    println!("  Seeds: {}", outcomes.len());
    println!("  Failures: {}", failures);
    println!("  Max premium drift: {:.3e}", worst);

    if failures > 0 {
        bail!("{} of {} seeds failed", failures, outcomes.len());
    }
    if worst > 1e-9 {
        bail!("premium not conserved across views (drift {:.3e})", worst);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_range() {
        assert_eq!(seed_range(10, 3), 10..13);
        assert_eq!(seed_range(u64::MAX - 1, 1000), u64::MAX - 1..u64::MAX);
        assert!(seed_range(u64::MAX, 5).is_empty());
    }

    #[test]
    fn test_premium_drift_is_zero_for_generated_book() {
        let config = GeneratorConfig {
            policy_count: 50,
            policyholder_count: 30,
            as_of: chrono::NaiveDate::from_ymd_opt(2025, 6, 30),
            ..GeneratorConfig::default()
        };
        let generator = PortfolioGenerator::new(config).unwrap();
        let drift = premium_drift(4, &generator).unwrap();
        assert!(drift < 1e-9);
    }
}
