//! Pricing Warehouse CLI
//!
//! Generate synthetic portfolios, analyse portfolio snapshots and write the
//! sample input template.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use pricing_warehouse::analysis::{AnalysisConfig, AnalysisEngine, AnalysisResult};
use pricing_warehouse::narrative::{self, SavedResponse};
use pricing_warehouse::portfolio::{self, loader, GeneratorConfig, PortfolioGenerator};
use pricing_warehouse::export;
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "pricing-warehouse")]
#[command(about = "Portfolio loss ratio analytics for life and health products")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a synthetic portfolio and write it as JSON
    Generate {
        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Generator configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the number of policies
        #[arg(long)]
        policies: Option<u32>,

        /// Override the number of policyholders
        #[arg(long)]
        policyholders: Option<u32>,

        /// Snapshot date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Output file
        #[arg(long, default_value = "portfolio.json")]
        out: PathBuf,

        /// Analyse the generated portfolio and print the summary
        #[arg(long)]
        analyze: bool,
    },

    /// Analyse a portfolio JSON file
    Analyze {
        /// Portfolio JSON file
        input: PathBuf,

        /// Reference date for policy durations (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Write the analysis JSON here
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write one CSV per view into this directory
        #[arg(long)]
        csv_dir: Option<PathBuf>,

        /// Run the aggregations on a single thread
        #[arg(long)]
        serial: bool,

        /// Print the narrative brief
        #[arg(long)]
        brief: bool,

        /// Parse a saved narrative response and print its insights
        #[arg(long)]
        insights_from: Option<PathBuf>,
    },

    /// Write the sample input template
    Template {
        #[arg(long, default_value = "portfolio_template.json")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    match Args::parse().command {
        Command::Generate { seed, config, policies, policyholders, as_of, out, analyze } => {
            let mut config = match config {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("Failed to open generator config {}", path.display()))?;
                    serde_json::from_reader::<_, GeneratorConfig>(file)
                        .with_context(|| format!("Invalid generator config {}", path.display()))?
                }
                None => GeneratorConfig::default(),
            };
            if let Some(n) = policies {
                config.policy_count = n;
            }
            if let Some(n) = policyholders {
                config.policyholder_count = n;
            }
            if as_of.is_some() {
                config.as_of = as_of;
            }

            let generator = PortfolioGenerator::new(config).context("Invalid generator config")?;
            let snapshot = generator.as_of();

            let start = Instant::now();
            let dataset = generator.generate_seeded(seed);
            println!(
                "Generated {} policyholders, {} policies, {} premiums, {} claims in {:?}",
                dataset.policyholders.len(),
                dataset.policies.len(),
                dataset.premiums.len(),
                dataset.claims.len(),
                start.elapsed()
            );

            let file = File::create(&out).with_context(|| format!("Failed to create {}", out.display()))?;
            serde_json::to_writer_pretty(file, &dataset).context("Failed to write portfolio")?;
            println!("Portfolio written to: {}", out.display());

            if analyze {
                let result = AnalysisEngine::new(AnalysisConfig::as_of(snapshot)).analyze(&dataset)?;
                print_summary(&result);
            }
        }

        Command::Analyze { input, as_of, out, csv_dir, serial, brief, insights_from } => {
            let dataset = portfolio::load_dataset(&input)
                .with_context(|| format!("Failed to load portfolio {}", input.display()))?;

            let mut config = AnalysisConfig::default();
            if let Some(date) = as_of {
                config.as_of = date;
            }
            config.parallel = !serial;

            let result = AnalysisEngine::new(config).analyze(&dataset).context("Analysis failed")?;
            print_summary(&result);

            if let Some(path) = out {
                let json = result.to_json_pretty().context("Failed to serialize analysis")?;
                std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
                println!("\nAnalysis written to: {}", path.display());
            }

            if let Some(dir) = csv_dir {
                let paths = export::write_csv_views(&dir, &result)
                    .with_context(|| format!("Failed to export CSV views to {}", dir.display()))?;
                println!("{} CSV views written to: {}", paths.len(), dir.display());
            }

            if brief {
                println!("\n{}", narrative::portfolio_brief(&result));
            }

            if let Some(path) = insights_from {
                let insights = narrative::insights_or_fallback(&SavedResponse::new(path), &result);
                println!("\nInsights:");
                for insight in &insights {
                    println!("  [{}] {}", insight.category, insight.finding);
                    println!("      -> {}", insight.recommendation);
                }
            }
        }

        Command::Template { out } => {
            loader::write_template(&out).with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Template written to: {}", out.display());
        }
    }

    Ok(())
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}%", v)).unwrap_or_else(|| "n/a".to_string())
}

fn print_summary(result: &AnalysisResult) {
    let s = &result.summary;
    println!("\nPortfolio Summary:");
    println!("  Policyholders: {}", s.total_policyholders);
    println!("  Policies: {}", s.total_policies);
    println!("  Written Premium: ${:.2}", s.total_premiums);
    println!("  Claims Incurred: ${:.2}", s.total_claims);
    println!("  Claims: {}", s.claim_count);
    println!("  Loss Ratio: {}", fmt_pct(s.overall_loss_ratio));

    println!("\nLoss Ratio by Product:");
    println!("{:>4} {:<18} {:>10} {:>8} {:>10} {:>12} {:>12}",
        "Rank", "Product", "LR", "Policies", "Freq", "Severity", "PurePrem");
    println!("{}", "-".repeat(80));
    for p in &result.loss_ratio_by_product {
        println!("{:>4} {:<18} {:>10} {:>8} {:>10} {:>12.2} {:>12}",
            p.rank,
            p.product.as_str(),
            fmt_pct(p.loss_ratio),
            p.policy_count,
            fmt_pct(p.claim_frequency),
            p.avg_claim_severity,
            p.pure_premium.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "n/a".to_string()),
        );
    }

    println!("\nIssue-Year Cohorts:");
    println!("{:>6} {:>10} {:>10} {:>8} {:>10} {:>10}",
        "Cohort", "LR", "Freq", "Policies", "YoY", "YoY pts");
    println!("{}", "-".repeat(60));
    for c in &result.frequency_by_cohort {
        println!("{:>6} {:>10} {:>10} {:>8} {:>10} {:>10}",
            c.cohort,
            fmt_pct(c.loss_ratio),
            fmt_pct(c.frequency),
            c.policy_count,
            c.yoy_change.map(|v| format!("{:+.1}%", v)).unwrap_or_else(|| "Baseline".to_string()),
            c.yoy_change_abs.map(|v| format!("{:+.1}", v)).unwrap_or_else(|| "-".to_string()),
        );
    }

    println!("\nRegions:");
    for r in &result.loss_ratio_by_region {
        println!("  {:<10} {:>10} ({} policies, {} claims)",
            r.region, fmt_pct(r.loss_ratio), r.policy_count, r.claim_count);
    }

    println!("\nCalendar Years ($000s):");
    for t in &result.trend_data {
        println!("  {} premiums {:>8} claims {:>8} LR {:>10}",
            t.year, t.premiums, t.claims, fmt_pct(t.loss_ratio));
    }

    println!("\nPolicy Duration:");
    for d in &result.duration_data {
        println!("  {:<8} {:>10} ({} policies)", d.duration.as_str(), fmt_pct(d.loss_ratio), d.policy_count);
    }
}
