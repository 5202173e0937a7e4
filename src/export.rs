//! CSV export of the analysis views

use crate::analysis::AnalysisResult;
use crate::error::PortfolioResult;
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const PRODUCT_FILE: &str = "loss_ratio_by_product.csv";
pub const COHORT_FILE: &str = "frequency_by_cohort.csv";
pub const REGION_FILE: &str = "loss_ratio_by_region.csv";
pub const TREND_FILE: &str = "trend_data.csv";
pub const DURATION_FILE: &str = "duration_data.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> PortfolioResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write one CSV per view into `dir`, creating it if needed.
///
/// Headers use the same camelCase names as the JSON output; undefined
/// metrics are left empty.
pub fn write_csv_views<P: AsRef<Path>>(dir: P, analysis: &AnalysisResult) -> PortfolioResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let paths: Vec<PathBuf> = [PRODUCT_FILE, COHORT_FILE, REGION_FILE, TREND_FILE, DURATION_FILE, SUMMARY_FILE]
        .iter()
        .map(|name| dir.join(name))
        .collect();

    write_rows(&paths[0], &analysis.loss_ratio_by_product)?;
    write_rows(&paths[1], &analysis.frequency_by_cohort)?;
    write_rows(&paths[2], &analysis.loss_ratio_by_region)?;
    write_rows(&paths[3], &analysis.trend_data)?;
    write_rows(&paths[4], &analysis.duration_data)?;
    write_rows(&paths[5], std::slice::from_ref(&analysis.summary))?;

    info!("Wrote {} CSV views to {}", paths.len(), dir.display());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compute_analysis_as_of;
    use crate::portfolio::sample_template;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()
    }

    #[test]
    fn test_writes_every_view() {
        let analysis = compute_analysis_as_of(&sample_template(), as_of()).unwrap();
        let dir = tempdir().unwrap();

        let paths = write_csv_views(dir.path(), &analysis).unwrap();
        assert_eq!(paths.len(), 6);
        assert!(paths.iter().all(|p| p.exists() && p.starts_with(dir.path())));

        let products = fs::read_to_string(dir.path().join(PRODUCT_FILE)).unwrap();
        let mut lines = products.lines();
        assert_eq!(
            lines.next().unwrap(),
            "product,rank,lossRatio,totalPremiums,totalClaims,policyCount,claimCount,avgPremiumPerPolicy,avgClaimSeverity,claimFrequency,purePremium"
        );
        assert!(lines.next().unwrap().starts_with("Term Life,1,8591.07,291"));

        let durations = fs::read_to_string(dir.path().join(DURATION_FILE)).unwrap();
        assert!(durations.lines().nth(1).unwrap().starts_with("Year 3,"));
    }

    #[test]
    fn test_creates_missing_output_dir() {
        let analysis = compute_analysis_as_of(&sample_template(), as_of()).unwrap();
        let dir = tempdir().unwrap();
        let nested = dir.path().join("runs").join("2025-06");

        write_csv_views(&nested, &analysis).unwrap();
        assert!(nested.join(SUMMARY_FILE).exists());
    }

    #[test]
    fn test_undefined_metrics_are_empty_fields() {
        let mut data = sample_template();
        data.premiums.clear();
        let analysis = compute_analysis_as_of(&data, as_of()).unwrap();
        let dir = tempdir().unwrap();

        write_csv_views(dir.path(), &analysis).unwrap();
        let summary = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        let row = summary.lines().nth(1).unwrap();
        assert!(row.ends_with(','), "row was {}", row);
    }
}
