//! Boundary to the external narrative collaborator
//!
//! The collaborator turns a finished [`AnalysisResult`] into a short list of
//! written insights. This module renders the metric brief it receives, parses
//! its response, and supplies the status insight shown when it is unavailable.
//! No transport is bundled; callers plug one in through [`InsightProvider`].

use crate::analysis::AnalysisResult;
use crate::error::{PortfolioError, PortfolioResult};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Categories the collaborator is asked to use
pub const INSIGHT_CATEGORIES: [&str; 7] = [
    "Portfolio Risk",
    "Pricing Adequacy",
    "Credibility & Limitations",
    "Cohort Trends",
    "Product Strategy",
    "Regional Performance",
    "Duration Analysis",
];

/// Segments below this many policies are flagged as low credibility
pub const CREDIBILITY_THRESHOLD: u32 = 200;

/// One written finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub category: String,
    pub finding: String,
    pub recommendation: String,
}

/// Source of written insights for an analysis
pub trait InsightProvider {
    fn insights(&self, analysis: &AnalysisResult) -> PortfolioResult<Vec<Insight>>;
}

/// Replays a collaborator response saved to disk
#[derive(Debug, Clone)]
pub struct SavedResponse {
    path: PathBuf,
}

impl SavedResponse {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InsightProvider for SavedResponse {
    fn insights(&self, _analysis: &AnalysisResult) -> PortfolioResult<Vec<Insight>> {
        let text = std::fs::read_to_string(&self.path)?;
        parse_insights(&text)
    }
}

/// Ask `provider` for insights, substituting the status insight on any failure
pub fn insights_or_fallback(provider: &dyn InsightProvider, analysis: &AnalysisResult) -> Vec<Insight> {
    match provider.insights(analysis) {
        Ok(insights) if !insights.is_empty() => insights,
        Ok(_) => {
            warn!("Narrative collaborator returned no insights");
            fallback_insights()
        }
        Err(e) => {
            warn!("Narrative collaborator failed: {}", e);
            fallback_insights()
        }
    }
}

/// Single status insight used when the collaborator is unavailable
pub fn fallback_insights() -> Vec<Insight> {
    vec![Insight {
        category: "Analysis Status".to_string(),
        finding: "Narrative insights are unavailable for this run.".to_string(),
        recommendation: "Review the product, cohort, region, trend and duration views in the analysis output for portfolio performance metrics."
            .to_string(),
    }]
}

/// Parse the collaborator's JSON array, tolerating markdown code fences
pub fn parse_insights(text: &str) -> PortfolioResult<Vec<Insight>> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return Err(PortfolioError::MalformedInput("empty insight response".to_string()));
    }
    Ok(serde_json::from_str(cleaned)?)
}

fn pct(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}%", v),
        None => "n/a".to_string(),
    }
}

fn signed_pct(value: f64) -> String {
    if value > 0.0 {
        format!("+{}%", value)
    } else {
        format!("{}%", value)
    }
}

/// Whole currency units with thousands separators
fn thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        format!("-{}", out)
    } else {
        out
    }
}

/// Metric brief sent to the collaborator
pub struct PortfolioBrief<'a>(pub &'a AnalysisResult);

impl fmt::Display for PortfolioBrief<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;
        let summary = &analysis.summary;

        writeln!(
            f,
            "Portfolio review: {} policies across {} product lines.",
            summary.total_policies,
            analysis.loss_ratio_by_product.len()
        )?;
        writeln!(f)?;
        writeln!(f, "Data basis:")?;
        writeln!(f, "- Premium is written premium, not earned")?;
        writeln!(f, "- Claims are treated as fully developed; no IBNR adjustment")?;
        writeln!(f, "- No expense loading or reinsurance")?;
        writeln!(f, "- Exposure is approximated by policy count")?;
        writeln!(f, "- Segments under {} policies have limited credibility", CREDIBILITY_THRESHOLD)?;
        writeln!(f)?;

        writeln!(f, "Overall:")?;
        writeln!(f, "- Total policies: {}", summary.total_policies)?;
        writeln!(f, "- Written premium: ${}", thousands(summary.total_premiums))?;
        writeln!(f, "- Claims incurred: ${}", thousands(summary.total_claims))?;
        writeln!(f, "- Portfolio loss ratio: {}", pct(summary.overall_loss_ratio))?;
        writeln!(f)?;

        writeln!(f, "Products (ranked by loss ratio):")?;
        for p in &analysis.loss_ratio_by_product {
            writeln!(
                f,
                "{}. {}: {} LR | {} policies | {} frequency | ${} avg premium | ${} avg severity",
                p.rank,
                p.product,
                pct(p.loss_ratio),
                p.policy_count,
                pct(p.claim_frequency),
                p.avg_premium_per_policy.map(thousands).unwrap_or_else(|| "n/a".to_string()),
                thousands(p.avg_claim_severity),
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Issue-year cohorts:")?;
        for c in &analysis.frequency_by_cohort {
            write!(f, "{}: {} LR ({} policies)", c.cohort, pct(c.loss_ratio), c.policy_count)?;
            if let Some(yoy) = c.yoy_change {
                write!(f, " | YoY: {}", signed_pct(yoy))?;
            }
            if c.policy_count < CREDIBILITY_THRESHOLD {
                write!(f, " | low credibility")?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;

        writeln!(f, "Regions:")?;
        for r in &analysis.loss_ratio_by_region {
            writeln!(
                f,
                "{}: {} LR | {} policies | {} claims",
                r.region,
                pct(r.loss_ratio),
                r.policy_count,
                r.claim_count
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Policy duration:")?;
        for d in &analysis.duration_data {
            writeln!(f, "{}: {} LR ({} policies)", d.duration, pct(d.loss_ratio), d.policy_count)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "Respond with 6-8 insights as a JSON array of objects with \"category\", \"finding\" and \"recommendation\"."
        )?;
        writeln!(f, "Categories: {}", INSIGHT_CATEGORIES.join(", "))?;
        write!(f, "Use measured language and note limited credibility where it applies.")
    }
}

/// Render the metric brief sent to the collaborator
pub fn portfolio_brief(analysis: &AnalysisResult) -> String {
    PortfolioBrief(analysis).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::compute_analysis_as_of;
    use crate::portfolio::sample_template;
    use chrono::NaiveDate;

    fn sample_analysis() -> AnalysisResult {
        let as_of = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        compute_analysis_as_of(&sample_template(), as_of).unwrap()
    }

    struct Failing;

    impl InsightProvider for Failing {
        fn insights(&self, _analysis: &AnalysisResult) -> PortfolioResult<Vec<Insight>> {
            Err(PortfolioError::MalformedInput("timeout".to_string()))
        }
    }

    struct Fixed(Vec<Insight>);

    impl InsightProvider for Fixed {
        fn insights(&self, _analysis: &AnalysisResult) -> PortfolioResult<Vec<Insight>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_parse_fenced_response() {
        let text = "```json\n[{\"category\": \"Cohort Trends\", \"finding\": \"2023 deteriorated\", \"recommendation\": \"Review pricing\"}]\n```";
        let insights = parse_insights(text).unwrap();
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].category, "Cohort Trends");
        assert_eq!(insights[0].recommendation, "Review pricing");
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(matches!(
            parse_insights("Here are some thoughts on the portfolio."),
            Err(PortfolioError::MalformedInput(_))
        ));
        assert!(matches!(parse_insights("```json\n```"), Err(PortfolioError::MalformedInput(_))));
    }

    #[test]
    fn test_fallback_on_failure() {
        let analysis = sample_analysis();
        let insights = insights_or_fallback(&Failing, &analysis);
        assert_eq!(insights, fallback_insights());
        assert_eq!(insights[0].category, "Analysis Status");

        let empty = insights_or_fallback(&Fixed(Vec::new()), &analysis);
        assert_eq!(empty, fallback_insights());
    }

    #[test]
    fn test_provider_insights_pass_through() {
        let insight = Insight {
            category: "Portfolio Risk".to_string(),
            finding: "Loss ratio well above target".to_string(),
            recommendation: "Warrants review".to_string(),
        };
        let insights = insights_or_fallback(&Fixed(vec![insight.clone()]), &sample_analysis());
        assert_eq!(insights, vec![insight]);
    }

    #[test]
    fn test_missing_saved_response_falls_back() {
        let provider = SavedResponse::new("/nonexistent/insights.json");
        assert!(provider.insights(&sample_analysis()).is_err());
        assert_eq!(insights_or_fallback(&provider, &sample_analysis()), fallback_insights());
    }

    #[test]
    fn test_brief_contents() {
        let brief = portfolio_brief(&sample_analysis());
        assert!(brief.contains("1 policies across 1 product lines"));
        assert!(brief.contains("Written premium: $291"));
        assert!(brief.contains("Claims incurred: $25,000"));
        assert!(brief.contains("Portfolio loss ratio: 8591.07%"));
        assert!(brief.contains("1. Term Life: 8591.07% LR | 1 policies | 100% frequency"));
        assert!(brief.contains("2023: 8591.07% LR (1 policies) | low credibility"));
        assert!(brief.contains("North: 8591.07% LR | 1 policies | 1 claims"));
        assert!(brief.contains("Year 3: 8591.07% LR"));
        assert!(brief.contains("Duration Analysis"));
    }

    #[test]
    fn test_fallback_wording() {
        let insight = &fallback_insights()[0];
        assert_eq!(insight.finding, "Narrative insights are unavailable for this run.");
        assert!(!insight.recommendation.contains("Dashboard"));
        assert!(insight.recommendation.contains("analysis output"));
    }

    #[test]
    fn test_brief_display_matches_render() {
        let analysis = sample_analysis();
        assert_eq!(format!("{}", PortfolioBrief(&analysis)), portfolio_brief(&analysis));
        assert!(portfolio_brief(&analysis).ends_with("where it applies."));
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(999.4), "999");
        assert_eq!(thousands(1_234_567.0), "1,234,567");
        assert_eq!(thousands(-25_000.0), "-25,000");
        assert_eq!(pct(None), "n/a");
        assert_eq!(signed_pct(4.5), "+4.5%");
        assert_eq!(signed_pct(-2.0), "-2%");
    }
}
