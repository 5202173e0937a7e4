//! Load portfolio snapshots from the warehouse JSON upload format
//!
//! The document is one JSON object with `policyholders`, `policies`,
//! `premiums` and `claims` arrays. Unknown fields are ignored; a missing or
//! mistyped required field fails the whole load.

use super::data::{
    Claim, ClaimStatus, Dataset, Gender, IncomeBand, Policy, PolicyStatus, Policyholder, Premium,
    ProductType,
};
use crate::error::{PortfolioError, PortfolioResult};
use chrono::NaiveDate;
use log::info;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Load and validate a dataset from a JSON file
pub fn load_dataset<P: AsRef<Path>>(path: P) -> PortfolioResult<Dataset> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let dataset = load_dataset_from_reader(BufReader::new(file))?;
    info!(
        "Loaded {} policyholders, {} policies, {} premiums, {} claims from {}",
        dataset.policyholders.len(),
        dataset.policies.len(),
        dataset.premiums.len(),
        dataset.claims.len(),
        path.display()
    );
    Ok(dataset)
}

/// Load and validate a dataset from any reader (file, network stream, buffer)
pub fn load_dataset_from_reader<R: Read>(reader: R) -> PortfolioResult<Dataset> {
    let dataset: Dataset = serde_json::from_reader(reader)?;
    dataset.validate()?;
    Ok(dataset)
}

/// Load and validate a dataset from an in-memory JSON document
pub fn load_dataset_from_str(json: &str) -> PortfolioResult<Dataset> {
    let dataset: Dataset = serde_json::from_str(json)?;
    dataset.validate()?;
    Ok(dataset)
}

/// One-record-per-collection template describing the upload format
pub fn sample_template() -> Dataset {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();

    Dataset {
        policyholders: vec![Policyholder {
            policyholder_id: 1,
            age: 35,
            gender: Gender::Male,
            region: "North".to_string(),
            income_band: IncomeBand::Medium,
        }],
        policies: vec![Policy {
            policy_id: 1,
            policyholder_id: 1,
            product_type: ProductType::TermLife,
            issue_date: date(2023, 1, 15),
            sum_insured: 100_000.0,
            policy_status: PolicyStatus::Active,
            lapse_date: None,
        }],
        premiums: vec![Premium {
            premium_id: 1,
            policy_id: 1,
            premium_amount: 291.0,
            payment_date: date(2023, 1, 15),
        }],
        claims: vec![Claim {
            claim_id: 1,
            policy_id: 1,
            claim_date: date(2023, 6, 20),
            claim_amount: 25_000.0,
            claim_type: ProductType::CriticalIllness,
            claim_status: ClaimStatus::Paid,
        }],
    }
}

/// Write the template as pretty-printed JSON
pub fn write_template<P: AsRef<Path>>(path: P) -> PortfolioResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, &sample_template())
        .map_err(|e| PortfolioError::Io(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "policyholders": [
            { "policyholder_id": 1, "age": 35, "gender": "M", "region": "North", "income_band": "Medium" }
        ],
        "policies": [
            { "policy_id": 1, "policyholder_id": 1, "product_type": "Term Life", "issue_date": "2023-01-15",
              "sum_insured": 100000, "policy_status": "Active", "lapse_date": null }
        ],
        "premiums": [
            { "premium_id": 1, "policy_id": 1, "premium_amount": 291, "payment_date": "2023-01-15" }
        ],
        "claims": [
            { "claim_id": 1, "policy_id": 1, "claim_date": "2023-06-20", "claim_amount": 25000,
              "claim_type": "Critical Illness", "claim_status": "Paid" }
        ]
    }"#;

    #[test]
    fn test_load_sample_format() {
        let dataset = load_dataset_from_str(SAMPLE).expect("sample should load");
        assert_eq!(dataset, sample_template());
        assert_eq!(dataset.policies[0].sum_insured, 100_000.0);
        assert_eq!(dataset.claims[0].claim_type, ProductType::CriticalIllness);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let json = SAMPLE.replace(r#""age": 35,"#, r#""age": 35, "smoker": true,"#);
        assert!(load_dataset_from_str(&json).is_ok());
    }

    #[test]
    fn test_missing_lapse_date_defaults_to_none() {
        let json = SAMPLE.replace(r#", "lapse_date": null"#, "");
        let dataset = load_dataset_from_str(&json).unwrap();
        assert_eq!(dataset.policies[0].lapse_date, None);
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            load_dataset_from_str("{ not json"),
            Err(PortfolioError::MalformedInput(_))
        ));

        // Missing required collection
        assert!(matches!(
            load_dataset_from_str(r#"{ "policyholders": [], "policies": [], "premiums": [] }"#),
            Err(PortfolioError::MalformedInput(_))
        ));

        // Missing required field on a record
        let json = SAMPLE.replace(r#""sum_insured": 100000,"#, "");
        assert!(matches!(load_dataset_from_str(&json), Err(PortfolioError::MalformedInput(_))));

        // Product outside the catalog
        let json = SAMPLE.replace(r#""product_type": "Term Life""#, r#""product_type": "Annuity""#);
        assert!(matches!(load_dataset_from_str(&json), Err(PortfolioError::MalformedInput(_))));
    }

    #[test]
    fn test_loaded_orphans_are_rejected() {
        let json = SAMPLE.replace(
            r#""premium_id": 1, "policy_id": 1"#,
            r#""premium_id": 1, "policy_id": 2"#,
        );
        assert!(matches!(
            load_dataset_from_str(&json),
            Err(PortfolioError::ReferentialIntegrity { entity: "premium", .. })
        ));
    }

    #[test]
    fn test_template_round_trip() {
        let json = serde_json::to_string_pretty(&sample_template()).unwrap();
        assert_eq!(load_dataset_from_str(&json).unwrap(), sample_template());
    }
}
