//! Error types shared by the loader, generator and analysis pipeline

use thiserror::Error;

/// Errors raised while loading, generating or analysing a portfolio
#[derive(Error, Debug)]
pub enum PortfolioError {
    /// Input could not be parsed or does not match the record schema
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A record points at a parent that is not in the dataset
    #[error("{entity} {id} references missing {parent} {parent_id}")]
    ReferentialIntegrity {
        entity: &'static str,
        id: u32,
        parent: &'static str,
        parent_id: u32,
    },

    /// A record violates a value constraint (negative amount, claim before issue, ...)
    #[error("invalid {entity} {id}: {reason}")]
    InvalidRecord {
        entity: &'static str,
        id: u32,
        reason: String,
    },

    /// Ratio with a zero denominator. Resolved to `null` by the metric layer.
    #[error("division undefined: {0} is zero")]
    DivisionUndefined(&'static str),

    /// Generator configuration rejected before any record is drawn
    #[error("invalid generator configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<serde_json::Error> for PortfolioError {
    fn from(err: serde_json::Error) -> Self {
        PortfolioError::MalformedInput(err.to_string())
    }
}

pub type PortfolioResult<T> = Result<T, PortfolioError>;
