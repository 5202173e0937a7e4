//! Portfolio records, JSON loading and synthetic generation

mod data;
pub mod generator;
pub mod loader;

pub use data::{
    BenefitKind, Claim, ClaimId, ClaimStatus, Dataset, Gender, IncomeBand, Policy, PolicyId,
    PolicyStatus, Policyholder, PolicyholderId, Premium, PremiumId, ProductType,
};
pub use generator::{generate, generate_seeded, GeneratorConfig, PortfolioGenerator, ProductSpec};
pub use loader::{load_dataset, load_dataset_from_reader, load_dataset_from_str, sample_template};
