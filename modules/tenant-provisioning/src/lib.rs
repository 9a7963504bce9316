//! Clinic onboarding.
//!
//! The central platform calls `/config/init` for every new clinic. This
//! module creates the clinic's schema and baseline tables, records the clinic
//! in the shared registry and, on process start, makes sure the registry
//! itself exists.

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

pub use api::rest::routes::{ConcreteService, register_routes};
pub use config::{ProvisioningConfig, ProvisioningConfigError};
pub use domain::error::{DomainError, ProvisioningError, ProvisioningStep};
pub use domain::model::{ClinicRegistration, ProvisionReceipt, TenantRecord};
pub use domain::repo::ProvisioningRepo;
pub use domain::service::{ProvisioningService, SEED_TENANT_ID};
pub use infra::storage::pg_repo::PgProvisioningRepo;
