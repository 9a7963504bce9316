//! Clinic portal endpoints: login against the shared user table and the
//! per-clinic professionals listing.

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;

pub use api::rest::routes::{PortalServices, register_routes};
pub use domain::error::DomainError;
pub use domain::password::{BcryptVerifier, PasswordVerifier};
pub use domain::repo::{AccountRepo, StaffRepo};
pub use domain::service::{LoginService, StaffDirectory};
pub use infra::storage::pg_repo::{PgAccountRepo, PgStaffRepo};
