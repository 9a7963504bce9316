// Core modules
pub mod claims;
pub mod codec;
pub mod config;
pub mod errors;
pub mod policy;

#[cfg(feature = "axum-ext")]
pub mod axum_ext;

pub use claims::{TokenClaims, TokenKind, VerifiedToken};
pub use codec::TokenCodec;
pub use config::{AuthConfig, ConfigError};
pub use errors::{AuthError, TokenRejection};
pub use policy::{Access, ClinicRoutePolicy, RoutePolicy};

#[cfg(feature = "axum-ext")]
pub use axum_ext::{CurrentIdentity, IdentityFilterState, identity_from_token, tenant_identity_filter};
