#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
pub mod context;
pub mod identity;
pub mod schema;

pub use context::{Binding, ContextError, TenantContext};
pub use identity::{AuthorizationError, Identity, Role, ServiceIdentity, UserIdentity};
pub use schema::{
    DEFAULT_SCHEMA, IdentifierError, SchemaName, TENANT_SCHEMA_PREFIX, TenantId,
    TenantResolutionError, quote_ident, resolve_schema,
};
