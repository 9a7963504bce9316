use async_trait::async_trait;
use clinica_security::SchemaName;
use uuid::Uuid;

use crate::domain::model::{ClinicRegistration, PortalSeed, TenantRecord};

/// Storage operations behind [`ProvisioningService`](super::service::ProvisioningService).
///
/// Every method must be idempotent.
#[async_trait]
pub trait ProvisioningRepo: Send + Sync {
    async fn create_schema(&self, schema: &SchemaName) -> anyhow::Result<()>;

    /// Create the clinic tables in `schema` and seed the configuration row
    /// if none exists yet.
    async fn create_baseline_tables(
        &self,
        schema: &SchemaName,
        seed: &PortalSeed,
    ) -> anyhow::Result<()>;

    /// Insert or update the registry row. Returns the tenant's activation
    /// reference, which is `fresh_ref` only when the row is new.
    async fn upsert_registry(
        &self,
        registration: &ClinicRegistration,
        fresh_ref: Uuid,
    ) -> anyhow::Result<Uuid>;

    /// Create the shared tables in `public`, optionally seeding the
    /// well-known administrator.
    async fn bootstrap_shared(&self, seed_admin: bool) -> anyhow::Result<()>;

    async fn list_registry(&self) -> anyhow::Result<Vec<TenantRecord>>;
}
