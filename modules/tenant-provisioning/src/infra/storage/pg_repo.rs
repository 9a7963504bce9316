use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinica_db::{ConnectionRouter, PgLease, PgSource};
use clinica_security::{Identity, SchemaName};
use sqlx::Connection;
use uuid::Uuid;

use crate::domain::model::{ClinicRegistration, PortalSeed, TenantRecord};
use crate::domain::repo::ProvisioningRepo;
use crate::infra::storage::ddl;

#[derive(sqlx::FromRow)]
struct RegistryRow {
    id: String,
    nombre: String,
    rut: Option<String>,
    schema_name: String,
    created_at: DateTime<Utc>,
}

impl From<RegistryRow> for TenantRecord {
    fn from(r: RegistryRow) -> Self {
        Self {
            id: r.id,
            nombre: r.nombre,
            rut: r.rut,
            schema_name: r.schema_name,
            created_at: r.created_at,
        }
    }
}

/// Postgres-backed provisioning storage.
///
/// Provisioning runs before any tenant identity exists, so every statement
/// goes through a `public`-routed lease and names its schema explicitly.
#[derive(Clone)]
pub struct PgProvisioningRepo {
    router: ConnectionRouter<PgSource>,
}

impl PgProvisioningRepo {
    #[must_use]
    pub fn new(router: ConnectionRouter<PgSource>) -> Self {
        Self { router }
    }

    async fn lease(&self) -> anyhow::Result<PgLease> {
        Ok(self.router.acquire_for(&Identity::Anonymous).await?)
    }
}

#[async_trait]
impl ProvisioningRepo for PgProvisioningRepo {
    async fn create_schema(&self, schema: &SchemaName) -> anyhow::Result<()> {
        let mut lease = self.lease().await?;
        let mut tx = lease.executor().begin().await?;
        sqlx::query(ddl::SCHEMA_LOCK)
            .bind(schema.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::Executor::execute(
            &mut *tx,
            sqlx::raw_sql(&format!("CREATE SCHEMA IF NOT EXISTS {}", schema.quoted())),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn create_baseline_tables(
        &self,
        schema: &SchemaName,
        seed: &PortalSeed,
    ) -> anyhow::Result<()> {
        let statements = ddl::baseline_tables(schema)?;
        let seed_sql = ddl::seed_portal_config(schema)?;

        let mut lease = self.lease().await?;
        let mut tx = lease.executor().begin().await?;
        sqlx::query(ddl::SCHEMA_LOCK)
            .bind(schema.as_str())
            .execute(&mut *tx)
            .await?;
        for stmt in &statements {
            sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(stmt)).await?;
        }
        let inserted = sqlx::query(&seed_sql)
            .bind(&seed.color_primario)
            .bind(&seed.nombre_portal)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        tracing::debug!(schema = %schema, seeded = inserted > 0, "baseline tables applied");
        Ok(())
    }

    async fn upsert_registry(
        &self,
        registration: &ClinicRegistration,
        fresh_ref: Uuid,
    ) -> anyhow::Result<Uuid> {
        let mut lease = self.lease().await?;
        let activation_ref: Uuid = sqlx::query_scalar(ddl::UPSERT_REGISTRY)
            .bind(registration.tenant_id.as_str())
            .bind(&registration.nombre)
            .bind(&registration.rut)
            .bind(registration.schema().as_str())
            .bind(fresh_ref)
            .fetch_one(lease.executor())
            .await?;
        Ok(activation_ref)
    }

    async fn bootstrap_shared(&self, seed_admin: bool) -> anyhow::Result<()> {
        let mut lease = self.lease().await?;
        let mut tx = lease.executor().begin().await?;
        sqlx::query(ddl::SCHEMA_LOCK)
            .bind(SchemaName::public().as_str())
            .execute(&mut *tx)
            .await?;
        for stmt in ddl::SHARED_TABLES {
            sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(stmt)).await?;
        }
        if seed_admin {
            for stmt in ddl::SEED_ADMIN {
                sqlx::Executor::execute(&mut *tx, sqlx::raw_sql(stmt)).await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_registry(&self) -> anyhow::Result<Vec<TenantRecord>> {
        let mut lease = self.lease().await?;
        let rows: Vec<RegistryRow> = sqlx::query_as(ddl::LIST_REGISTRY)
            .fetch_all(lease.executor())
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
