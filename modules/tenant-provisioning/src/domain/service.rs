use std::sync::Arc;

use clinica_security::{SchemaName, TenantId};
use uuid::Uuid;

use crate::config::ProvisioningConfig;
use crate::domain::error::{DomainError, ProvisioningError, ProvisioningStep};
use crate::domain::model::{ClinicRegistration, PortalSeed, ProvisionReceipt, TenantRecord};
use crate::domain::repo::ProvisioningRepo;

/// Clinic of the seed administrator created by [`ProvisioningService::bootstrap`].
pub const SEED_TENANT_ID: &str = "101";
const SEED_CLINIC_NAME: &str = "Clinica Inicial";
const SEED_CLINIC_RUT: &str = "0-0";

/// Onboarding workflow for clinics.
pub struct ProvisioningService<R: ProvisioningRepo> {
    repo: Arc<R>,
    config: ProvisioningConfig,
}

impl<R: ProvisioningRepo> ProvisioningService<R> {
    #[must_use]
    pub fn new(repo: Arc<R>, config: ProvisioningConfig) -> Self {
        Self { repo, config }
    }

    /// `CREATE SCHEMA IF NOT EXISTS` for the tenant.
    ///
    /// # Errors
    /// [`ProvisioningError`] tagged [`ProvisioningStep::CreateSchema`].
    pub async fn create_schema(&self, tenant: &TenantId) -> Result<SchemaName, ProvisioningError> {
        let schema = tenant.schema();
        self.repo
            .create_schema(&schema)
            .await
            .map_err(|e| failed(ProvisioningStep::CreateSchema, tenant, e))?;
        tracing::debug!(tenant_id = %tenant, schema = %schema, "schema ready");
        Ok(schema)
    }

    /// # Errors
    /// [`ProvisioningError`] tagged [`ProvisioningStep::CreateBaselineTables`].
    pub async fn create_baseline_tables(
        &self,
        tenant: &TenantId,
        portal_name: &str,
    ) -> Result<(), ProvisioningError> {
        let seed = PortalSeed {
            nombre_portal: portal_name.to_owned(),
            color_primario: self.config.primary_color.clone(),
        };
        self.repo
            .create_baseline_tables(&tenant.schema(), &seed)
            .await
            .map_err(|e| failed(ProvisioningStep::CreateBaselineTables, tenant, e))?;
        tracing::debug!(tenant_id = %tenant, "baseline tables ready");
        Ok(())
    }

    /// Insert the registry row or refresh its descriptive fields.
    ///
    /// # Errors
    /// [`ProvisioningError`] tagged [`ProvisioningStep::RegisterTenant`].
    pub async fn register_tenant(
        &self,
        registration: &ClinicRegistration,
    ) -> Result<Uuid, ProvisioningError> {
        let activation_ref = self
            .repo
            .upsert_registry(registration, Uuid::new_v4())
            .await
            .map_err(|e| failed(ProvisioningStep::RegisterTenant, &registration.tenant_id, e))?;
        tracing::debug!(tenant_id = %registration.tenant_id, "tenant registered");
        Ok(activation_ref)
    }

    /// Shared tables, then, when `seed_bootstrap_admin` is on, the seed
    /// administrator and its clinic [`SEED_TENANT_ID`]. Safe on every start.
    ///
    /// The seed clinic gets its schema and registry row here so the seed
    /// administrator can use the portal before any `/config/init` call.
    ///
    /// # Errors
    /// [`ProvisioningError`] tagged [`ProvisioningStep::Bootstrap`], or the
    /// failing step of the seed clinic's provisioning.
    pub async fn bootstrap(&self) -> Result<(), ProvisioningError> {
        let seed = self.config.seed_bootstrap_admin;
        self.repo
            .bootstrap_shared(seed)
            .await
            .map_err(|e| ProvisioningError::new(ProvisioningStep::Bootstrap, None, e))?;
        tracing::info!(seed_admin = seed, "shared registry ready");

        if seed {
            let registration =
                ClinicRegistration::parse(SEED_TENANT_ID, SEED_CLINIC_NAME, SEED_CLINIC_RUT)
                    .map_err(|e| {
                        ProvisioningError::new(
                            ProvisioningStep::Bootstrap,
                            Some(SEED_TENANT_ID),
                            e.into(),
                        )
                    })?;
            let tenant = &registration.tenant_id;
            self.create_schema(tenant).await?;
            self.create_baseline_tables(tenant, &registration.nombre)
                .await?;
            self.register_tenant(&registration).await?;
            tracing::info!(tenant_id = %tenant, "seed clinic ready");
        }
        Ok(())
    }

    /// Full onboarding: schema, then baseline tables, then registry.
    ///
    /// Stops at the first failing step. Steps already completed stay in
    /// place and are no-ops when the call is retried.
    ///
    /// # Errors
    /// [`DomainError::Provisioning`] naming the failed step.
    pub async fn provision(
        &self,
        registration: ClinicRegistration,
    ) -> Result<ProvisionReceipt, DomainError> {
        let tenant = &registration.tenant_id;
        tracing::info!(tenant_id = %tenant, clinic = %registration.nombre, "provisioning tenant");

        let schema_name = self.create_schema(tenant).await?;
        self.create_baseline_tables(tenant, &registration.nombre)
            .await?;
        let activation_ref = self.register_tenant(&registration).await?;

        tracing::info!(tenant_id = %tenant, schema = %schema_name, "tenant provisioned");
        Ok(ProvisionReceipt {
            tenant_id: registration.tenant_id,
            schema_name,
            clinic_name: registration.nombre,
            activation_ref,
        })
    }

    /// # Errors
    /// [`ProvisioningError`] tagged [`ProvisioningStep::ListTenants`].
    pub async fn list_tenants(&self) -> Result<Vec<TenantRecord>, ProvisioningError> {
        self.repo
            .list_registry()
            .await
            .map_err(|e| ProvisioningError::new(ProvisioningStep::ListTenants, None, e))
    }
}

fn failed(step: ProvisioningStep, tenant: &TenantId, source: anyhow::Error) -> ProvisioningError {
    tracing::error!(step = %step, tenant_id = %tenant, error = %source, "provisioning step failed");
    ProvisioningError::new(step, Some(tenant.as_str()), source)
}
