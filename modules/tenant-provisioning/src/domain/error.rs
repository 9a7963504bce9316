use std::fmt;

use clinica_security::TenantResolutionError;
use thiserror::Error;

/// The provisioning step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    CreateSchema,
    CreateBaselineTables,
    RegisterTenant,
    Bootstrap,
    ListTenants,
}

impl ProvisioningStep {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateSchema => "create_schema",
            Self::CreateBaselineTables => "create_baseline_tables",
            Self::RegisterTenant => "register_tenant",
            Self::Bootstrap => "bootstrap",
            Self::ListTenants => "list_tenants",
        }
    }
}

impl fmt::Display for ProvisioningStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provisioning step failed. Every step is idempotent, so the whole call
/// can be retried.
#[derive(Debug, Error)]
#[error("provisioning step {step} failed for tenant {}", .tenant.as_deref().unwrap_or("-"))]
pub struct ProvisioningError {
    pub step: ProvisioningStep,
    pub tenant: Option<String>,
    #[source]
    pub source: anyhow::Error,
}

impl ProvisioningError {
    #[must_use]
    pub fn new(step: ProvisioningStep, tenant: Option<&str>, source: anyhow::Error) -> Self {
        Self {
            step,
            tenant: tenant.map(str::to_owned),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation error on '{field}': {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("invalid tenant id: {0}")]
    Tenant(#[from] TenantResolutionError),

    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),
}
