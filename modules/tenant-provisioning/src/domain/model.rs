use chrono::{DateTime, Utc};
use clinica_security::{SchemaName, TenantId};
use uuid::Uuid;

use crate::domain::error::DomainError;

/// Column width of `nodoperiferico.nombre` and `portal_configuracion.nombre_portal`.
pub const MAX_CLINIC_NAME_LEN: usize = 100;
pub const MAX_RUT_LEN: usize = 32;

/// A validated onboarding request for one clinic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicRegistration {
    pub tenant_id: TenantId,
    pub nombre: String,
    pub rut: String,
}

impl ClinicRegistration {
    /// # Errors
    /// [`DomainError::Tenant`] for an unusable tenant id,
    /// [`DomainError::Validation`] for a blank or oversized name or RUT.
    pub fn parse(tenant_id: &str, nombre: &str, rut: &str) -> Result<Self, DomainError> {
        let tenant_id = TenantId::parse(tenant_id)?;
        let nombre = required("nombre", nombre, MAX_CLINIC_NAME_LEN)?;
        let rut = required("rut", rut, MAX_RUT_LEN)?;
        Ok(Self {
            tenant_id,
            nombre,
            rut,
        })
    }

    #[must_use]
    pub fn schema(&self) -> SchemaName {
        self.tenant_id.schema()
    }
}

fn required(field: &'static str, value: &str, max: usize) -> Result<String, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::Validation {
            field,
            message: "is required".to_owned(),
        });
    }
    if value.chars().count() > max {
        return Err(DomainError::Validation {
            field,
            message: format!("must be at most {max} characters"),
        });
    }
    Ok(value.to_owned())
}

/// Outcome of a completed onboarding call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReceipt {
    pub tenant_id: TenantId,
    pub schema_name: SchemaName,
    pub clinic_name: String,
    /// Stable per tenant: repeated onboarding returns the same reference.
    pub activation_ref: Uuid,
}

/// One row of the shared registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantRecord {
    pub id: String,
    pub nombre: String,
    pub rut: Option<String>,
    pub schema_name: String,
    pub created_at: DateTime<Utc>,
}

/// Values for the single configuration row of a new clinic portal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSeed {
    pub nombre_portal: String,
    pub color_primario: String,
}
