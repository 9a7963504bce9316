use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::model::{ProvisionReceipt, TenantRecord};

/// Clinic id as sent by the central platform: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ClinicId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ClinicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Body of `/config/init` and `/config/update`.
///
/// Contact and URL fields the platform also sends are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ClinicRequest {
    pub id: Option<ClinicId>,
    pub nombre: Option<String>,
    pub rut: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitResponse {
    pub message: &'static str,
    pub tenant_id: String,
    pub schema_name: String,
    pub clinic_name: String,
    pub activation_ref: Uuid,
}

impl From<ProvisionReceipt> for InitResponse {
    fn from(r: ProvisionReceipt) -> Self {
        Self {
            message: "Tenant initialized successfully",
            tenant_id: r.tenant_id.into(),
            schema_name: r.schema_name.to_string(),
            clinic_name: r.clinic_name,
            activation_ref: r.activation_ref,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub message: &'static str,
    pub tenant_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantDto {
    pub id: String,
    pub nombre: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rut: Option<String>,
    pub schema_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<TenantRecord> for TenantDto {
    fn from(r: TenantRecord) -> Self {
        Self {
            id: r.id,
            nombre: r.nombre,
            rut: r.rut,
            schema_name: r.schema_name,
            created_at: r.created_at,
        }
    }
}
