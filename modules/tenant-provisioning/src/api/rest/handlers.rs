use std::sync::Arc;

use axum::{Json, extract::Extension, extract::rejection::JsonRejection};
use clinica_auth::{AuthError, CurrentIdentity};
use clinica_errors::Problem;
use clinica_security::TenantId;

use crate::domain::error::DomainError;
use crate::domain::model::ClinicRegistration;
use crate::domain::repo::ProvisioningRepo;
use crate::domain::service::ProvisioningService;

use super::dto::{ClinicId, ClinicRequest, HealthResponse, InitResponse, TenantDto, UpdateResponse};
use super::error::json_rejection_to_problem;

fn require_id(id: Option<&ClinicId>) -> Result<String, DomainError> {
    id.map(ToString::to_string)
        .ok_or_else(|| DomainError::Validation {
            field: "id",
            message: "is required".to_owned(),
        })
}

/// `POST /config/init`: onboard a clinic.
pub async fn init_tenant<R: ProvisioningRepo + 'static>(
    Extension(svc): Extension<Arc<ProvisioningService<R>>>,
    payload: Result<Json<ClinicRequest>, JsonRejection>,
) -> Result<Json<InitResponse>, Problem> {
    let Json(req) = payload.map_err(|e| json_rejection_to_problem(&e))?;
    let id = require_id(req.id.as_ref())?;
    tracing::info!(tenant_id = %id, "init request received");

    let registration = ClinicRegistration::parse(
        &id,
        req.nombre.as_deref().unwrap_or_default(),
        req.rut.as_deref().unwrap_or_default(),
    )?;
    let receipt = svc.provision(registration).await?;
    Ok(Json(receipt.into()))
}

/// `POST /config/update`: refresh the registry's descriptive fields.
///
/// Without both `nombre` and `rut` the registry is left untouched.
pub async fn update_tenant<R: ProvisioningRepo + 'static>(
    Extension(svc): Extension<Arc<ProvisioningService<R>>>,
    payload: Result<Json<ClinicRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, Problem> {
    let Json(req) = payload.map_err(|e| json_rejection_to_problem(&e))?;
    let id = require_id(req.id.as_ref())?;

    if let (Some(nombre), Some(rut)) = (req.nombre.as_deref(), req.rut.as_deref()) {
        let registration = ClinicRegistration::parse(&id, nombre, rut)?;
        svc.register_tenant(&registration)
            .await
            .map_err(DomainError::from)?;
    } else {
        TenantId::parse(&id).map_err(DomainError::from)?;
        tracing::info!(tenant_id = %id, "update without nombre and rut, registry unchanged");
    }

    Ok(Json(UpdateResponse {
        message: "Tenant configuration updated",
        tenant_id: id,
    }))
}

/// `GET /config/health`
pub async fn config_health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// `GET /tenants`: registry listing for trusted services.
pub async fn list_tenants<R: ProvisioningRepo + 'static>(
    CurrentIdentity(identity): CurrentIdentity,
    Extension(svc): Extension<Arc<ProvisioningService<R>>>,
) -> Result<Json<Vec<TenantDto>>, Problem> {
    let caller = identity.require_service().map_err(AuthError::from)?;
    tracing::debug!(service = %caller.service, "listing tenants");

    let tenants = svc.list_tenants().await.map_err(DomainError::from)?;
    Ok(Json(tenants.into_iter().map(Into::into).collect()))
}
