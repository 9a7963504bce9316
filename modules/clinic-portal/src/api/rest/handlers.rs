use std::sync::Arc;

use axum::{Json, extract::Extension, extract::rejection::JsonRejection};
use clinica_auth::{AuthError, CurrentIdentity};
use clinica_errors::Problem;

use crate::domain::repo::{AccountRepo, StaffRepo};
use crate::domain::service::{LoginService, StaffDirectory};

use super::dto::{LoginRequest, LoginResponse, ProfessionalDto};
use super::error::json_rejection_to_problem;

pub async fn login<A: AccountRepo + 'static>(
    Extension(svc): Extension<Arc<LoginService<A>>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, Problem> {
    let Json(req) = payload.map_err(|e| json_rejection_to_problem(&e))?;
    let outcome = svc.login(&req.nickname, &req.password).await?;
    Ok(Json(outcome.into()))
}

/// Professionals of the caller's clinic. Only clinic users have one.
pub async fn list_professionals<S: StaffRepo + 'static>(
    CurrentIdentity(identity): CurrentIdentity,
    Extension(svc): Extension<Arc<StaffDirectory<S>>>,
) -> Result<Json<Vec<ProfessionalDto>>, Problem> {
    identity.require_user().map_err(AuthError::from)?;
    let staff = svc.list().await?;
    Ok(Json(staff.into_iter().map(Into::into).collect()))
}
