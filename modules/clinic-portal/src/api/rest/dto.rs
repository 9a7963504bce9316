use serde::{Deserialize, Serialize};

use crate::domain::model::{LoginOutcome, Professional};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub nickname: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub role: String,
    pub tenant_id: String,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(o: LoginOutcome) -> Self {
        Self {
            token: o.token,
            role: o.role,
            tenant_id: o.tenant_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfessionalDto {
    pub id: i64,
    pub nombre: String,
    pub especialidad: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departamento: Option<String>,
}

impl From<Professional> for ProfessionalDto {
    fn from(p: Professional) -> Self {
        Self {
            id: p.id,
            nombre: p.nombre,
            especialidad: p.especialidad,
            email: p.email,
            departamento: p.departamento,
        }
    }
}
