use async_trait::async_trait;
use clinica_db::{ConnectionRouter, PgSource};
use clinica_security::Identity;

use crate::domain::model::{PortalAccount, Professional};
use crate::domain::repo::{AccountRepo, StaffRepo};

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    nickname: String,
    password_hash: Option<String>,
    dtype: String,
    tenant_id: Option<String>,
    role: Option<String>,
}

impl From<AccountRow> for PortalAccount {
    fn from(r: AccountRow) -> Self {
        Self {
            id: r.id,
            nickname: r.nickname,
            password_hash: r.password_hash,
            dtype: r.dtype,
            tenant_id: r.tenant_id,
            role: r.role,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfessionalRow {
    id: i64,
    nombre: String,
    especialidad: String,
    email: Option<String>,
    departamento: Option<String>,
}

impl From<ProfessionalRow> for Professional {
    fn from(r: ProfessionalRow) -> Self {
        Self {
            id: r.id,
            nombre: r.nombre,
            especialidad: r.especialidad,
            email: r.email,
            departamento: r.departamento,
        }
    }
}

/// Login lookups against `public.usuarioperiferico`.
///
/// Login happens before a tenant is known, so the lease is always routed to
/// the shared schema regardless of the ambient context.
#[derive(Clone)]
pub struct PgAccountRepo {
    router: ConnectionRouter<PgSource>,
}

impl PgAccountRepo {
    #[must_use]
    pub fn new(router: ConnectionRouter<PgSource>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl AccountRepo for PgAccountRepo {
    async fn find_by_nickname(&self, nickname: &str) -> anyhow::Result<Option<PortalAccount>> {
        let mut lease = self.router.acquire_for(&Identity::Anonymous).await?;
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT id, nickname, password_hash, dtype, tenant_id, role \
             FROM public.usuarioperiferico WHERE nickname = $1",
        )
        .bind(nickname)
        .fetch_optional(lease.executor())
        .await?;
        Ok(row.map(Into::into))
    }
}

/// Professionals of the clinic bound to the current request.
///
/// The query is unqualified; the routed `search_path` picks the clinic.
#[derive(Clone)]
pub struct PgStaffRepo {
    router: ConnectionRouter<PgSource>,
}

impl PgStaffRepo {
    #[must_use]
    pub fn new(router: ConnectionRouter<PgSource>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl StaffRepo for PgStaffRepo {
    async fn list_professionals(&self) -> anyhow::Result<Vec<Professional>> {
        let mut lease = self.router.acquire().await?;
        let rows: Vec<ProfessionalRow> = sqlx::query_as(
            "SELECT id, nombre, especialidad, email, departamento \
             FROM profesional_salud ORDER BY id",
        )
        .fetch_all(lease.executor())
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
