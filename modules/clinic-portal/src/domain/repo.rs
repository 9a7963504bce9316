use async_trait::async_trait;

use crate::domain::model::{PortalAccount, Professional};

#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn find_by_nickname(&self, nickname: &str) -> anyhow::Result<Option<PortalAccount>>;
}

/// Directory of the clinic bound to the current request.
#[async_trait]
pub trait StaffRepo: Send + Sync {
    async fn list_professionals(&self) -> anyhow::Result<Vec<Professional>>;
}
