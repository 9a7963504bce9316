use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProvisioningConfigError {
    #[error("provisioning.primary_color must look like #rrggbb, got '{0}'")]
    InvalidColor(String),
}

/// Provisioning settings, read from the `provisioning` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvisioningConfig {
    /// Primary portal color seeded into a new clinic's configuration row.
    pub primary_color: String,
    /// Seed the well-known administrator account during bootstrap.
    pub seed_bootstrap_admin: bool,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            primary_color: "#007bff".to_owned(),
            seed_bootstrap_admin: true,
        }
    }
}

impl ProvisioningConfig {
    /// # Errors
    /// [`ProvisioningConfigError::InvalidColor`] when `primary_color` is not `#rrggbb`.
    pub fn validate(&self) -> Result<(), ProvisioningConfigError> {
        let hex = self.primary_color.strip_prefix('#').unwrap_or_default();
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ProvisioningConfigError::InvalidColor(
                self.primary_color.clone(),
            ));
        }
        Ok(())
    }
}
