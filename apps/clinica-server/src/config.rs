//! Layered server configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. YAML file given with `--config`
//! 3. environment variables prefixed `APP__`, nested with `__`
//!    (`APP__DATABASE__URL`, `APP__SERVER__PORT`)
//! 4. CLI overrides

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clinica_auth::AuthConfig;
use clinica_db::DbConfig;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use tenant_provisioning::ProvisioningConfig;

pub const ENV_PREFIX: &str = "APP__";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Requests running longer are answered with 504.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8080,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

/// Browser origins allowed to call the API. `"*"` allows any origin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DbConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
}

impl AppConfig {
    /// Defaults, then the optional YAML file, then `APP__*` variables.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(serde_json::json!({
            "server": ServerConfig::default(),
            "cors": CorsConfig::default(),
            "logging": LoggingConfig::default(),
            "provisioning": ProvisioningConfig::default(),
        })));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file_exact(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// # Errors
    /// Fails when a source cannot be read or the merged result does not
    /// deserialize, for example when `database.url` is missing.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(&Self::figment(path))
    }

    /// # Errors
    /// Fails when the figment does not deserialize into [`AppConfig`].
    pub fn from_figment(figment: &Figment) -> Result<Self> {
        figment.extract().context("invalid configuration")
    }

    /// `--port` replaces `server.port`; each `-v` raises `logging.level`.
    pub fn apply_cli_overrides(&mut self, port: Option<u16>, verbose: u8) {
        if let Some(port) = port {
            self.server.port = port;
        }
        match verbose {
            0 => {}
            1 => "info".clone_into(&mut self.logging.level),
            2 => "debug".clone_into(&mut self.logging.level),
            _ => "trace".clone_into(&mut self.logging.level),
        }
    }

    /// Check the settings a running server depends on.
    ///
    /// # Errors
    /// Weak or shared token secrets and malformed provisioning settings.
    pub fn validate(&self) -> Result<()> {
        self.auth.validate()?;
        self.provisioning.validate()?;
        if self.database.pool.max_conns == 0 {
            anyhow::bail!("database.max_conns must be at least 1");
        }
        Ok(())
    }

    /// Effective configuration as YAML. Secrets and the database password are redacted.
    ///
    /// # Errors
    /// Fails if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self).context("failed to render configuration")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use figment::Jail;
    use tenant_provisioning::ProvisioningConfigError;

    const YAML: &str = r#"
server:
  port: 9090
database:
  url: "postgres://app:hunter2@db:5432/clinica"
  max_conns: 4
  acquire_timeout: "2s"
auth:
  user_secret: "user-secret-user-secret-user-secret!"
  service_secret: "service-secret-service-secret-service"
cors:
  allowed_origins: ["https://portal.clinica.example"]
"#;

    #[test]
    fn yaml_file_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file("clinica.yaml", YAML)?;
            let cfg = AppConfig::load(Some(Path::new("clinica.yaml"))).unwrap();
            assert_eq!(cfg.server.port, 9090);
            assert_eq!(cfg.server.bind_addr, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
            assert_eq!(cfg.server.request_timeout, Duration::from_secs(30));
            assert_eq!(cfg.database.pool.max_conns, 4);
            assert_eq!(cfg.database.pool.acquire_timeout, Duration::from_secs(2));
            assert_eq!(cfg.logging.format, LogFormat::Text);
            assert_eq!(cfg.provisioning.primary_color, "#007bff");
            assert!(cfg.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        Jail::expect_with(|jail| {
            jail.create_file("clinica.yaml", YAML)?;
            jail.set_env("APP__SERVER__PORT", "7000");
            jail.set_env("APP__LOGGING__FORMAT", "json");
            jail.set_env("APP__DATABASE__URL", "postgres://other@db2/clinica");

            let mut cfg = AppConfig::load(Some(Path::new("clinica.yaml"))).unwrap();
            assert_eq!(cfg.server.port, 7000);
            assert_eq!(cfg.logging.format, LogFormat::Json);
            assert_eq!(
                cfg.database.redacted_dsn(),
                "postgresql://<redacted>@db2:5432/clinica"
            );

            cfg.apply_cli_overrides(Some(6000), 2);
            assert_eq!(cfg.server.port, 6000);
            assert_eq!(cfg.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn missing_database_url_is_an_error() {
        Jail::expect_with(|jail| {
            jail.set_env("APP__AUTH__USER_SECRET", "user-secret-user-secret-user-secret!");
            jail.set_env(
                "APP__AUTH__SERVICE_SECRET",
                "service-secret-service-secret-service",
            );
            assert!(AppConfig::load(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn missing_config_file_is_an_error() {
        Jail::expect_with(|_| {
            assert!(AppConfig::load(Some(Path::new("absent.yaml"))).is_err());
            Ok(())
        });
    }

    #[test]
    fn validation_rejects_shared_secrets() {
        Jail::expect_with(|jail| {
            jail.set_env("APP__DATABASE__URL", "postgres://db/clinica");
            jail.set_env("APP__AUTH__USER_SECRET", "same-secret-same-secret-same-secret!");
            jail.set_env("APP__AUTH__SERVICE_SECRET", "same-secret-same-secret-same-secret!");
            let cfg = AppConfig::load(None).unwrap();
            assert!(cfg.validate().is_err());
            Ok(())
        });
    }

    #[test]
    fn validation_rejects_malformed_primary_color() {
        Jail::expect_with(|jail| {
            jail.create_file("clinica.yaml", YAML)?;
            jail.set_env("APP__PROVISIONING__PRIMARY_COLOR", "blue");
            let cfg = AppConfig::load(Some(Path::new("clinica.yaml"))).unwrap();
            let err = cfg.validate().unwrap_err();
            assert_eq!(
                err.downcast_ref::<ProvisioningConfigError>(),
                Some(&ProvisioningConfigError::InvalidColor("blue".to_owned()))
            );
            Ok(())
        });
    }

    #[test]
    fn yaml_dump_redacts_secrets() {
        Jail::expect_with(|jail| {
            jail.create_file("clinica.yaml", YAML)?;
            let cfg = AppConfig::load(Some(Path::new("clinica.yaml"))).unwrap();
            let yaml = cfg.to_yaml().unwrap();
            assert!(yaml.contains("port: 9090"));
            assert!(yaml.contains("<redacted>"));
            assert!(!yaml.contains("hunter2"));
            assert!(!yaml.contains("user-secret-user-secret"));
            Ok(())
        });
    }
}
