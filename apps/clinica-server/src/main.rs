use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clinica_auth::{TokenClaims, TokenCodec};
use clinica_server::{AppConfig, logging};
use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Clinic backend: tenant-isolated clinical records API
#[derive(Parser)]
#[command(name = "clinica-server")]
#[command(about = "Clinic backend: tenant-isolated clinical records API")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML, secrets redacted) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
    /// Issue a service token for a trusted internal caller
    ServiceToken {
        /// Token subject
        #[arg(long)]
        service_id: String,
        /// Value of the `service` claim, defaults to the id
        #[arg(long)]
        service_name: Option<String>,
        /// Lifetime in seconds, defaults to `auth.service_token_ttl`
        #[arg(long)]
        ttl_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref()
        && !Path::new(path).is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli_overrides(cli.port, cli.verbose);

    logging::init_logging(&config.logging);

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "clinica-server starting");
            clinica_server::run(&config).await
        }
        Commands::Check => check_config(&config),
        Commands::ServiceToken {
            service_id,
            service_name,
            ttl_secs,
        } => issue_service_token(
            &config,
            &service_id,
            service_name,
            ttl_secs.map(Duration::from_secs),
        ),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    config.validate()?;
    tracing::info!(
        database = %config.database.redacted_dsn(),
        addr = %config.server.socket_addr(),
        "configuration is valid"
    );
    println!("Configuration is valid");
    Ok(())
}

fn issue_service_token(
    config: &AppConfig,
    service_id: &str,
    service_name: Option<String>,
    ttl: Option<Duration>,
) -> Result<()> {
    config.auth.validate()?;
    let codec = TokenCodec::new(&config.auth);
    let ttl = ttl.unwrap_or(config.auth.service_token_ttl);
    let token = codec.issue(
        service_id,
        TokenClaims::Service {
            service: service_name.unwrap_or_else(|| service_id.to_owned()),
        },
        ttl,
    )?;
    tracing::info!(
        target: "security",
        service_id,
        ttl_secs = ttl.as_secs(),
        "service token issued"
    );
    println!("{token}");
    Ok(())
}
