use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::info;

use slotdb::{
    connection::MySqlProbe,
    observability::{describe_metrics, init_logging, log_settings_info},
    rotation::Slot,
    secrets::{EnvVarSecretStore, SecretStore, VaultSecretStore},
    ConnectionResolver, ResolverSettings, APP_NAME, VERSION,
};

#[derive(Parser)]
#[command(name = "slotdb")]
#[command(about = "Resolve MySQL connection settings from rotating secret-store credentials")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and probe the connection settings for an environment
    Resolve {
        /// Environment name (defaults to SLOTDB_ENV / ENV)
        #[arg(long)]
        env: Option<String>,

        /// Probe attempts before giving up (defaults to SLOTDB_MAX_ATTEMPTS)
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Secret store backend
        #[arg(long, value_enum, default_value_t = Backend::Env)]
        backend: Backend,
    },

    /// Print the secret paths a resolution would read
    Paths {
        /// Environment name (defaults to SLOTDB_ENV / ENV)
        #[arg(long)]
        env: Option<String>,

        /// Only print the credential path for this slot
        #[arg(long)]
        slot: Option<Slot>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    Env,
    Vault,
    Aws,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists; this must happen before settings are read
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    init_logging(default_level, cli.json_logs);
    describe_metrics();

    let mut settings = ResolverSettings::from_env().context("invalid slotdb settings")?;

    match cli.command {
        Commands::Resolve { env, max_attempts, backend } => {
            if let Some(env) = env {
                settings.env = env;
            }
            if let Some(max_attempts) = max_attempts {
                settings.max_attempts = max_attempts;
            }
            settings.validate().context("invalid slotdb settings")?;
            resolve(&settings, backend).await
        }
        Commands::Paths { env, slot } => {
            if let Some(env) = env {
                settings.env = env;
            }
            settings.validate().context("invalid slotdb settings")?;
            print_paths(&settings, slot)
        }
    }
}

async fn resolve(settings: &ResolverSettings, backend: Backend) -> anyhow::Result<()> {
    info!(app_name = APP_NAME, version = VERSION, backend = ?backend, "Starting resolution");
    log_settings_info(settings);

    let store = build_store(settings, backend).await?;
    let probe = Arc::new(MySqlProbe::mysql(settings.connect_timeout()));
    let resolver = ConnectionResolver::from_settings(settings, store, probe)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let config = resolver
        .resolve_connection_with(&settings.env, settings.max_attempts, &cancel)
        .await
        .with_context(|| format!("failed to resolve connection for env '{}'", settings.env))?;

    println!("{}", config);
    Ok(())
}

fn print_paths(settings: &ResolverSettings, slot: Option<Slot>) -> anyhow::Result<()> {
    let templates = settings.path_templates()?;

    match slot {
        Some(slot) => println!("{}", templates.credential_path(&settings.env, slot)),
        None => {
            println!("indicator:  {}", templates.indicator_path(&settings.env));
            for slot in [Slot::One, Slot::Two] {
                println!(
                    "slot {:<4}   {}",
                    slot.as_str(),
                    templates.credential_path(&settings.env, slot)
                );
            }
        }
    }
    Ok(())
}

async fn build_store(
    settings: &ResolverSettings,
    backend: Backend,
) -> anyhow::Result<Arc<dyn SecretStore>> {
    match backend {
        Backend::Env => Ok(Arc::new(EnvVarSecretStore::new())),
        Backend::Vault => {
            let store = VaultSecretStore::from_env().context("failed to configure Vault backend")?;
            Ok(Arc::new(store))
        }
        Backend::Aws => aws_store(settings).await,
    }
}

#[cfg(feature = "aws")]
async fn aws_store(settings: &ResolverSettings) -> anyhow::Result<Arc<dyn SecretStore>> {
    use slotdb::secrets::{AwsConfig, AwsSecretStore};

    let config = AwsConfig {
        region: settings.aws_region.clone(),
        endpoint_url: std::env::var("SLOTDB_AWS_ENDPOINT_URL").ok(),
    };
    Ok(Arc::new(AwsSecretStore::new(config).await))
}

#[cfg(not(feature = "aws"))]
async fn aws_store(_settings: &ResolverSettings) -> anyhow::Result<Arc<dyn SecretStore>> {
    anyhow::bail!("the aws backend requires building slotdb with `--features aws`")
}
