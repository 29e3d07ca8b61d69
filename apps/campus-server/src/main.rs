use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use modkit::{ModuleRegistry, RunOptions, ShutdownOptions};
use modkit_db::{absolutize_dsn, ConnectOpts, DbHandle};
use runtime::{AppConfig, CliArgs};

use api_ingress::ApiIngress;
use campus_connect::config::CampusConnectConfig;
use campus_connect::CampusConnectModule;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// Hands each module its `modules.<name>` section.
struct ModulesConfig(AppConfig);

impl modkit::ConfigProvider for ModulesConfig {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.0.module_section(module_name)
    }
}

/// Campus Connect Server - announcements, events and shared resources
#[derive(Parser)]
#[command(name = "campus-server")]
#[command(about = "Campus Connect Server - announcements, events and shared resources")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use a throwaway in-memory database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // home_dir is normalized and created by the loader.
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);
    wire_ingress_bind_addr(&mut config, args.port.is_some());

    let logging = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging, Path::new(&config.server.home_dir));
    tracing::info!(home_dir = %config.server.home_dir, "Campus Connect server starting");

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(&config, &args),
    }
}

/// The ingress listens on `server.host:server.port` unless its own section
/// names an address; an explicit `--port` always wins.
fn wire_ingress_bind_addr(config: &mut AppConfig, port_overridden: bool) {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let section = config
        .modules
        .entry(api_ingress::MODULE_NAME.to_string())
        .or_insert_with(|| serde_json::json!({}));
    if let Some(obj) = section.as_object_mut() {
        if port_overridden || !obj.contains_key("bind_addr") {
            obj.insert("bind_addr".to_string(), serde_json::Value::String(addr));
        }
    }
}

fn resolve_dsn(config: &AppConfig, mock: bool) -> Result<Option<(String, ConnectOpts)>> {
    if mock {
        return Ok(Some((MEMORY_DSN.to_string(), ConnectOpts::default())));
    }
    let Some(db) = &config.database else {
        return Ok(None);
    };
    if db.url.trim().is_empty() {
        bail!("database.url is empty");
    }
    let dsn = absolutize_dsn(&db.url, Path::new(&config.server.home_dir))
        .with_context(|| format!("invalid database.url '{}'", db.url))?;

    let mut opts = ConnectOpts {
        max_conns: db.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    };
    if let Some(ms) = db.busy_timeout_ms {
        opts.busy_timeout = Duration::from_millis(u64::from(ms));
    }
    Ok(Some((dsn, opts)))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let db = match resolve_dsn(&config, args.mock)? {
        Some((dsn, opts)) => {
            tracing::info!(dsn = %dsn, "connecting to database");
            Some(Arc::new(DbHandle::connect(&dsn, opts).await?))
        }
        None => {
            tracing::warn!("No database configuration found, running without database");
            None
        }
    };

    let ingress = Arc::new(ApiIngress::default());
    let campus = Arc::new(CampusConnectModule::default());
    let registry = ModuleRegistry::builder()
        .register(ingress.into_entry())
        .register(campus.into_entry())
        .build()?;

    modkit::run(RunOptions {
        registry,
        modules_cfg: Arc::new(ModulesConfig(config)),
        db,
        shutdown: ShutdownOptions::Signals,
    })
    .await
}

fn check_config(config: &AppConfig, args: &CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    match resolve_dsn(config, args.mock)? {
        Some((dsn, _)) => println!("Database: {dsn}"),
        None => println!("Database: none"),
    }

    let campus: CampusConnectConfig = match config.module_section(campus_connect::MODULE_NAME) {
        Some(section) => serde_json::from_value(section.clone())
            .context("invalid modules.campus_connect section")?,
        None => bail!("missing modules.campus_connect section"),
    };
    if campus.jwt_secret.trim().is_empty() {
        bail!("modules.campus_connect.jwt_secret must be set");
    }

    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}
