//! Transport Cache CLI application
//!
//! Command-line interface for resolving HTTP resources through the
//! persistent transport cache.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use transport_cache::cli::{
    handle_auth, handle_cache, handle_fetch, handle_inspect, handle_last_modified, open_store,
    Cli, Commands,
};
use transport_cache::config::AppConfig;
use transport_cache::errors::Result;

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let app_config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &app_config);

    info!("Transport Cache v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Auth(args) => handle_auth(args).await,
        command => {
            let store = open_store(&cli.global, &app_config).await?;
            match command {
                Commands::Fetch(args) => handle_fetch(args, &store).await,
                Commands::LastModified(args) => handle_last_modified(args, &store).await,
                Commands::Inspect(args) => handle_inspect(args, &store).await,
                Commands::Cache(args) => handle_cache(args, &store).await,
                Commands::Auth(args) => handle_auth(args).await,
            }
        }
    }
}

/// Initialize logging from CLI verbosity, falling back to the config file level
fn init_logging(cli: &Cli, app_config: &AppConfig) {
    let explicit = cli.global.quiet || cli.global.verbose || cli.global.very_verbose;
    let level = if explicit {
        cli.log_level().to_string().to_lowercase()
    } else {
        app_config.logging.level.clone()
    };

    let mut filter = EnvFilter::from_default_env();
    match format!("transport_cache={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level '{}': {}", level, e),
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
