//! Co-Pilot Board - conversation backend
//!
#![doc = "Co-Pilot Board - conversation backend"]
#![doc = "Main entry point for the coboard server and CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coboard::cli::{Cli, Commands};
use coboard::commands;
use coboard::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting Co-Pilot Board server");
            commands::serve::run_serve(config).await?;
            Ok(())
        }
        Commands::Conversations { command } => {
            tracing::info!("Starting conversations command");
            commands::conversations::handle_conversations(&config, command)?;
            Ok(())
        }
        Commands::Export {
            conversation_id,
            output,
        } => {
            tracing::info!("Exporting analysis for {}", conversation_id);
            commands::export::run_export(&config, &conversation_id, output)?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// `RUST_LOG` takes precedence; otherwise `-v` raises the default to debug.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "coboard=debug,tower_http=debug"
    } else {
        "coboard=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
