mod cli;
mod daemon;
mod feed;
mod messages;

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::cli::{Cli, Commands};
use crate::daemon::App;
use frontdesk_core::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "frontdesk_cli=debug,frontdesk_ledger=debug,frontdesk_presence=debug,info"
    } else {
        "frontdesk_cli=info,frontdesk_ledger=info,frontdesk_presence=info,warn"
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer())
        .init();

    // Handle ConfigSample immediately without loading config
    if let Some(Commands::ConfigSample { output }) = &cli.command {
        let path = output
            .clone()
            .unwrap_or_else(|| PathBuf::from("./frontdesk.sample.yaml"));
        Config::sample().save(&path)?;
        println!("sample config written to {}", path.display());
        return Ok(());
    }

    let config = Config::load(&cli.config_path)?;
    let app = App::new(config)?;

    match cli.command {
        Some(Commands::ConfigSample { .. }) => {
            // Already handled
        }
        Some(Commands::SwitchOut) => {
            info!("logging switch-out");
            app.ledger.log_switch_out().await?;
            println!("switch-out logged");
        }
        Some(Commands::Update) => {
            app.refresh_snapshots().await?;
            println!("snapshots updated");
        }
        Some(Commands::Rebuild) => {
            println!("rebuilding switch history, this can take several minutes");
            let seen = app.rebuild_presence().await?;
            println!("presence map rebuilt, {} members tracked", seen.len());
        }
        Some(Commands::Run) | None => {
            let state = app.bootstrap().await?;
            app.run(state).await?;
        }
    }

    Ok(())
}
