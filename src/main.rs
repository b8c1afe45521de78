mod cli;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "note_weaver=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Uncover {
            note,
            tag,
            line,
            print,
        } => {
            cli::uncover(&cli.vault, &note, &tag, line, print).await?;
        }
        Commands::Locate { note, tag } => {
            cli::locate_notes(&cli.vault, &note, &tag).await?;
        }
        Commands::Config => {
            cli::show_config()?;
        }
    }

    Ok(())
}
