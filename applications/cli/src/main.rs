/// Cadenza - playback queue from the command line
use cadenza_cli::{
    commands::{self, Command},
    config::AppConfig,
    library::LibraryProducer,
    notifier::LogNotifier,
};
use cadenza_queue::QueueStore;
use cadenza_storage::JsonStateStore;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadenza")]
#[command(about = "Cadenza playback queue", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "CADENZA_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!(state = %config.state_path.display(), "Using queue state");

    let state = Arc::new(JsonStateStore::new(config.state_path.clone()));
    let queue = QueueStore::new(config.queue.clone())
        .with_persistence(state)
        .with_notifier(Arc::new(LogNotifier));
    queue.hydrate()?;

    let library = LibraryProducer::new(config.library_path.clone(), config.random_batch);
    commands::run(&queue, &library, cli.command).await?;

    Ok(())
}
