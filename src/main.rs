use clap::Parser;
use pii_discovery::cli::{self, Args, Command};
use pii_discovery::config::Config;
use pii_discovery::server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = args.command.clone().unwrap_or(Command::Serve);
    let config = Config::from(args);

    tracing::info!("Starting pii-discovery v{}", env!("CARGO_PKG_VERSION"));

    match command {
        Command::Serve => {
            tracing::info!("Binding to {}:{}", config.host, config.port);
            server::run(config).await
        }
        Command::Scan { directory, report } => {
            let path = cli::run_scan(config, &directory, &report).await?;
            println!("{}", path.display());
            Ok(())
        }
    }
}
