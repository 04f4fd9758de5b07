use clap::Parser;
use heatmint_lib::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    if let Err(err) = Cli::parse().run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
