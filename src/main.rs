use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use resource_fetcher::app::AppContext;
use resource_fetcher::cli::{commands, Cli, Commands};
use resource_fetcher::timeout::Timeout;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("resource_fetcher=trace")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let timeout = match cli.timeout_ms {
        Some(ms) => Timeout::new(Duration::from_millis(ms)),
        None => Timeout::manual(),
    };

    // Ctrl-C cancels whatever download is in flight.
    let canceller = timeout.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    let ctx = AppContext::load(timeout)?;

    match cli.command {
        Commands::Get {
            url,
            hide_url,
            name,
            throw,
        } => {
            commands::get(&ctx, &url, hide_url, name, throw).await?;
        }
        Commands::Etag { url, etag } => {
            commands::etag(&ctx, &url, etag.as_deref()).await?;
        }
        Commands::Property { url, property } => {
            commands::property(&ctx, &url, &property).await?;
        }
        Commands::File { path } => {
            commands::file(&path).await?;
        }
    }

    Ok(())
}
