use anyhow::Result;

use tick_embed::config::Config;
use tick_embed::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Load config
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {:#}", e);
            eprintln!("Check config/default.toml or the TICK_EMBED_* environment variables");
            std::process::exit(1);
        }
    };

    // Init tracing (JSON lines on stdout)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                config
                    .logging
                    .level
                    .parse()
                    .unwrap_or_else(|_| "info".parse().unwrap())
            }),
        )
        .with_ansi(false)
        .json()
        .init();

    server::serve(config).await
}
