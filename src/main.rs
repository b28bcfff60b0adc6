mod bot;
mod config;
mod database;
mod sync;

use anyhow::Result;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "enso_bot=info,poise=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().inspect_err(|e| tracing::error!("Startup failed: {:#}", e))?;

    // Create and start the bot
    let mut client = bot::create_bot(config).await?;

    tracing::info!("Starting Discord bot...");

    // A rejected token is terminal; there is no retry.
    match client.start().await {
        Ok(()) => Ok(()),
        Err(serenity::Error::Gateway(serenity::gateway::GatewayError::InvalidAuthentication)) => {
            tracing::error!("Login unsuccessful.");
            anyhow::bail!("Discord rejected the bot token")
        }
        Err(why) => {
            tracing::error!("Client error: {:?}", why);
            Err(why.into())
        }
    }
}
