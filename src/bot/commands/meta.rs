use crate::bot::{Context, Error};
use std::time::Duration;

/// Sends the latency of the bot (ms)
#[poise::command(prefix_command, slash_command, aliases("Ping"))]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    ctx.say(pong_message(latency)).await?;
    Ok(())
}

/// Shows all available commands
#[poise::command(prefix_command, slash_command, track_edits)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to show help about"] command: Option<String>,
) -> Result<(), Error> {
    let config = poise::builtins::HelpConfiguration {
        extra_text_at_bottom: "All current available commands within Ensō~Chan",
        ..Default::default()
    };
    poise::builtins::help(ctx, command.as_deref(), config).await?;
    Ok(())
}

fn pong_message(latency: Duration) -> String {
    format!("Pong! `{:.0}ms`", latency.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pong_rounds_to_whole_milliseconds() {
        assert_eq!(pong_message(Duration::from_micros(42_900)), "Pong! `43ms`");
    }
}
