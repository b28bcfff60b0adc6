use crate::bot::notice::{DiscordChannel, NOTICE_LINGER, NoticeChannel, post_transient};
use crate::bot::{Data, Error};
use std::time::Duration;

/// Command failures that get a short-lived notice in the invoking channel.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandErrorKind {
    MissingArgument,
    Cooldown { remaining: Duration },
    PermissionDenied,
    NotFound { prefix: String },
    BadArgument,
    Forbidden,
}

impl CommandErrorKind {
    pub fn message(&self) -> String {
        match self {
            CommandErrorKind::MissingArgument => {
                "**Uh oh! Couldn't find anyone to mention! Try again!**".to_string()
            }
            CommandErrorKind::Cooldown { remaining } => format!(
                "That command is on cooldown. Try again in **{}** seconds.",
                grouped_seconds(*remaining)
            ),
            CommandErrorKind::PermissionDenied => {
                "**Uh oh! You don't have permission to use this command!**".to_string()
            }
            CommandErrorKind::NotFound { prefix } => format!(
                "**Command Not Found! Please use `{}help` to see all commands**",
                prefix
            ),
            CommandErrorKind::BadArgument => "**I could not find that member!**".to_string(),
            CommandErrorKind::Forbidden => {
                "**I don't have permissions to execute this command**".to_string()
            }
        }
    }
}

/// Seconds with two decimals and comma-grouped thousands, e.g. `1,234.50`.
fn grouped_seconds(duration: Duration) -> String {
    let fixed = format!("{:.2}", duration.as_secs_f64());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(fixed.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}.{}", grouped, fraction)
}

pub fn classify(error: &poise::FrameworkError<'_, Data, Error>) -> Option<CommandErrorKind> {
    use poise::FrameworkError as E;

    match error {
        E::ArgumentParse { input: None, .. } => Some(CommandErrorKind::MissingArgument),
        E::ArgumentParse { .. } => Some(CommandErrorKind::BadArgument),
        E::CooldownHit {
            remaining_cooldown, ..
        } => Some(CommandErrorKind::Cooldown {
            remaining: *remaining_cooldown,
        }),
        E::CommandCheckFailed { .. }
        | E::MissingUserPermissions { .. }
        | E::NotAnOwner { .. }
        | E::GuildOnly { .. }
        | E::DmOnly { .. }
        | E::NsfwOnly { .. } => Some(CommandErrorKind::PermissionDenied),
        E::UnknownCommand { prefix, .. } => Some(CommandErrorKind::NotFound {
            prefix: prefix.to_string(),
        }),
        E::MissingBotPermissions { .. } => Some(CommandErrorKind::Forbidden),
        E::Command { error, .. } if is_forbidden(error.as_ref()) => {
            Some(CommandErrorKind::Forbidden)
        }
        _ => None,
    }
}

/// True when a command failed because Discord answered 403.
fn is_forbidden(error: &(dyn std::error::Error + Send + Sync + 'static)) -> bool {
    matches!(
        error.downcast_ref::<serenity::Error>(),
        Some(serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(response)))
            if response.status_code.as_u16() == 403
    )
}

pub async fn notify<C: NoticeChannel>(channel: &C, kind: &CommandErrorKind) {
    post_transient(channel, &kind.message(), NOTICE_LINGER).await;
}

fn notice_channel(error: &poise::FrameworkError<'_, Data, Error>) -> Option<DiscordChannel> {
    if let poise::FrameworkError::UnknownCommand { ctx, msg, .. } = error {
        return Some(DiscordChannel::new(ctx.http.clone(), msg.channel_id));
    }

    error
        .ctx()
        .map(|ctx| DiscordChannel::new(ctx.serenity_context().http.clone(), ctx.channel_id()))
}

pub async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    let notice = classify(&error).zip(notice_channel(&error));

    let Some((kind, channel)) = notice else {
        if let Err(e) = poise::builtins::on_error(error).await {
            tracing::error!("Error while handling error: {:?}", e);
        }
        return;
    };

    tracing::warn!("Command error: {:?}", kind);
    notify(&channel, &kind).await;
}
