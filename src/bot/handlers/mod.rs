pub mod errors;

use crate::bot::{Data, Error};
use crate::sync::{GuildSnapshot, MemberSnapshot, MembershipEvent, MembershipSync, SyncError, SyncReport};
use poise::serenity_prelude as serenity;
use std::num::NonZeroU16;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!(
                "Bot logged in as {} (prefix `{}`)",
                data_about_bot.user.name,
                data.config.prefix
            );
            ctx.set_activity(Some(serenity::ActivityData::playing(
                "with yo feelings 😍 😳 🙈",
            )));
            match data.sync.tracked_guilds().await {
                Ok(guilds) => tracing::info!("Tracking membership for {} guild(s)", guilds.len()),
                Err(e) => tracing::error!("Could not read tracked guilds: {}", e),
            }
        }
        // `is_new` is Some(false) for guilds we were already in at startup.
        serenity::FullEvent::GuildCreate { guild, is_new } if *is_new != Some(false) => {
            let event = MembershipEvent::GuildAdded(joined_guild_snapshot(ctx, guild).await);
            let _ = sync_membership(&data.sync, &event).await;
        }
        serenity::FullEvent::GuildDelete { incomplete, full } => {
            if incomplete.unavailable {
                tracing::warn!("Guild {} became unavailable", incomplete.id);
                return Ok(());
            }

            let cached = full.as_ref().map(guild_snapshot);
            let Some(guild) = removed_guild_snapshot(&data.sync, incomplete.id.get(), cached).await
            else {
                return Ok(());
            };
            let _ = sync_membership(&data.sync, &MembershipEvent::GuildRemoved(guild)).await;
        }
        serenity::FullEvent::GuildMemberAddition { new_member } => {
            let event = MembershipEvent::MemberAdded {
                guild_id: new_member.guild_id.get(),
                member: member_snapshot(&new_member.user),
            };
            let _ = sync_membership(&data.sync, &event).await;
        }
        serenity::FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            let event = MembershipEvent::MemberRemoved {
                guild_id: guild_id.get(),
                member: member_snapshot(user),
            };
            let _ = sync_membership(&data.sync, &event).await;
        }
        _ => {}
    }
    Ok(())
}

/// Applies one membership event. Failures are logged here and handed back so
/// the caller can inspect them, but never propagated into the gateway loop.
pub async fn sync_membership(
    sync: &MembershipSync,
    event: &MembershipEvent,
) -> Result<SyncReport, SyncError> {
    let result = sync.apply(event).await;
    match &result {
        Ok(report) => tracing::debug!(
            "Synced {} event for guild {}: {} statement(s), {} row(s)",
            event.kind(),
            event.guild_id(),
            report.statements,
            report.rows_affected
        ),
        Err(e) => tracing::error!(
            "Failed to sync {} event for guild {}: {}",
            event.kind(),
            event.guild_id(),
            e
        ),
    }
    result
}

pub fn member_snapshot(user: &serenity::User) -> MemberSnapshot {
    MemberSnapshot {
        id: user.id.get(),
        name: user.name.clone(),
        discriminator: discriminator_text(user.discriminator),
    }
}

/// Legacy discriminators are zero-padded; migrated usernames have none.
fn discriminator_text(discriminator: Option<NonZeroU16>) -> String {
    discriminator
        .map(|d| format!("{:04}", d.get()))
        .unwrap_or_else(|| "0".to_string())
}

/// Snapshot of a guild the bot just joined. GUILD_CREATE only carries the
/// full member list for small guilds, so large ones are paged in over REST.
async fn joined_guild_snapshot(ctx: &serenity::Context, guild: &serenity::Guild) -> GuildSnapshot {
    let mut snapshot = guild_snapshot(guild);
    if !guild.large && snapshot.members.len() as u64 >= guild.member_count {
        return snapshot;
    }

    let fetched = collect_member_pages(move |after| async move {
        let page = guild
            .id
            .members(ctx, Some(MEMBER_PAGE_SIZE), after.map(serenity::UserId::new))
            .await?;
        Ok::<_, ::serenity::Error>(page.iter().map(|m| member_snapshot(&m.user)).collect())
    })
    .await;

    match fetched {
        Ok(members) => snapshot.merge_members(members),
        Err(e) => tracing::warn!(
            "Could not fetch full member list for guild {}, storing {} cached member(s): {:?}",
            guild.id,
            snapshot.members.len(),
            e
        ),
    }
    snapshot
}

/// Discord's upper bound for one page of the list-guild-members endpoint.
const MEMBER_PAGE_SIZE: u64 = 1000;

/// Pages through a member list. `fetch` receives the highest id seen so far
/// and returns the next page; a short page ends the listing.
pub async fn collect_member_pages<F, Fut, E>(mut fetch: F) -> Result<Vec<MemberSnapshot>, E>
where
    F: FnMut(Option<u64>) -> Fut,
    Fut: Future<Output = Result<Vec<MemberSnapshot>, E>>,
{
    let mut members = Vec::new();
    let mut after = None;
    loop {
        let page = fetch(after).await?;
        let short = (page.len() as u64) < MEMBER_PAGE_SIZE;
        let last = page.iter().map(|m| m.id).max();
        members.extend(page);

        match last {
            Some(id) if !short => after = Some(id),
            _ => return Ok(members),
        }
    }
}

/// Everything that must be deleted when the bot leaves a guild: the cached
/// members (if the cache still has the guild) plus every stored row, since
/// the cache of a large guild is rarely complete.
pub async fn removed_guild_snapshot(
    sync: &MembershipSync,
    guild_id: u64,
    cached: Option<GuildSnapshot>,
) -> Option<GuildSnapshot> {
    let stored = match sync.stored_guild(guild_id).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::error!("Could not load stored members for removed guild: {}", e);
            return cached;
        }
    };

    match cached {
        Some(mut guild) => {
            guild.merge_members(stored.members);
            Some(guild)
        }
        None => Some(stored),
    }
}

pub fn guild_snapshot(guild: &serenity::Guild) -> GuildSnapshot {
    GuildSnapshot {
        id: guild.id.get(),
        name: guild.name.clone(),
        members: guild
            .members
            .values()
            .map(|member| member_snapshot(&member.user))
            .collect(),
    }
}
