//! Mirrors guild membership lifecycle events into the `guilds` and `members`
//! tables.
//!
//! Multi-statement events run inside one transaction, and inserts are upserts
//! on the natural key, so a member-join racing a guild-join for the same user
//! leaves a single row.

pub mod snapshot;

pub use snapshot::{GuildSnapshot, MemberSnapshot};

use crate::database::models::{GuildRecord, from_db_id};
use crate::database::queries;
use sqlx::SqlitePool;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub enum MembershipEvent {
    GuildAdded(GuildSnapshot),
    GuildRemoved(GuildSnapshot),
    MemberAdded { guild_id: u64, member: MemberSnapshot },
    MemberRemoved { guild_id: u64, member: MemberSnapshot },
}

impl MembershipEvent {
    pub fn guild_id(&self) -> u64 {
        match self {
            MembershipEvent::GuildAdded(guild) | MembershipEvent::GuildRemoved(guild) => guild.id,
            MembershipEvent::MemberAdded { guild_id, .. }
            | MembershipEvent::MemberRemoved { guild_id, .. } => *guild_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MembershipEvent::GuildAdded(_) => "guild added",
            MembershipEvent::GuildRemoved(_) => "guild removed",
            MembershipEvent::MemberAdded { .. } => "member added",
            MembershipEvent::MemberRemoved { .. } => "member removed",
        }
    }
}

/// What one event did to the database.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Statements executed, including ones that matched nothing.
    pub statements: usize,
    pub rows_affected: u64,
}

impl SyncReport {
    fn record(&mut self, rows: u64) {
        self.statements += 1;
        self.rows_affected += rows;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("database error while {operation} for guild {guild_id}: {source}")]
    Database {
        operation: &'static str,
        guild_id: u64,
        source: sqlx::Error,
    },
    #[error("database error while {operation}: {source}")]
    Lookup {
        operation: &'static str,
        source: sqlx::Error,
    },
}

fn db_error(operation: &'static str, guild_id: u64) -> impl FnOnce(sqlx::Error) -> SyncError {
    move |source| SyncError::Database {
        operation,
        guild_id,
        source,
    }
}

#[derive(Clone)]
pub struct MembershipSync {
    pool: SqlitePool,
}

impl MembershipSync {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn apply(&self, event: &MembershipEvent) -> Result<SyncReport, SyncError> {
        match event {
            MembershipEvent::GuildAdded(guild) => self.guild_added(guild).await,
            MembershipEvent::GuildRemoved(guild) => self.guild_removed(guild).await,
            MembershipEvent::MemberAdded { guild_id, member } => {
                self.member_added(*guild_id, member).await
            }
            MembershipEvent::MemberRemoved { guild_id, member } => {
                self.member_removed(*guild_id, member).await
            }
        }
    }

    /// One member row per current member, then the guild row.
    pub async fn guild_added(&self, guild: &GuildSnapshot) -> Result<SyncReport, SyncError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("opening transaction", guild.id))?;
        let mut report = SyncReport::default();

        for member in &guild.members {
            let rows = queries::insert_member(&mut tx, guild.id, &member.tag(), member.id)
                .await
                .map_err(db_error("inserting member", guild.id))?;
            debug!("Inserted {} member row(s) for {} into guild {}", rows, member.id, guild.id);
            report.record(rows);
        }

        let rows = queries::insert_guild(&mut tx, guild.id)
            .await
            .map_err(db_error("inserting guild", guild.id))?;
        report.record(rows);

        tx.commit()
            .await
            .map_err(db_error("committing guild insert", guild.id))?;

        info!(
            "Stored guild {} ({}) with {} member(s), {} row(s) written",
            guild.name,
            guild.id,
            guild.members.len(),
            report.rows_affected
        );
        Ok(report)
    }

    /// One member delete per snapshot member, then the guild row.
    pub async fn guild_removed(&self, guild: &GuildSnapshot) -> Result<SyncReport, SyncError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("opening transaction", guild.id))?;
        let mut report = SyncReport::default();

        for member in &guild.members {
            let rows = queries::delete_member(&mut tx, guild.id, member.id)
                .await
                .map_err(db_error("deleting member", guild.id))?;
            report.record(rows);
        }

        let rows = queries::delete_guild(&mut tx, guild.id)
            .await
            .map_err(db_error("deleting guild", guild.id))?;
        report.record(rows);

        tx.commit()
            .await
            .map_err(db_error("committing guild removal", guild.id))?;

        info!(
            "Removed guild {} ({}), {} row(s) deleted",
            guild.name, guild.id, report.rows_affected
        );
        Ok(report)
    }

    pub async fn member_added(
        &self,
        guild_id: u64,
        member: &MemberSnapshot,
    ) -> Result<SyncReport, SyncError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("acquiring connection", guild_id))?;

        let rows = queries::insert_member(&mut conn, guild_id, &member.tag(), member.id)
            .await
            .map_err(db_error("inserting member", guild_id))?;

        let mut report = SyncReport::default();
        report.record(rows);

        info!("Stored member {} ({}) in guild {}, {} row(s) written", member.tag(), member.id, guild_id, rows);
        Ok(report)
    }

    pub async fn member_removed(
        &self,
        guild_id: u64,
        member: &MemberSnapshot,
    ) -> Result<SyncReport, SyncError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("acquiring connection", guild_id))?;

        let rows = queries::delete_member(&mut conn, guild_id, member.id)
            .await
            .map_err(db_error("deleting member", guild_id))?;

        let mut report = SyncReport::default();
        report.record(rows);

        info!("Removed member {} from guild {}, {} row(s) deleted", member.id, guild_id, rows);
        Ok(report)
    }

    pub async fn tracked_guilds(&self) -> Result<Vec<GuildRecord>, SyncError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|source| SyncError::Lookup {
                operation: "acquiring connection",
                source,
            })?;

        queries::list_guilds(&mut conn)
            .await
            .map_err(|source| SyncError::Lookup {
                operation: "listing guilds",
                source,
            })
    }

    /// Rebuilds a guild snapshot from stored rows, for removals where the
    /// gateway cache no longer has the guild.
    pub async fn stored_guild(&self, guild_id: u64) -> Result<GuildSnapshot, SyncError> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(db_error("acquiring connection", guild_id))?;

        let records = queries::members_in_guild(&mut conn, guild_id)
            .await
            .map_err(db_error("loading stored members", guild_id))?;

        let members = records
            .iter()
            .map(|record| MemberSnapshot::from_tag(from_db_id(record.discord_id), &record.discord_user))
            .collect();

        Ok(GuildSnapshot {
            id: guild_id,
            name: guild_id.to_string(),
            members,
        })
    }
}
