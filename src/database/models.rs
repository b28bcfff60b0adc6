use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GuildRecord {
    #[sqlx(rename = "guildID")]
    pub guild_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MemberRecord {
    #[sqlx(rename = "guildID")]
    pub guild_id: i64,
    #[sqlx(rename = "discordUser")]
    pub discord_user: String,
    #[sqlx(rename = "discordID")]
    pub discord_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Discord snowflakes are unsigned; SQLite integers are signed. The cast keeps
/// every bit, so `from_db_id(to_db_id(x)) == x` for all `x`.
pub fn to_db_id(id: u64) -> i64 {
    id as i64
}

pub fn from_db_id(id: i64) -> u64 {
    id as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_above_i64_max_survive_storage() {
        let id = u64::MAX - 7;
        assert!(to_db_id(id) < 0);
        assert_eq!(from_db_id(to_db_id(id)), id);
    }
}
