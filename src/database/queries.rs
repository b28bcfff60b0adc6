use crate::database::models::{GuildRecord, MemberRecord, to_db_id};
use sqlx::SqliteConnection;

// Every query takes a bare connection so callers decide whether it runs on a
// pooled connection or inside a transaction.

// Guild queries
pub async fn insert_guild(conn: &mut SqliteConnection, guild_id: u64) -> sqlx::Result<u64> {
    let result = sqlx::query("INSERT INTO guilds (guildID) VALUES (?) ON CONFLICT (guildID) DO NOTHING")
        .bind(to_db_id(guild_id))
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_guild(conn: &mut SqliteConnection, guild_id: u64) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM guilds WHERE guildID = ?")
        .bind(to_db_id(guild_id))
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn list_guilds(conn: &mut SqliteConnection) -> sqlx::Result<Vec<GuildRecord>> {
    sqlx::query_as::<_, GuildRecord>("SELECT guildID, created_at FROM guilds ORDER BY guildID ASC")
        .fetch_all(conn)
        .await
}

// Member queries
pub async fn insert_member(
    conn: &mut SqliteConnection,
    guild_id: u64,
    discord_user: &str,
    discord_id: u64,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        "INSERT INTO members (guildID, discordUser, discordID) VALUES (?, ?, ?)
         ON CONFLICT (guildID, discordID) DO NOTHING",
    )
    .bind(to_db_id(guild_id))
    .bind(discord_user)
    .bind(to_db_id(discord_id))
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

pub async fn delete_member(
    conn: &mut SqliteConnection,
    guild_id: u64,
    discord_id: u64,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM members WHERE discordID = ? AND guildID = ?")
        .bind(to_db_id(discord_id))
        .bind(to_db_id(guild_id))
        .execute(conn)
        .await?;

    Ok(result.rows_affected())
}

pub async fn members_in_guild(
    conn: &mut SqliteConnection,
    guild_id: u64,
) -> sqlx::Result<Vec<MemberRecord>> {
    sqlx::query_as::<_, MemberRecord>(
        "SELECT guildID, discordUser, discordID, created_at
         FROM members
         WHERE guildID = ?
         ORDER BY discordID ASC",
    )
    .bind(to_db_id(guild_id))
    .fetch_all(conn)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;

    #[tokio::test]
    async fn member_insert_ignores_existing_natural_key() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        assert_eq!(insert_member(&mut conn, 500, "Alice#0001", 1).await.unwrap(), 1);
        assert_eq!(insert_member(&mut conn, 500, "Alice#0001", 1).await.unwrap(), 0);
        // Same user in another guild is a distinct membership.
        assert_eq!(insert_member(&mut conn, 501, "Alice#0001", 1).await.unwrap(), 1);

        let rows = members_in_guild(&mut conn, 500).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].discord_user, "Alice#0001");
    }

    #[tokio::test]
    async fn delete_member_only_touches_matching_guild() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        insert_member(&mut conn, 500, "Alice#0001", 1).await.unwrap();
        insert_member(&mut conn, 501, "Alice#0001", 1).await.unwrap();

        assert_eq!(delete_member(&mut conn, 500, 1).await.unwrap(), 1);
        assert!(members_in_guild(&mut conn, 500).await.unwrap().is_empty());
        assert_eq!(members_in_guild(&mut conn, 501).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn guild_rows_round_trip_large_ids() {
        let pool = test_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let big = u64::MAX - 1;

        assert_eq!(insert_guild(&mut conn, big).await.unwrap(), 1);
        assert_eq!(insert_guild(&mut conn, big).await.unwrap(), 0);

        let guilds = list_guilds(&mut conn).await.unwrap();
        assert_eq!(guilds.len(), 1);
        assert_eq!(crate::database::models::from_db_id(guilds[0].guild_id), big);

        assert_eq!(delete_guild(&mut conn, big).await.unwrap(), 1);
        assert!(list_guilds(&mut conn).await.unwrap().is_empty());
    }
}
