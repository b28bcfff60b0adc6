use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    create_guilds_table(pool).await?;
    create_members_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_guilds_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS guilds (
            guildID INTEGER PRIMARY KEY NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

// No foreign key to guilds: members can arrive before their guild row.
async fn create_members_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            guildID INTEGER NOT NULL,
            discordUser TEXT NOT NULL,
            discordID INTEGER NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (guildID, discordID)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
