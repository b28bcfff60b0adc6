use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub prefix: String,
    pub owner_id: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable is required"))?;

        Self::from_parts(
            discord_token,
            env::var("DATABASE_URL").ok(),
            env::var("COMMAND_PREFIX").ok(),
            env::var("OWNER_ID").ok(),
        )
    }

    fn from_parts(
        discord_token: String,
        database_url: Option<String>,
        prefix: Option<String>,
        owner_id: Option<String>,
    ) -> Result<Self> {
        serenity::utils::validate_token(&discord_token)
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN is not a valid bot token"))?;

        let database_url = database_url.unwrap_or_else(|| "sqlite:enso.db".to_string());
        let prefix = prefix
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| "~".to_string());

        let owner_id = match owner_id {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(0) | Err(_) => {
                    tracing::warn!("Ignoring OWNER_ID {:?}: not a Discord user id", raw);
                    None
                }
                Ok(id) => Some(id),
            },
            None => None,
        };

        Ok(Config {
            discord_token,
            database_url,
            prefix,
            owner_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Shape-valid token made of random bytes, not a real credential.
    const TOKEN: &str = "MTA4MjQ1NjcyNjE1MzE1MjU3Ng.GsYwVh.dQw4w9WgXcQdQw4w9WgXcQdQw4w9WgXcQAb";

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = Config::from_parts(TOKEN.to_string(), None, None, None).unwrap();
        assert_eq!(config.database_url, "sqlite:enso.db");
        assert_eq!(config.prefix, "~");
        assert_eq!(config.owner_id, None);
    }

    #[test]
    fn malformed_token_is_rejected() {
        assert!(Config::from_parts("not a token".to_string(), None, None, None).is_err());
    }

    #[test]
    fn owner_id_must_be_a_nonzero_integer() {
        let parse = |raw: &str| {
            Config::from_parts(TOKEN.to_string(), None, None, Some(raw.to_string()))
                .unwrap()
                .owner_id
        };
        assert_eq!(parse("154840866496839680"), Some(154840866496839680));
        assert_eq!(parse("0"), None);
        assert_eq!(parse("owner"), None);
    }
}
