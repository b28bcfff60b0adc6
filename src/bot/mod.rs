pub mod commands;
pub mod handlers;
pub mod notice;

use crate::config::Config;
use crate::database;
use crate::sync::MembershipSync;
use anyhow::Result;
use poise::serenity_prelude as serenity;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

#[derive(Clone)]
pub struct Data {
    pub config: Config,
    pub sync: MembershipSync,
}

pub async fn create_bot(config: Config) -> Result<serenity::Client> {
    let pool = database::create_connection(&config.database_url).await?;

    let data = Data {
        config: config.clone(),
        sync: MembershipSync::new(pool),
    };

    // Member events and guild member lists need GUILD_MEMBERS; prefix
    // commands need MESSAGE_CONTENT.
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![commands::meta::ping(), commands::meta::help()],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                mention_as_prefix: true,
                ..Default::default()
            },
            owners: config.owner_id.map(serenity::UserId::new).into_iter().collect(),
            on_error: |error| Box::pin(handlers::errors::on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(data)
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    Ok(client)
}
