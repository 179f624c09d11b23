use anyhow::Context as _;
use hashi::config::Config;
use hashi::dispatch::CommandManager;
use hashi::handler::Handler;
use hashi::{AppState, commands, database, telemetry};
use serenity::model::gateway::GatewayIntents;
use serenity::prelude::*;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the variables may come from the environment.
    let _ = dotenv::dotenv();

    let config = Config::load().context("Failed to load configuration")?;
    telemetry::init(config.dev_mode);
    info!(project = %config.project_name, dev_mode = config.dev_mode, "Starting");

    let db = match config.database_url.as_deref() {
        Some(url) => {
            let pool = database::connect(url, config.database_name.as_deref())
                .await
                .context("Failed to connect to the database")?;
            database::ensure_schema(&pool)
                .await
                .context("Failed to prepare the database schema")?;
            Some(pool)
        }
        None => {
            warn!("No database configured; data maps are disabled");
            None
        }
    };

    let mut manager = CommandManager::new().privilege_policy(config.privilege_policy);
    commands::register_all(&mut manager).context("Failed to register commands")?;
    info!(count = manager.registry().len(), "Commands registered");

    let intents = GatewayIntents::from_bits_truncate(config.intents);
    let mut client = Client::builder(&config.token, intents)
        .event_handler(Handler {
            manager: Arc::new(manager),
        })
        .await
        .context("Error creating the Discord client")?;

    let app_state = Arc::new(AppState::new(
        config,
        db,
        Some(Arc::clone(&client.shard_manager)),
    ));
    {
        let mut data = client.data.write().await;
        data.insert::<AppState>(app_state);
    }

    client.start().await.context("Client error")?;
    Ok(())
}
