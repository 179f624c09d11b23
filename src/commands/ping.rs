use crate::dispatch::{CommandDescriptor, CommandHandler, Context};
use crate::model::AppState;
use async_trait::async_trait;
use serenity::builder::CreateCommand;
use std::time::Duration;

pub fn register() -> CommandDescriptor {
    CommandDescriptor::new("ping")
        .description("Checks the bot's heartbeat latency.")
        .cool_down(5)
        .src(CreateCommand::new("ping").description("Checks the bot's heartbeat latency."))
}

pub struct Ping;

#[async_trait]
impl CommandHandler<AppState> for Ping {
    async fn callback(&self, ctx: &mut Context<AppState>) -> anyhow::Result<()> {
        let latency = gateway_latency(&ctx.state).await.map_or_else(
            || "N/A".to_string(),
            |latency| format!("{} ms", latency.as_millis()),
        );
        ctx.reply(format!("Pong! Heartbeat Latency: `{latency}`")).await;
        Ok(())
    }
}

/// Worst heartbeat latency across running shards; `None` before the first heartbeat ack.
async fn gateway_latency(state: &AppState) -> Option<Duration> {
    let shard_manager = state.shard_manager.as_ref()?;
    let runners = shard_manager.runners.lock().await;
    runners.values().filter_map(|runner| runner.latency).max()
}
