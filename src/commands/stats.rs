//! `/stats`: a per-user invocation counter persisted in a data map.
use crate::database::DataMap;
use crate::dispatch::{
    CommandDescriptor, CommandHandler, Context, ReplyMessage, SubcommandDescriptor,
};
use crate::model::AppState;
use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::model::application::CommandOptionType;

pub const STATS_MAP: &str = "user_stats";
pub const DISABLED_REPLY: &str = "📉 Statistics are disabled: no database is configured.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub invocations: u64,
    pub last_seen: Option<DateTime<Utc>>,
}

pub fn register() -> CommandDescriptor {
    CommandDescriptor::new("stats")
        .description("Shows how often you used this command.")
        .cool_down(3)
        .subcommand(SubcommandDescriptor::new("stats show"))
        .subcommand(
            SubcommandDescriptor::new("stats reset")
                .description("Forgets your statistics.")
                .cool_down(60),
        )
        .src(
            CreateCommand::new("stats")
                .description("Shows how often you used this command.")
                .add_option(CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "show",
                    "Shows your statistics.",
                ))
                .add_option(CreateCommandOption::new(
                    CommandOptionType::SubCommand,
                    "reset",
                    "Forgets your statistics.",
                )),
        )
}

pub struct Stats;

#[async_trait]
impl CommandHandler<AppState> for Stats {
    async fn callback(&self, ctx: &mut Context<AppState>) -> anyhow::Result<()> {
        let Some(pool) = ctx.state.db.clone() else {
            ctx.reply(ReplyMessage::new(DISABLED_REPLY).ephemeral()).await;
            ctx.record_error(anyhow!("stats requested without a database"));
            return Ok(());
        };
        let map: DataMap<UserStats> = DataMap::new(pool, STATS_MAP)?;
        let user_id = ctx.user_id().to_owned();

        if ctx.invocation.subcommand.as_deref() == Some("reset") {
            let removed = map.remove(&user_id).await?;
            let content = if removed {
                "🧹 Your statistics were reset."
            } else {
                "There was nothing to reset."
            };
            ctx.reply(ReplyMessage::new(content).ephemeral()).await;
            return Ok(());
        }

        let mut stats = map.get(&user_id).await?.unwrap_or_default();
        let previous = stats.last_seen.replace(ctx.issued_at);
        stats.invocations += 1;
        map.update(&user_id, &stats).await?;

        let content = match previous {
            Some(at) => format!(
                "📈 You checked your stats **{}** times. Previous check: <t:{}:R>.",
                stats.invocations,
                at.timestamp()
            ),
            None => "📈 First time checking your stats!".to_string(),
        };
        ctx.reply(content).await;
        Ok(())
    }
}
