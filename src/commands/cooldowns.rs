//! `/cooldowns`: the caller's live cooldowns and in-flight commands.
use crate::dispatch::{CommandDescriptor, CommandHandler, Context, ReplyMessage};
use crate::model::AppState;
use crate::services::cool_down::CoolDownEntry;
use crate::services::interfering::InterferingEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::builder::CreateCommand;
use std::fmt::Write;

pub fn register() -> CommandDescriptor {
    CommandDescriptor::new("cooldowns")
        .description("Lists your running cool downs and commands.")
        .src(
            CreateCommand::new("cooldowns")
                .description("Lists your running cool downs and commands."),
        )
}

pub struct CoolDowns;

#[async_trait]
impl CommandHandler<AppState> for CoolDowns {
    async fn callback(&self, ctx: &mut Context<AppState>) -> anyhow::Result<()> {
        let now = ctx.flow().now();
        let cool_downs = ctx.flow().cool_downs(ctx.user_id(), None);
        let running: Vec<InterferingEntry> = ctx
            .flow()
            .interfering(ctx.user_id(), &[])
            .into_iter()
            .filter(|entry| entry.handle.interaction_id != ctx.invocation.interaction_id)
            .collect();
        let content = render(now, &cool_downs, &running);
        ctx.reply(ReplyMessage::new(content).ephemeral()).await;
        Ok(())
    }
}

pub(crate) fn render(
    now: DateTime<Utc>,
    cool_downs: &[CoolDownEntry],
    running: &[InterferingEntry],
) -> String {
    if cool_downs.is_empty() && running.is_empty() {
        return "Nothing is cooling down or running.".to_string();
    }
    let mut out = String::new();
    if !cool_downs.is_empty() {
        out.push_str("**Cool downs**\n");
        for entry in cool_downs {
            let remaining = (entry.expires_at - now).num_milliseconds().max(0) as f64 / 1000.0;
            let _ = writeln!(out, "`/{}` → **`{remaining:.1}`**s", entry.key);
        }
    }
    if !running.is_empty() {
        out.push_str("**Running**\n");
        for entry in running {
            let _ = writeln!(out, "{}", entry.mention());
        }
    }
    out.trim_end().to_string()
}
