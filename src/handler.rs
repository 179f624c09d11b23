use crate::dispatch::{CommandManager, Dispatch, Responder};
use crate::interactions::{InteractionResponder, invocation_from};
use crate::model::AppState;
use serenity::async_trait;
use serenity::client::Context;
use serenity::model::application::{Command, Interaction};
use serenity::model::gateway::Ready;
use serenity::prelude::EventHandler;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct Handler {
    pub manager: Arc<CommandManager<AppState>>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        let Interaction::Command(command) = interaction else {
            return;
        };
        let Some(app_state) = AppState::from_ctx(&ctx).await else {
            error!(target: "dispatch", "AppState missing from TypeMap");
            return;
        };
        let invocation = invocation_from(&command);
        let responder: Arc<dyn Responder> =
            Arc::new(InteractionResponder::new(Arc::clone(&ctx.http), command));
        let manager = Arc::clone(&self.manager);
        supervise(async move { manager.dispatch(app_state, invocation, responder).await }).await;
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("{} is connected!", ready.user.name);
        let Some(app_state) = AppState::from_ctx(&ctx).await else {
            error!(target: "dispatch", "AppState missing from TypeMap");
            return;
        };

        let commands = self.manager.published_commands();
        let count = commands.len();
        let published = match app_state.config.guild_id {
            Some(guild_id) => guild_id.set_commands(&ctx.http, commands).await,
            None => Command::set_global_commands(&ctx.http, commands).await,
        };
        match published {
            Ok(_) => info!(count, guild = ?app_state.config.guild_id, "Published slash commands"),
            Err(e) => error!(error = ?e, "Failed to publish slash commands"),
        }

        if let Some(channel) = app_state.config.status_channel {
            let notice = format!("🟢 **{}** is online.", app_state.config.project_name);
            if let Err(e) = channel.say(&ctx.http, notice).await {
                warn!(error = ?e, %channel, "Failed to post status notice");
            }
        }
    }
}

/// Runs one dispatch on its own task so nothing escaping the pipeline can take the event loop
/// down, and logs the outcome.
pub async fn supervise<F>(dispatch: F) -> Option<Dispatch>
where
    F: Future<Output = Dispatch> + Send + 'static,
{
    match tokio::spawn(dispatch).await {
        Ok(outcome) => {
            debug!(target: "dispatch", ?outcome, end = ?outcome.end(), "invocation finished");
            Some(outcome)
        }
        Err(e) => {
            error!(target: "dispatch", error = %e, "invocation task aborted");
            None
        }
    }
}
