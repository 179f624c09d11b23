//! Replies sent when a gate refuses an invocation.
//!
//! Hosts override any subset of the three slots by implementing [`FlowCallbacks`]; unimplemented
//! slots keep the canned ephemeral reply.
use crate::constants::{COOL_DOWN_REPLY, INTERFERING_REPLY, PRIVILEGES_DENIED_REPLY};
use crate::dispatch::context::{Context, ReplyMessage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait FlowCallbacks<S: Send + Sync + 'static>: Send + Sync {
    async fn privileges_denied(&self, ctx: &mut Context<S>, error_code: &str) {
        let content =
            format!("{PRIVILEGES_DENIED_REPLY} (privileges error code: **`{error_code}`**)");
        ctx.reply(ReplyMessage::new(content).ephemeral()).await;
    }

    async fn cooling_down(&self, ctx: &mut Context<S>, expires_at: DateTime<Utc>) {
        let remaining = (expires_at - ctx.issued_at).num_milliseconds().max(0) as f64 / 1000.0;
        let content = format!("{COOL_DOWN_REPLY} Please wait **`{remaining:.1}`**s.");
        ctx.reply(ReplyMessage::new(content).ephemeral()).await;
    }

    /// `colliding` holds one rendered mention per in-flight command.
    async fn interfering(&self, ctx: &mut Context<S>, colliding: &[String]) {
        let content = format!("{INTERFERING_REPLY}\n{}", colliding.join("\n"));
        ctx.reply(ReplyMessage::new(content).ephemeral()).await;
    }
}

/// The canned replies.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFlowCallbacks;

impl<S: Send + Sync + 'static> FlowCallbacks<S> for DefaultFlowCallbacks {}
