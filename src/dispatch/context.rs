//! The per-invocation context handed to command handlers, and the reply primitive it talks to.
use crate::dispatch::descriptor::CommandMetadata;
use crate::dispatch::pipeline::CommandEnd;
use crate::dispatch::privileges::Identity;
use crate::services::flow::{FlowControl, InterferenceSlot};
use crate::services::interfering::InvocationHandle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// One inbound request to run a command, as delivered by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    pub interaction_id: String,
    /// Platform id of the invoked application command.
    pub command_id: Option<String>,
    pub command_name: String,
    pub subcommand_group: Option<String>,
    pub subcommand: Option<String>,
    pub user_id: String,
    pub guild_id: Option<String>,
    pub channel_id: Option<String>,
    pub roles: Vec<String>,
}

impl Invocation {
    pub fn new(command_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            command_name: command_name.into(),
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn interaction_id(mut self, id: impl Into<String>) -> Self {
        self.interaction_id = id.into();
        self
    }

    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.subcommand_group = Some(name.into());
        self
    }

    pub fn sub(mut self, name: impl Into<String>) -> Self {
        self.subcommand = Some(name.into());
        self
    }

    pub fn guild(mut self, id: impl Into<String>) -> Self {
        self.guild_id = Some(id.into());
        self
    }

    pub fn channel(mut self, id: impl Into<String>) -> Self {
        self.channel_id = Some(id.into());
        self
    }

    pub fn roles<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.roles = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn identity(&self) -> Identity<'_> {
        Identity {
            user_id: &self.user_id,
            guild_id: self.guild_id.as_deref(),
            channel_id: self.channel_id.as_deref(),
            roles: &self.roles,
        }
    }

    pub fn handle(&self) -> InvocationHandle {
        InvocationHandle {
            interaction_id: self.interaction_id.clone(),
            command_id: self.command_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyMessage {
    pub content: String,
    pub ephemeral: bool,
}

impl ReplyMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.ephemeral = true;
        self
    }
}

impl From<&str> for ReplyMessage {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl From<String> for ReplyMessage {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

/// Handle of a message the platform accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveredMessage {
    /// Message id, when the platform returned the message.
    pub id: Option<String>,
}

/// Sends responses keyed to the originating invocation. Ordinary delivery failures yield `None`.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn reply(&self, message: ReplyMessage) -> Option<DeliveredMessage>;
    async fn edit_reply(&self, message: ReplyMessage) -> Option<DeliveredMessage>;
}

/// Mutable state of a single invocation. Never shared between invocations.
pub struct Context<S> {
    pub state: Arc<S>,
    pub invocation: Invocation,
    pub metadata: CommandMetadata,
    /// Clock reading taken when the invocation entered the pipeline.
    pub issued_at: DateTime<Utc>,
    pub errors: Vec<anyhow::Error>,
    /// The last message delivered through [`Context::reply`] or [`Context::edit_reply`].
    pub reply_data: Option<DeliveredMessage>,
    responder: Arc<dyn Responder>,
    flow: Arc<FlowControl>,
    slot: Option<InterferenceSlot>,
}

impl<S> Context<S> {
    pub(crate) fn new(
        state: Arc<S>,
        invocation: Invocation,
        metadata: CommandMetadata,
        issued_at: DateTime<Utc>,
        responder: Arc<dyn Responder>,
        flow: Arc<FlowControl>,
    ) -> Self {
        Self {
            state,
            invocation,
            metadata,
            issued_at,
            errors: Vec::new(),
            reply_data: None,
            responder,
            flow,
            slot: None,
        }
    }

    pub(crate) fn attach_slot(&mut self, slot: InterferenceSlot) {
        self.slot = Some(slot);
    }

    pub fn user_id(&self) -> &str {
        &self.invocation.user_id
    }

    /// Read access to the shared ledgers, e.g. for display.
    pub fn flow(&self) -> &FlowControl {
        &self.flow
    }

    pub async fn reply(&mut self, message: impl Into<ReplyMessage>) -> Option<DeliveredMessage> {
        let delivered = self.responder.reply(message.into()).await?;
        self.reply_data = Some(delivered.clone());
        Some(delivered)
    }

    pub async fn edit_reply(&mut self, message: impl Into<ReplyMessage>) -> Option<DeliveredMessage> {
        let delivered = self.responder.edit_reply(message.into()).await?;
        self.reply_data = Some(delivered.clone());
        Some(delivered)
    }

    /// Marks the invocation as issued: it completes, but reports [`CommandEnd::Issued`].
    pub fn record_error(&mut self, error: impl Into<anyhow::Error>) {
        self.errors.push(error.into());
    }

    /// Completion signal. The first call releases the in-flight entry; every call reports
    /// `Success` when no error was recorded, `Issued` otherwise.
    pub fn end(&mut self) -> CommandEnd {
        if let Some(slot) = self.slot.take() {
            slot.release();
        }
        if self.errors.is_empty() {
            CommandEnd::Success
        } else {
            CommandEnd::Issued
        }
    }
}
