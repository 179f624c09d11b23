//! Serenity-backed reply primitive for slash command interactions.
use crate::dispatch::{DeliveredMessage, ReplyMessage, Responder};
use async_trait::async_trait;
use serenity::builder::{
    CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, EditInteractionResponse,
};
use serenity::http::Http;
use serenity::model::application::CommandInteraction;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Replies to one command interaction. The first reply creates the interaction response; later
/// replies (or a reply after the response was created elsewhere) are sent as follow-ups.
pub struct InteractionResponder {
    http: Arc<Http>,
    interaction: CommandInteraction,
    acknowledged: AtomicBool,
}

impl InteractionResponder {
    pub fn new(http: Arc<Http>, interaction: CommandInteraction) -> Self {
        Self {
            http,
            interaction,
            acknowledged: AtomicBool::new(false),
        }
    }

    async fn follow_up(&self, message: &ReplyMessage) -> Option<DeliveredMessage> {
        let builder = CreateInteractionResponseFollowup::new()
            .content(message.content.as_str())
            .ephemeral(message.ephemeral);
        match self.interaction.create_followup(&self.http, builder).await {
            Ok(sent) => Some(DeliveredMessage {
                id: Some(sent.id.to_string()),
            }),
            Err(e) => {
                tracing::error!(target: "interactions.reply", iid = %self.interaction.id, error = ?e, "create_followup failed");
                None
            }
        }
    }
}

#[async_trait]
impl Responder for InteractionResponder {
    async fn reply(&self, message: ReplyMessage) -> Option<DeliveredMessage> {
        if self.acknowledged.swap(true, Ordering::SeqCst) {
            return self.follow_up(&message).await;
        }
        let builder = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(message.content.as_str())
                .ephemeral(message.ephemeral),
        );
        if let Err(e) = self.interaction.create_response(&self.http, builder).await {
            tracing::debug!(target: "interactions.reply", iid = %self.interaction.id, error = ?e, "create_response failed (already acknowledged?)");
            return self.follow_up(&message).await;
        }
        let id = match self.interaction.get_response(&self.http).await {
            Ok(sent) => Some(sent.id.to_string()),
            Err(e) => {
                tracing::debug!(target: "interactions.reply", iid = %self.interaction.id, error = ?e, "get_response failed");
                None
            }
        };
        Some(DeliveredMessage { id })
    }

    async fn edit_reply(&self, message: ReplyMessage) -> Option<DeliveredMessage> {
        let builder = EditInteractionResponse::new().content(message.content.as_str());
        match self.interaction.edit_response(&self.http, builder).await {
            Ok(sent) => Some(DeliveredMessage {
                id: Some(sent.id.to_string()),
            }),
            Err(e) => {
                tracing::error!(target: "interactions.edit", iid = %self.interaction.id, error = ?e, "edit_response failed");
                None
            }
        }
    }
}
