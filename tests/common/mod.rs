#![allow(dead_code)]

use async_trait::async_trait;
use hashi::dispatch::{DeliveredMessage, ReplyMessage, Responder};
use std::sync::Mutex;

/// Captures every reply instead of talking to Discord.
#[derive(Default)]
pub struct RecordingResponder {
    pub replies: Mutex<Vec<ReplyMessage>>,
    pub edits: Mutex<Vec<ReplyMessage>>,
}

impl RecordingResponder {
    pub fn replies(&self) -> Vec<ReplyMessage> {
        self.replies.lock().unwrap().clone()
    }

    pub fn last_reply(&self) -> Option<ReplyMessage> {
        self.replies.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn reply(&self, message: ReplyMessage) -> Option<DeliveredMessage> {
        let mut replies = self.replies.lock().unwrap();
        replies.push(message);
        Some(DeliveredMessage {
            id: Some(format!("m{}", replies.len())),
        })
    }

    async fn edit_reply(&self, message: ReplyMessage) -> Option<DeliveredMessage> {
        self.edits.lock().unwrap().push(message);
        Some(DeliveredMessage { id: None })
    }
}

/// A responder whose deliveries always fail.
pub struct DeadResponder;

#[async_trait]
impl Responder for DeadResponder {
    async fn reply(&self, _message: ReplyMessage) -> Option<DeliveredMessage> {
        None
    }

    async fn edit_reply(&self, _message: ReplyMessage) -> Option<DeliveredMessage> {
        None
    }
}
