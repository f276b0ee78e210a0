use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use feedback_worker::clients::webhook::Notifier;

/// Card captured by the recording notifier.
#[derive(Debug, Clone)]
pub struct SentCard {
    pub webhook_url: String,
    pub title: String,
    pub body: String,
}

/// Notifier that records cards instead of posting them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    cards: Mutex<Vec<SentCard>>,
}

impl RecordingNotifier {
    pub fn cards(&self) -> Vec<SentCard> {
        self.cards.lock().expect("cards lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_card(&self, webhook_url: &str, title: &str, body: &str) -> Result<()> {
        self.cards.lock().expect("cards lock").push(SentCard {
            webhook_url: webhook_url.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}
