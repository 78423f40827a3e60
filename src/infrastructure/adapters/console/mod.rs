//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::sync::mpsc;
use crate::domain::entities::Embed;
use crate::domain::traits::{Bot, BotInfo};
use crate::application::errors::BotError;

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    sender: Option<mpsc::Sender<String>>,
}

impl ConsoleAdapter {
    pub fn new() -> Self {
        Self {
            info: BotInfo {
                id: "console".to_string(),
                name: "whoisbot".to_string(),
                username: "whoisbot".to_string(),
                avatar_url: None,
            },
            sender: None,
        }
    }

    /// Forward rendered output to a channel instead of stdout
    #[cfg(test)]
    pub fn with_sender(mut self, sender: mpsc::Sender<String>) -> Self {
        self.sender = Some(sender);
        self
    }
}

impl Default for ConsoleAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Bot for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn send_embed(&self, _chat_id: &str, embed: &Embed) -> Result<String, BotError> {
        let text = embed.to_plain_text();
        match &self.sender {
            Some(sender) => sender
                .send(text)
                .await
                .map_err(|e| BotError::Internal(e.to_string()))?,
            None => println!("[BOT] {}", text),
        }
        Ok("console_msg".to_string())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::EmbedRenderer;
    use crate::domain::entities::WhoisResults;

    #[tokio::test]
    async fn test_send_embed_forwards_plain_text() {
        let (tx, mut rx) = mpsc::channel(4);
        let bot = ConsoleAdapter::new().with_sender(tx);
        let embed = EmbedRenderer::default().render("example.com", &WhoisResults::default(), &bot.bot_info());

        let id = bot.send_embed("console", &embed).await.unwrap();

        assert_eq!(id, "console_msg");
        let text = rx.recv().await.unwrap();
        assert!(text.starts_with("example.com <http://example.com>"));
        assert!(text.contains("未登録"));
    }

    #[tokio::test]
    async fn test_closed_channel_is_an_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let bot = ConsoleAdapter::new().with_sender(tx);
        let embed = EmbedRenderer::default().render("example.com", &WhoisResults::default(), &bot.bot_info());

        assert!(bot.send_embed("console", &embed).await.is_err());
    }
}
