use async_trait::async_trait;
use crate::domain::entities::Embed;
use crate::application::errors::BotError;

/// Bot trait - abstraction for messaging platform adapters
#[async_trait]
pub trait Bot: Send + Sync {
    /// Start the bot and begin listening for messages
    async fn start(&self) -> Result<(), BotError>;

    /// Send an embed to a channel, returning the platform message id
    async fn send_embed(&self, chat_id: &str, embed: &Embed) -> Result<String, BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
    pub avatar_url: Option<String>,
}
