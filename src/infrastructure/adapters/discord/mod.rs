//! Discord adapter

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{Embed, Message, User};
use crate::domain::traits::{Bot, BotInfo};
use crate::application::errors::BotError;

pub mod gateway;

pub use gateway::{Gateway, GatewayEvent, Session, GATEWAY_URL, INTENTS};

/// Discord REST API base URL
const API_BASE: &str = "https://discord.com/api/v10";

/// Discord CDN base URL
const CDN_BASE: &str = "https://cdn.discordapp.com";

/// Discord user object (the fields we use)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordUser {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl DiscordUser {
    /// Avatar URL, falling back to the default avatar for users without one
    pub fn avatar_url(&self) -> String {
        match &self.avatar {
            Some(hash) => format!("{}/avatars/{}/{}.png", CDN_BASE, self.id, hash),
            None => {
                let index = self.id.parse::<u64>().map(|id| (id >> 22) % 6).unwrap_or(0);
                format!("{}/embed/avatars/{}.png", CDN_BASE, index)
            }
        }
    }

    pub fn to_bot_info(&self) -> BotInfo {
        BotInfo {
            id: self.id.clone(),
            name: self.global_name.clone().unwrap_or_else(|| self.username.clone()),
            username: self.username.clone(),
            avatar_url: Some(self.avatar_url()),
        }
    }

    pub fn to_user(&self) -> User {
        let user = User::new(&self.id)
            .with_username(&self.username);
        if self.bot {
            user.as_bot()
        } else {
            user
        }
    }
}

/// Discord message object (the fields we use)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscordMessage {
    pub id: String,
    pub channel_id: String,
    pub author: DiscordUser,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl DiscordMessage {
    pub fn into_message(self) -> Message {
        let sender = self.author.to_user();
        let message = Message::from_text(self.channel_id, self.content)
            .with_id(self.id)
            .with_sender(sender)
            .with_platform("discord");
        match self.timestamp {
            Some(ts) => message.with_timestamp(ts),
            None => message,
        }
    }
}

/// Discord bot adapter
pub struct DiscordAdapter {
    token: String,
    client: Client,
    info: BotInfo,
    api_base: String,
}

impl DiscordAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "whoisbot".to_string(),
                username: "whoisbot".to_string(),
                avatar_url: None,
            },
            api_base: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the API URL for a path
    fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }

    /// Fetch the bot's own account from Discord API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        let url = self.api_url("users/@me");
        let response = self.client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                return Err(BotError::Auth("Discord rejected the bot token".to_string()));
            }
            status if !status.is_success() => {
                return Err(BotError::Network(format!("Discord API error: {}", status)));
            }
            _ => {}
        }

        let user: DiscordUser = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        self.info = user.to_bot_info();
        Ok(())
    }

    /// Create a message carrying a single embed
    pub async fn create_message(&self, channel_id: &str, embed: &Embed) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct CreateMessageRequest<'a> {
            embeds: [&'a Embed; 1],
        }

        #[derive(Deserialize)]
        struct MessageResult {
            id: String,
        }

        let url = self.api_url(&format!("channels/{}/messages", channel_id));
        let request = CreateMessageRequest { embeds: [embed] };

        let response = self.client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            return Err(BotError::Network(format!("Discord API error: {} {}", status, error)));
        }

        let data: MessageResult = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.id)
    }
}

#[async_trait]
impl Bot for DiscordAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting Discord bot as {} ({})", self.info.username, self.info.id);
        Ok(())
    }

    async fn send_embed(&self, chat_id: &str, embed: &Embed) -> Result<String, BotError> {
        tracing::debug!("Sending embed to {}: {}", chat_id, embed.title);
        self.create_message(chat_id, embed).await
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{EmbedAuthor, EmbedField, EmbedFooter};

    fn embed() -> Embed {
        Embed {
            title: "example.com".to_string(),
            url: "http://example.com".to_string(),
            author: EmbedAuthor {
                name: "whoisbot".to_string(),
                icon_url: None,
            },
            color: 0x00bfff,
            fields: vec![EmbedField::new("登録状況", "未登録")],
            footer: EmbedFooter {
                text: "https://whoisproxy.info より".to_string(),
            },
        }
    }

    #[test]
    fn test_avatar_url() {
        let mut user: DiscordUser =
            serde_json::from_str(r#"{"id":"80351110224678912","username":"nelly","avatar":"8342729096ea3675442027381ff50dfe"}"#)
                .unwrap();
        assert_eq!(
            user.avatar_url(),
            "https://cdn.discordapp.com/avatars/80351110224678912/8342729096ea3675442027381ff50dfe.png"
        );

        user.avatar = None;
        let index = (80351110224678912u64 >> 22) % 6;
        assert_eq!(user.avatar_url(), format!("https://cdn.discordapp.com/embed/avatars/{}.png", index));
    }

    #[test]
    fn test_message_conversion() {
        let raw: DiscordMessage = serde_json::from_str(
            r#"{
                "id": "111",
                "channel_id": "222",
                "author": {"id": "333", "username": "alice", "avatar": null, "bot": false},
                "content": "example.com",
                "timestamp": "2024-05-01T12:00:00.000000+00:00"
            }"#,
        )
        .unwrap();

        let message = raw.into_message();
        assert_eq!(message.id, "111");
        assert_eq!(message.chat_id, "222");
        assert_eq!(message.platform, "discord");
        assert_eq!(message.content.text(), Some("example.com"));
        let sender = message.sender.unwrap();
        assert_eq!(sender.id, "333");
        assert!(!sender.is_bot);
        assert_eq!(message.timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn test_fetch_bot_info() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/@me")
            .match_header("authorization", "Bot test-token")
            .with_status(200)
            .with_body(r#"{"id":"42","username":"whoisbot","global_name":"WHOIS Bot","avatar":"abc","bot":true}"#)
            .create_async()
            .await;

        let mut adapter = DiscordAdapter::new("test-token").with_api_base(server.url());
        adapter.fetch_bot_info().await.unwrap();

        mock.assert_async().await;
        let info = adapter.bot_info();
        assert_eq!(info.id, "42");
        assert_eq!(info.name, "WHOIS Bot");
        assert_eq!(info.username, "whoisbot");
        assert_eq!(info.avatar_url.as_deref(), Some("https://cdn.discordapp.com/avatars/42/abc.png"));
    }

    #[tokio::test]
    async fn test_fetch_bot_info_bad_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/@me")
            .with_status(401)
            .with_body(r#"{"message":"401: Unauthorized","code":0}"#)
            .create_async()
            .await;

        let mut adapter = DiscordAdapter::new("bad").with_api_base(server.url());
        assert!(matches!(adapter.fetch_bot_info().await, Err(BotError::Auth(_))));
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_does_not_log_token() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let adapter = DiscordAdapter::new("MTIzNDU2Nzg5.secret-part");
        adapter.start().await.unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Starting Discord bot"));
        assert!(!output.contains("MTIzNDU2"));
        assert!(!output.contains("secret"));
    }

    #[tokio::test]
    async fn test_send_embed_posts_to_channel() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/channels/222/messages")
            .match_header("authorization", "Bot test-token")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "embeds": [{
                    "title": "example.com",
                    "url": "http://example.com",
                    "color": 0x00bfff,
                    "fields": [{"name": "登録状況", "value": "未登録", "inline": false}]
                }]
            })))
            .with_status(200)
            .with_body(r#"{"id":"999","channel_id":"222"}"#)
            .create_async()
            .await;

        let adapter = DiscordAdapter::new("test-token").with_api_base(server.url());
        let id = adapter.send_embed("222", &embed()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(id, "999");
    }

    #[tokio::test]
    async fn test_send_embed_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/channels/222/messages")
            .with_status(403)
            .with_body(r#"{"message":"Missing Permissions","code":50013}"#)
            .create_async()
            .await;

        let adapter = DiscordAdapter::new("test-token").with_api_base(server.url());
        let err = adapter.send_embed("222", &embed()).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
