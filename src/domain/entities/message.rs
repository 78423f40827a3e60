use super::User;
use chrono::{DateTime, Utc};

/// Message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Empty,
}

impl Content {
    pub fn text(&self) -> Option<&str> {
        match self {
            Content::Text(s) => Some(s),
            Content::Empty => None,
        }
    }
}

/// Represents an incoming message on any platform
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub sender: Option<User>,
    pub content: Content,
    pub timestamp: DateTime<Utc>,
    pub platform: String,
}

impl Message {
    pub fn new(chat_id: impl Into<String>, content: Content) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat_id.into(),
            sender: None,
            content,
            timestamp: Utc::now(),
            platform: "unknown".to_string(),
        }
    }

    pub fn from_text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let content = if text.is_empty() {
            Content::Empty
        } else {
            Content::Text(text)
        };
        Self::new(chat_id, content)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_sender(mut self, user: User) -> Self {
        self.sender = Some(user);
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether the sender is the given account or any other bot
    pub fn is_from_bot(&self, bot_id: &str) -> bool {
        self.sender
            .as_ref()
            .map(|u| u.is_bot || u.id == bot_id)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_becomes_empty_content() {
        let msg = Message::from_text("chan", "");
        assert_eq!(msg.content, Content::Empty);
        assert_eq!(msg.content.text(), None);
    }

    #[test]
    fn test_is_from_bot() {
        let own = Message::from_text("chan", "hi").with_sender(User::new("42"));
        assert!(own.is_from_bot("42"));

        let other_bot = Message::from_text("chan", "hi").with_sender(User::new("7").as_bot());
        assert!(other_bot.is_from_bot("42"));

        let human = Message::from_text("chan", "hi").with_sender(User::new("7"));
        assert!(!human.is_from_bot("42"));

        let anonymous = Message::from_text("chan", "hi");
        assert!(!anonymous.is_from_bot("42"));
    }
}
