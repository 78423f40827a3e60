//! Display document posted back into a channel
//!
//! Field names follow the Discord embed object, so an `Embed` serializes
//! straight into the `embeds` array of a create-message request.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub url: String,
    pub author: EmbedAuthor,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl EmbedField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

impl Embed {
    /// Plain-text rendering used by the console adapter
    pub fn to_plain_text(&self) -> String {
        let mut out = format!("{} <{}>\n", self.title, self.url);
        out.push_str(&format!("  by {}\n", self.author.name));
        for field in &self.fields {
            out.push_str(&format!("  [{}]\n", field.name));
            for line in field.value.lines() {
                out.push_str(&format!("    {}\n", line));
            }
        }
        out.push_str(&format!("  -- {}", self.footer.text));
        out
    }
}
