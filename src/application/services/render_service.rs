//! Embed rendering for lookup results

use serde::{Deserialize, Serialize};
use crate::domain::entities::{Embed, EmbedAuthor, EmbedField, EmbedFooter, WhoisResults};
use crate::domain::traits::BotInfo;

/// Default accent colour (deep sky blue)
pub const DEFAULT_COLOR: u32 = 0x00bfff;

/// Default footer crediting the provider
pub const DEFAULT_FOOTER: &str = "https://whoisproxy.info より";

/// Language of the field labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ja" => Ok(Locale::Ja),
            "en" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {}", other)),
        }
    }
}

/// Field labels and fixed values shown in an embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    pub status: &'static str,
    pub registrant: &'static str,
    pub dates: &'static str,
    pub name_servers: &'static str,
    pub registered: &'static str,
    pub not_registered: &'static str,
    pub no_information: &'static str,
}

impl Labels {
    pub fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::Ja => Self {
                status: "登録状況",
                registrant: "登録者",
                dates: "日付",
                name_servers: "ネームサーバー",
                registered: "登録済み",
                not_registered: "未登録",
                no_information: "情報なし",
            },
            Locale::En => Self {
                status: "Status",
                registrant: "Registrant",
                dates: "Dates",
                name_servers: "Name servers",
                registered: "Registered",
                not_registered: "Not registered",
                no_information: "No information",
            },
        }
    }
}

/// Builds the display document for one looked-up domain
#[derive(Debug, Clone)]
pub struct EmbedRenderer {
    labels: Labels,
    color: u32,
    footer: String,
}

impl EmbedRenderer {
    pub fn new(locale: Locale, color: u32, footer: impl Into<String>) -> Self {
        Self {
            labels: Labels::for_locale(locale),
            color,
            footer: footer.into(),
        }
    }

    /// Render `results` for the domain exactly as the user wrote it
    pub fn render(&self, domain: &str, results: &WhoisResults, bot: &BotInfo) -> Embed {
        let fields = if results.registered {
            let detail = &results.detail;
            vec![
                EmbedField::new(self.labels.status, self.labels.registered),
                EmbedField::new(self.labels.registrant, self.join_or_placeholder(&detail.registrant)),
                EmbedField::new(self.labels.dates, self.join_or_placeholder(&detail.date)),
                EmbedField::new(self.labels.name_servers, self.join_or_placeholder(&detail.name_server)),
            ]
        } else {
            vec![EmbedField::new(self.labels.status, self.labels.not_registered)]
        };

        Embed {
            title: domain.to_string(),
            url: format!("http://{}", domain),
            author: EmbedAuthor {
                name: bot.username.clone(),
                icon_url: bot.avatar_url.clone(),
            },
            color: self.color,
            fields,
            footer: EmbedFooter {
                text: self.footer.clone(),
            },
        }
    }

    fn join_or_placeholder(&self, lines: &[String]) -> String {
        if lines.is_empty() {
            self.labels.no_information.to_string()
        } else {
            lines.join("\n")
        }
    }
}

impl Default for EmbedRenderer {
    fn default() -> Self {
        Self::new(Locale::default(), DEFAULT_COLOR, DEFAULT_FOOTER)
    }
}
