//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;
use crate::application::messaging::{DomainExtractor, DEFAULT_SUFFIXES};
use crate::application::services::{EmbedRenderer, Locale, DEFAULT_COLOR, DEFAULT_FOOTER};

/// Environment variable holding the Discord bot token
pub const TOKEN_ENV: &str = "DISCORD_BOT_TOKEN";

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub whois: WhoisConfig,
    pub extractor: ExtractorConfig,
    pub render: RenderConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WhoisConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtractorConfig {
    pub suffixes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RenderConfig {
    pub locale: Locale,
    pub color: u32,
    pub footer: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AdaptersConfig {
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiscordConfig {
    /// Usually left empty and supplied through `DISCORD_BOT_TOKEN`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "whoisbot".to_string(),
        }
    }
}

impl Default for WhoisConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.whoisproxy.info".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            locale: Locale::default(),
            color: DEFAULT_COLOR,
            footer: DEFAULT_FOOTER.to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Defaults with environment overrides applied
    pub fn load_env() -> Result<Self, ConfigError> {
        Config::default().apply_env()
    }

    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key-value source
    pub fn apply_overrides<F>(mut self, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = var(TOKEN_ENV).filter(|t| !t.trim().is_empty()) {
            self.adapters.discord.token = Some(token.trim().to_string());
        }

        if let Some(url) = var("WHOIS_BASE_URL") {
            self.whois.base_url = url;
        }

        if let Some(secs) = var("WHOIS_TIMEOUT_SECS") {
            self.whois.timeout_secs = secs
                .parse()
                .map_err(|_| ConfigError::InvalidValue(format!("WHOIS_TIMEOUT_SECS={}", secs)))?;
        }

        if let Some(locale) = var("WHOISBOT_LOCALE") {
            self.render.locale = locale.parse().map_err(ConfigError::InvalidValue)?;
        }

        Ok(self)
    }

    /// The Discord bot token, required to connect
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.adapters
            .discord
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingField(TOKEN_ENV.to_string()))
    }

    /// Per-request WHOIS timeout; zero would fail every lookup
    pub fn whois_timeout(&self) -> Result<Duration, ConfigError> {
        match self.whois.timeout_secs {
            0 => Err(ConfigError::InvalidValue("whois.timeout-secs must be at least 1".to_string())),
            secs => Ok(Duration::from_secs(secs)),
        }
    }

    pub fn extractor(&self) -> Result<DomainExtractor, ConfigError> {
        DomainExtractor::new(&self.extractor.suffixes)
    }

    pub fn renderer(&self) -> EmbedRenderer {
        EmbedRenderer::new(self.render.locale, self.render.color, self.render.footer.clone())
    }
}
