//! Domain extractor - Finds domain-like tokens in free text

use regex_lite::Regex;
use crate::application::errors::ConfigError;

/// Top-level suffixes recognised out of the box
pub const DEFAULT_SUFFIXES: &[&str] = &[
    "com", "net", "org", "jp", "dev", "info", "xyz", "tokyo", "me", "link",
    "club", "click", "space", "cc", "in", "tv", "style", "work",
];

/// Extracts candidate domains from message text.
///
/// A candidate is the longest prefix of a whitespace-delimited token that
/// contains a dot and ends in one of the configured suffixes followed by a
/// word boundary. Each token yields at most one candidate, so results are
/// non-overlapping and in order of appearance.
#[derive(Debug, Clone)]
pub struct DomainExtractor {
    pattern: Regex,
    suffixes: Vec<String>,
}

impl DomainExtractor {
    pub fn new<S: AsRef<str>>(suffixes: &[S]) -> Result<Self, ConfigError> {
        let suffixes = suffixes
            .iter()
            .map(|s| {
                let s = s.as_ref().trim().trim_start_matches('.').to_lowercase();
                if s.is_empty() {
                    Err(ConfigError::InvalidValue("empty domain suffix".to_string()))
                } else {
                    Ok(s)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if suffixes.is_empty() {
            return Err(ConfigError::MissingField("extractor.suffixes".to_string()));
        }

        let alternation = suffixes
            .iter()
            .map(|s| regex_lite::escape(s))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)^.+\.(?:{})\b", alternation))
            .map_err(|e| ConfigError::InvalidValue(format!("suffix pattern: {}", e)))?;

        Ok(Self { pattern, suffixes })
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Return every candidate domain in `text`, left to right
    pub fn extract<'a>(&self, text: &'a str) -> Vec<&'a str> {
        text.split_whitespace()
            .filter_map(|token| self.pattern.find(token).map(|m| m.as_str()))
            .collect()
    }
}
