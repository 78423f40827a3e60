use crate::application::messaging::{normalize, DomainExtractor};
use crate::application::services::EmbedRenderer;
use crate::domain::entities::Message;
use crate::domain::traits::{Bot, WhoisLookup};

/// Service for processing messages: extract, look up, render, send
pub struct MessageService<L: WhoisLookup> {
    extractor: DomainExtractor,
    renderer: EmbedRenderer,
    lookup: L,
}

impl<L: WhoisLookup> MessageService<L> {
    pub fn new(extractor: DomainExtractor, renderer: EmbedRenderer, lookup: L) -> Self {
        Self {
            extractor,
            renderer,
            lookup,
        }
    }

    /// Process an incoming message, returning how many embeds were sent.
    ///
    /// Candidates are handled one after another. Any failure skips only the
    /// candidate it happened on and nothing is reported back to the channel.
    pub async fn process<B: Bot + ?Sized>(&self, bot: &B, message: &Message) -> usize {
        let info = bot.bot_info();
        if message.is_from_bot(&info.id) {
            return 0;
        }

        let Some(text) = message.content.text() else {
            return 0;
        };

        let candidates = self.extractor.extract(text);
        if candidates.is_empty() {
            return 0;
        }

        let sender = message.sender.as_ref().map(|u| u.to_string()).unwrap_or_default();
        tracing::debug!(
            "[{}] {} message {} from {} at {}: {:?}",
            message.chat_id, message.platform, message.id, sender, message.timestamp, candidates
        );

        let mut sent = 0;
        for candidate in candidates {
            let ascii = match normalize::to_ascii(candidate) {
                Ok(ascii) => ascii,
                Err(e) => {
                    tracing::warn!("[{}] Skipping candidate: {}", message.chat_id, e);
                    continue;
                }
            };

            let response = match self.lookup.lookup(&ascii).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::warn!("[{}] Lookup for {} failed: {}", message.chat_id, ascii, e);
                    continue;
                }
            };

            if !response.is_success() {
                tracing::debug!("[{}] Provider returned code {} for {}", message.chat_id, response.code, ascii);
                continue;
            }

            let embed = self.renderer.render(candidate, &response.results, &info);
            match bot.send_embed(&message.chat_id, &embed).await {
                Ok(id) => {
                    tracing::debug!("[{}] Sent whois for {} as message {}", message.chat_id, ascii, id);
                    sent += 1;
                }
                Err(e) => {
                    tracing::error!("[{}] Failed to send whois for {}: {}", message.chat_id, ascii, e);
                }
            }
        }

        sent
    }
}
