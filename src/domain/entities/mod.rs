//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod embed;
pub mod whois;

pub use user::User;
pub use message::Message;
pub use embed::{Embed, EmbedAuthor, EmbedField, EmbedFooter};
pub use whois::{WhoisResponse, WhoisResults};
