//! Application services - Business logic orchestration

pub mod in_flight;
pub mod message_service;
pub mod render_service;

pub use in_flight::InFlight;
pub use message_service::MessageService;
pub use render_service::{EmbedRenderer, Locale, DEFAULT_COLOR, DEFAULT_FOOTER};
