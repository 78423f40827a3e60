//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (User, Message, Embed, WhoisResponse)
//! - Traits: Abstractions for infrastructure (Bot, WhoisLookup)

pub mod entities;
pub mod traits;
