//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Whois: WHOIS proxy HTTP client
//! - Adapters: Platform integrations (Discord, console)

pub mod config;
pub mod whois;
pub mod adapters;
