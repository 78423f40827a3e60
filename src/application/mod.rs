//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: Lookup orchestration and embed rendering
//! - Errors: Domain-specific errors
//! - Messaging: Domain extraction and normalization

pub mod errors;
pub mod services;
pub mod messaging;
