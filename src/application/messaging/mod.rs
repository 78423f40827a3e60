//! Message handling - Turning message text into lookup candidates

pub mod extractor;
pub mod normalize;

pub use extractor::{DomainExtractor, DEFAULT_SUFFIXES};
