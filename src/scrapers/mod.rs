//! Site-specific extractors

mod crous;

pub use crous::CrousExtractor;
