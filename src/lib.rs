//! Watches the CROUS housing search for newly available accommodations and emails
//! subscribers about them.

pub mod collector;
pub mod config;
pub mod crous_finder;
pub mod email;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod novelty;
pub mod scrapers;
pub mod traits;
pub mod verifier;

#[cfg(test)]
mod test_support;

pub use crous_finder::{CrousFinder, CycleState};
