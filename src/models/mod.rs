//! Data models for accommodation listings and polling cycles

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const NO_NAME: &str = "No name";
pub const NO_PRICE: &str = "No price";
pub const NO_LOCATION: &str = "No location";
pub const NO_SURFACE_AREA: &str = "No surface area";

/// Identifier-keyed set of accommodations, rebuilt every cycle.
pub type Catalog = HashMap<String, Accommodation>;

/// An accommodation listing scraped from a catalog page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accommodation {
    pub id: String,
    pub name: String,
    pub price: String,
    pub location: String,
    pub link: String,
    /// Only filled in once the detail page confirmed availability.
    pub surface_area: Option<String>,
}

impl Accommodation {
    /// Builds a record from an extracted card, resolving its link against `base_url`.
    pub fn from_summary(summary: ListingSummary, base_url: &str) -> Self {
        let link = if summary.relative_link.starts_with("http") {
            summary.relative_link
        } else {
            format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                summary.relative_link.trim_start_matches('/')
            )
        };

        Self {
            id: summary.id,
            name: summary.name,
            price: summary.price,
            location: summary.location,
            link,
            surface_area: None,
        }
    }

    #[must_use]
    pub fn with_surface_area(mut self, surface_area: Option<String>) -> Self {
        self.surface_area = Some(surface_area.unwrap_or_else(|| NO_SURFACE_AREA.to_string()));
        self
    }
}

/// Raw card data as found on a catalog page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSummary {
    pub id: String,
    pub name: String,
    pub price: String,
    pub location: String,
    pub relative_link: String,
}

/// Status and body of a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub status: u16,
    pub body: String,
}

impl FetchedDocument {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// What happened to the notification step of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotifyOutcome {
    /// Nothing novel, the notifier was not called.
    Skipped,
    Sent,
    Failed,
}

/// Summary of one polling cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub catalog_size: usize,
    pub available_size: usize,
    pub novel: Catalog,
    pub notified: NotifyOutcome,
}
