//! Traits and interfaces at the seams of the polling pipeline

use async_trait::async_trait;
use scraper::Selector;

use crate::error::{DeliveryError, ExtractionError, FetchError};
use crate::models::{Catalog, FetchedDocument, ListingSummary};

/// CSS selectors for the parts of the site the pipeline reads
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    /// Numeric input whose `max` attribute holds the page count
    pub page_count: String,
    /// Container for one accommodation card on a catalog page
    pub listing_container: String,
    /// Card title, holds the name and the detail link
    pub title: String,
    /// Detail link within the title
    pub link: String,
    pub price: String,
    pub location: String,
    /// Marker present on a detail page when the unit cannot be booked
    pub unavailable_marker: String,
    /// Detail page elements scanned for a surface area
    pub detail_attributes: String,
}

impl Default for SiteSelectors {
    fn default() -> Self {
        Self {
            page_count: r#"input[type="number"][title="Page à atteindre"]"#.to_string(),
            listing_container: "li.fr-col-12.fr-col-sm-6.fr-col-md-4".to_string(),
            title: "h3.fr-card__title".to_string(),
            link: "a[href]".to_string(),
            price: "p.fr-badge".to_string(),
            location: "p.fr-card__desc".to_string(),
            unavailable_marker: r#"button[title="Indisponible"]"#.to_string(),
            detail_attributes: "li, p, span, td".to_string(),
        }
    }
}

/// [`SiteSelectors`] parsed once, ready for matching
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub page_count: Selector,
    pub listing_container: Selector,
    pub title: Selector,
    pub link: Selector,
    pub price: Selector,
    pub location: Selector,
    pub unavailable_marker: Selector,
    pub detail_attributes: Selector,
}

impl SiteSelectors {
    /// Parses every selector
    ///
    /// # Returns
    /// * `anyhow::Result<CompiledSelectors>` - Compiled selectors or the first parse failure
    pub fn compile(&self) -> anyhow::Result<CompiledSelectors> {
        let parse = |name: &str, raw: &str| {
            Selector::parse(raw)
                .map_err(|e| anyhow::anyhow!("Failed to parse {name} selector: {e:?}"))
        };

        Ok(CompiledSelectors {
            page_count: parse("page count", &self.page_count)?,
            listing_container: parse("listing container", &self.listing_container)?,
            title: parse("title", &self.title)?,
            link: parse("link", &self.link)?,
            price: parse("price", &self.price)?,
            location: parse("location", &self.location)?,
            unavailable_marker: parse("unavailable marker", &self.unavailable_marker)?,
            detail_attributes: parse("detail attributes", &self.detail_attributes)?,
        })
    }
}

/// Retrieves raw documents over the network
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetches `url`, bounded by the implementation's timeout
    ///
    /// A non-success status is returned as a document, not an error; callers decide.
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError>;
}

/// Pulls structured data out of markup. Every method is a pure function of its input.
pub trait ListingExtractor: Send + Sync {
    /// Total number of catalog pages advertised by the pagination control
    fn extract_page_count(&self, markup: &str) -> Result<u32, ExtractionError>;

    /// Every accommodation card with a resolvable id
    fn extract_items(&self, markup: &str) -> Vec<ListingSummary>;

    /// Whether a detail page flags the unit as unavailable
    fn has_unavailable_marker(&self, markup: &str) -> bool;

    fn extract_surface_area(&self, markup: &str) -> Option<String>;
}

/// Delivers batches of novel accommodations to subscribers
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Attempts delivery of one batch. Never retried by the caller.
    async fn notify(&self, novel: &Catalog) -> Result<(), DeliveryError>;
}
