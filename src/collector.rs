use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::fetcher::fetch_success;
use crate::models::{Accommodation, Catalog};
use crate::traits::{DocumentFetcher, ListingExtractor};

/// Walks every page of the search results and merges their cards by id.
#[derive(Clone)]
pub struct CatalogCollector {
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn ListingExtractor>,
    base_url: String,
    search_url: String,
    page_limit: u32,
}

/// Appends `page=<n>` to `search_url`, adding a separator only when it lacks one.
pub fn page_url(search_url: &str, page: u32) -> String {
    let separator = if search_url.ends_with('?') || search_url.ends_with('&') {
        ""
    } else if search_url.contains('?') {
        "&"
    } else {
        "?"
    };
    format!("{search_url}{separator}page={page}")
}

impl CatalogCollector {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn ListingExtractor>,
        base_url: impl Into<String>,
        search_url: impl Into<String>,
        page_limit: u32,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            base_url: base_url.into(),
            search_url: search_url.into(),
            page_limit,
        }
    }

    /// Collects the full catalog
    ///
    /// Never fails: an unreachable entry page or a missing page-count control yields an
    /// empty catalog, and a failing page is skipped while the others are kept. Pages are
    /// fetched in order so a later page overwrites an earlier one on id collision.
    pub async fn collect(&self) -> Catalog {
        let mut catalog = Catalog::new();

        let entry = match fetch_success(self.fetcher.as_ref(), &self.search_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to retrieve search results: {}", e);
                return catalog;
            }
        };

        let advertised = match self.extractor.extract_page_count(&entry) {
            Ok(count) => count,
            Err(e) => {
                warn!("Failed to find the page count: {}", e);
                return catalog;
            }
        };

        let max_pages = if advertised > self.page_limit {
            warn!(
                "Search advertises {} pages, only the first {} will be fetched",
                advertised, self.page_limit
            );
            self.page_limit
        } else {
            advertised
        };
        info!("Total pages found: {}", max_pages);

        for page in 1..=max_pages {
            let url = page_url(&self.search_url, page);
            let body = match fetch_success(self.fetcher.as_ref(), &url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Skipping page {}: {}", page, e);
                    continue;
                }
            };

            let items = self.extractor.extract_items(&body);
            debug!("Page {} lists {} accommodations", page, items.len());

            for summary in items {
                let record = Accommodation::from_summary(summary, &self.base_url);
                catalog.insert(record.id.clone(), record);
            }
        }

        info!("Collected {} accommodations", catalog.len());
        catalog
    }
}
