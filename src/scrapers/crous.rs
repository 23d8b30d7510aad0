//! CROUS "trouver un logement" markup extraction

use anyhow::Result;
use scraper::{ElementRef, Html};

use crate::error::ExtractionError;
use crate::models::{ListingSummary, NO_LOCATION, NO_NAME, NO_PRICE};
use crate::traits::{CompiledSelectors, ListingExtractor, SiteSelectors};

/// Extractor for the CROUS accommodation search and detail pages
#[derive(Debug, Clone)]
pub struct CrousExtractor {
    selectors: CompiledSelectors,
}

impl CrousExtractor {
    /// Create an extractor for the current CROUS layout
    pub fn new() -> Result<Self> {
        Self::with_selectors(&SiteSelectors::default())
    }

    pub fn with_selectors(selectors: &SiteSelectors) -> Result<Self> {
        Ok(Self {
            selectors: selectors.compile()?,
        })
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Finds `<number> m²` (or `m2`) in `text` and returns it normalized, e.g. `"18 m²"`.
fn find_surface_area(text: &str) -> Option<String> {
    let unit_at = text.find("m²").or_else(|| text.find("m2"))?;
    let before = text[..unit_at].trim_end();

    let number_start = before
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == ',' || *c == '.')
        .last()
        .map(|(i, _)| i)?;
    let number = before[number_start..].trim_matches(|c| c == ',' || c == '.');

    if number.is_empty() || !number.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{number} m²"))
}

impl ListingExtractor for CrousExtractor {
    fn extract_page_count(&self, markup: &str) -> Result<u32, ExtractionError> {
        let document = Html::parse_document(markup);
        let input = document
            .select(&self.selectors.page_count)
            .next()
            .ok_or(ExtractionError::MissingPageCount)?;
        let raw = input
            .value()
            .attr("max")
            .ok_or(ExtractionError::MissingPageCount)?;

        raw.trim()
            .parse()
            .map_err(|_| ExtractionError::InvalidPageCount(raw.to_string()))
    }

    fn extract_items(&self, markup: &str) -> Vec<ListingSummary> {
        let document = Html::parse_document(markup);
        let mut items = Vec::new();

        for card in document.select(&self.selectors.listing_container) {
            let title = card.select(&self.selectors.title).next();

            // The id is the last path segment of the detail link; cards without one are dropped
            let Some(href) = title
                .and_then(|t| t.select(&self.selectors.link).next())
                .and_then(|a| a.value().attr("href"))
            else {
                continue;
            };
            let Some(id) = href
                .split(['?', '#'])
                .next()
                .and_then(|path| path.trim_end_matches('/').rsplit('/').next())
                .filter(|segment| !segment.is_empty())
            else {
                continue;
            };

            let name = title
                .map(element_text)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NO_NAME.to_string());

            let price = card.select(&self.selectors.price).next().map_or_else(
                || NO_PRICE.to_string(),
                element_text,
            );

            let location = card.select(&self.selectors.location).next().map_or_else(
                || NO_LOCATION.to_string(),
                element_text,
            );

            items.push(ListingSummary {
                id: id.to_string(),
                name,
                price,
                location,
                relative_link: href.to_string(),
            });
        }

        items
    }

    fn has_unavailable_marker(&self, markup: &str) -> bool {
        let document = Html::parse_document(markup);
        document
            .select(&self.selectors.unavailable_marker)
            .next()
            .is_some()
    }

    fn extract_surface_area(&self, markup: &str) -> Option<String> {
        let document = Html::parse_document(markup);
        document
            .select(&self.selectors.detail_attributes)
            .find_map(|el| find_surface_area(&element_text(el)))
    }
}
