use std::sync::Arc;

use futures::{StreamExt, stream};
use tracing::{debug, info, warn};

use crate::fetcher::fetch_success;
use crate::models::{Accommodation, Catalog};
use crate::traits::{DocumentFetcher, ListingExtractor};

/// Outcome of one detail-page check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available { surface_area: Option<String> },
    Unavailable,
}

/// Confirms availability of each catalog entry against its detail page.
#[derive(Clone)]
pub struct AvailabilityVerifier {
    fetcher: Arc<dyn DocumentFetcher>,
    extractor: Arc<dyn ListingExtractor>,
    base_url: String,
    detail_path: String,
    max_concurrent_checks: usize,
}

impl AvailabilityVerifier {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn ListingExtractor>,
        base_url: impl Into<String>,
        detail_path: impl Into<String>,
        max_concurrent_checks: usize,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            base_url: base_url.into(),
            detail_path: detail_path.into(),
            max_concurrent_checks: max_concurrent_checks.max(1),
        }
    }

    pub fn detail_url(&self, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.detail_path.trim_matches('/'),
            id
        )
    }

    /// Checks a single accommodation. Any fetch failure counts as unavailable.
    pub async fn check(&self, id: &str) -> Availability {
        let url = self.detail_url(id);
        let body = match fetch_success(self.fetcher.as_ref(), &url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Treating {} as unavailable: {}", id, e);
                return Availability::Unavailable;
            }
        };

        if self.extractor.has_unavailable_marker(&body) {
            debug!("{} is marked unavailable", id);
            Availability::Unavailable
        } else {
            Availability::Available {
                surface_area: self.extractor.extract_surface_area(&body),
            }
        }
    }

    /// Returns the available subset of `catalog`, each record enriched with its surface area
    ///
    /// At most `max_concurrent_checks` detail pages are in flight at once. Every check is
    /// joined before the results are merged.
    pub async fn verify(&self, catalog: &Catalog) -> Catalog {
        if catalog.is_empty() {
            return Catalog::new();
        }

        let concurrency = self.max_concurrent_checks.min(catalog.len());
        let results: Vec<(&String, Availability)> = stream::iter(catalog.keys())
            .map(|id| async move { (id, self.check(id).await) })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let available: Catalog = results
            .into_iter()
            .filter_map(|(id, availability)| match availability {
                Availability::Available { surface_area } => {
                    let record: Accommodation = catalog[id].clone().with_surface_area(surface_area);
                    Some((id.clone(), record))
                }
                Availability::Unavailable => None,
            })
            .collect();

        info!(
            "{} of {} accommodations are available",
            available.len(),
            catalog.len()
        );
        available
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::models::{ListingSummary, NO_SURFACE_AREA};
    use crate::test_support::{FakeExtractor, ScriptedFetcher};

    const BASE: &str = "https://crous.test";

    fn catalog(ids: &[&str]) -> Catalog {
        ids.iter()
            .map(|id| {
                let summary = ListingSummary {
                    id: (*id).to_string(),
                    name: format!("Name {id}"),
                    price: "250 €".to_string(),
                    location: "Marseille".to_string(),
                    relative_link: format!("/tools/36/accommodations/{id}"),
                };
                ((*id).to_string(), Accommodation::from_summary(summary, BASE))
            })
            .collect()
    }

    fn verifier(fetcher: ScriptedFetcher, max: usize) -> AvailabilityVerifier {
        AvailabilityVerifier::new(
            Arc::new(fetcher),
            Arc::new(FakeExtractor),
            BASE,
            "tools/36/accommodations",
            max,
        )
    }

    fn detail(id: &str) -> String {
        format!("{BASE}/tools/36/accommodations/{id}")
    }

    #[test]
    fn builds_detail_url() {
        let v = AvailabilityVerifier::new(
            Arc::new(ScriptedFetcher::new()),
            Arc::new(FakeExtractor),
            "https://crous.test/",
            "/tools/36/accommodations/",
            10,
        );
        assert_eq!(v.detail_url("42"), "https://crous.test/tools/36/accommodations/42");
    }

    #[tokio::test]
    async fn keeps_only_available_items() {
        let fetcher = ScriptedFetcher::new()
            .page(&detail("A"), "surface:18 m²;")
            .page(&detail("B"), "nothing special")
            .page(&detail("C"), "UNAVAILABLE");

        let available = verifier(fetcher, 10).verify(&catalog(&["A", "B", "C"])).await;

        assert_eq!(available.len(), 2);
        assert_eq!(available["A"].surface_area.as_deref(), Some("18 m²"));
        assert_eq!(available["B"].surface_area.as_deref(), Some(NO_SURFACE_AREA));
        assert_eq!(available["A"].name, "Name A");
        assert!(!available.contains_key("C"));
    }

    #[tokio::test]
    async fn fetch_failures_are_unavailable() {
        // A: error status, B: transport error (not scripted)
        let fetcher = ScriptedFetcher::new().status(&detail("A"), 502);

        let available = verifier(fetcher, 10).verify(&catalog(&["A", "B"])).await;
        assert!(available.is_empty());
    }

    #[tokio::test]
    async fn error_page_without_marker_is_not_available() {
        let fetcher = ScriptedFetcher::new().status(&detail("A"), 404);
        assert_eq!(
            verifier(fetcher, 10).check("A").await,
            Availability::Unavailable
        );
    }

    #[tokio::test]
    async fn empty_catalog_dispatches_nothing() {
        let fetcher = ScriptedFetcher::new();
        let probe = fetcher.clone();

        assert!(verifier(fetcher, 10).verify(&Catalog::new()).await.is_empty());
        assert!(probe.requested().is_empty());
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let ids: Vec<String> = (0..40).map(|i| format!("id{i}")).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();

        let fetcher = ScriptedFetcher::new().delayed(Duration::from_millis(20));
        for id in &ids {
            fetcher.set_page(&detail(id), "ok");
        }
        let probe = fetcher.clone();

        let available = verifier(fetcher, 10).verify(&catalog(&id_refs)).await;

        assert_eq!(available.len(), 40);
        assert_eq!(probe.requested().len(), 40);
        assert!(probe.peak_in_flight() <= 10);
        assert!(probe.peak_in_flight() > 1);
    }

    #[tokio::test]
    async fn small_catalog_uses_one_check_per_item() {
        let fetcher = ScriptedFetcher::new()
            .delayed(Duration::from_millis(20))
            .page(&detail("A"), "ok")
            .page(&detail("B"), "ok");
        let probe = fetcher.clone();

        verifier(fetcher, 10).verify(&catalog(&["A", "B"])).await;
        assert!(probe.peak_in_flight() <= 2);
    }
}
