use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, error, info};

use crate::collector::CatalogCollector;
use crate::config::Config;
use crate::email::EmailNotifier;
use crate::fetcher::HttpFetcher;
use crate::models::{Catalog, CycleReport, NotifyOutcome};
use crate::novelty::SeenSet;
use crate::scrapers::CrousExtractor;
use crate::traits::{DocumentFetcher, ListingExtractor, Notifier};
use crate::verifier::AvailabilityVerifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Collecting,
    Verifying,
    DiffAndNotify,
    Sleeping,
}

impl fmt::Display for CycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Collecting => "collecting",
            Self::Verifying => "verifying",
            Self::DiffAndNotify => "diff-and-notify",
            Self::Sleeping => "sleeping",
        };
        f.write_str(name)
    }
}

/// Polls the catalog forever and emails subscribers about newly available units.
///
/// Owns the [`SeenSet`]; nothing else writes to it.
pub struct CrousFinder {
    collector: CatalogCollector,
    verifier: AvailabilityVerifier,
    notifier: Arc<dyn Notifier>,
    seen: SeenSet,
    poll_interval: Duration,
    state: CycleState,
}

fn as_json(catalog: &Catalog) -> String {
    serde_json::to_string(catalog).unwrap_or_default()
}

impl CrousFinder {
    /// Wires the HTTP fetcher, CROUS extractor and email notifier from `config`.
    pub fn new(config: &Config) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout)?);
        let extractor = Arc::new(CrousExtractor::new()?);
        let notifier = Arc::new(EmailNotifier::new(config.email.as_ref())?);

        Ok(Self::with_parts(config, fetcher, extractor, notifier))
    }

    pub fn with_parts(
        config: &Config,
        fetcher: Arc<dyn DocumentFetcher>,
        extractor: Arc<dyn ListingExtractor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let collector = CatalogCollector::new(
            Arc::clone(&fetcher),
            Arc::clone(&extractor),
            config.base_url.clone(),
            config.search_url.clone(),
            config.page_limit,
        );
        let verifier = AvailabilityVerifier::new(
            fetcher,
            extractor,
            config.base_url.clone(),
            config.detail_path.clone(),
            config.max_concurrent_checks,
        );

        Self {
            collector,
            verifier,
            notifier,
            seen: SeenSet::new(),
            poll_interval: config.poll_interval,
            state: CycleState::Idle,
        }
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    fn enter(&mut self, state: CycleState) {
        debug!("{} -> {}", self.state, state);
        self.state = state;
    }

    /// Runs one collect, verify, diff and notify pass without sleeping
    ///
    /// Never fails. Novel entries are marked as seen before notifying, so a failed
    /// delivery is not retried on a later cycle.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let started_at = Utc::now();

        self.enter(CycleState::Collecting);
        let catalog = self.collector.collect().await;
        debug!("Current accommodations: {}", as_json(&catalog));

        self.enter(CycleState::Verifying);
        let available = self.verifier.verify(&catalog).await;
        debug!("Available accommodations: {}", as_json(&available));

        self.enter(CycleState::DiffAndNotify);
        let novel = self.seen.diff_and_merge(&available);

        let notified = if novel.is_empty() {
            info!("No new accommodations found");
            NotifyOutcome::Skipped
        } else {
            info!("Found {} new accommodations", novel.len());
            for record in novel.values() {
                info!("New accommodation: {} - {} ({})", record.name, record.price, record.link);
            }

            match self.notifier.notify(&novel).await {
                Ok(()) => NotifyOutcome::Sent,
                Err(e) => {
                    error!("Failed to send notification: {}", e);
                    NotifyOutcome::Failed
                }
            }
        };

        CycleReport {
            started_at,
            catalog_size: catalog.len(),
            available_size: available.len(),
            novel,
            notified,
        }
    }

    /// Runs cycles forever, sleeping `poll_interval` after each one.
    pub async fn run(mut self) {
        info!(
            "Watching for new accommodations every {}s",
            self.poll_interval.as_secs()
        );

        loop {
            let report = self.run_cycle().await;
            info!(
                "Cycle started at {} done: {} listed, {} available, {} new, {} seen in total",
                report.started_at.format("%Y-%m-%d %H:%M:%S"),
                report.catalog_size,
                report.available_size,
                report.novel.len(),
                self.seen.len()
            );

            self.enter(CycleState::Sleeping);
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
