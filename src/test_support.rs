//! In-memory collaborators for unit tests.
//!
//! [`FakeExtractor`] understands a tiny text format instead of HTML so tests can script
//! pages without markup noise: `pages:N` on an entry page, `card:ID:NAME;` per card,
//! `UNAVAILABLE` on a detail page and `surface:VALUE;` for a surface area.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DeliveryError, ExtractionError, FetchError};
use crate::models::{Catalog, FetchedDocument, ListingSummary};
use crate::traits::{DocumentFetcher, ListingExtractor, Notifier};

pub fn card(id: &str) -> String {
    format!("card:{id}:Name {id};")
}

#[derive(Clone)]
enum Scripted {
    Page(String),
    Status(u16),
}

#[derive(Default)]
struct FetcherState {
    routes: HashMap<String, Scripted>,
    requested: Vec<String>,
}

#[derive(Clone, Default)]
pub struct ScriptedFetcher {
    state: Arc<Mutex<FetcherState>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: &str) -> Self {
        self.set_page(url, body);
        self
    }

    pub fn status(self, url: &str, status: u16) -> Self {
        self.set_status(url, status);
        self
    }

    /// Every fetch waits this long, so concurrent requests overlap.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_page(&self, url: &str, body: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .routes
            .insert(url.to_string(), Scripted::Page(body.to_string()));
    }

    pub fn set_status(&self, url: &str, status: u16) {
        let mut state = self.state.lock().unwrap();
        state.routes.insert(url.to_string(), Scripted::Status(status));
    }

    pub fn requested(&self) -> Vec<String> {
        self.state.lock().unwrap().requested.clone()
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = {
            let mut state = self.state.lock().unwrap();
            state.requested.push(url.to_string());
            state.routes.get(url).cloned()
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match scripted {
            Some(Scripted::Page(body)) => Ok(FetchedDocument::ok(body)),
            Some(Scripted::Status(status)) => Ok(FetchedDocument {
                status,
                body: String::new(),
            }),
            None => Err(FetchError::Transport {
                url: url.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}

pub struct FakeExtractor;

impl ListingExtractor for FakeExtractor {
    fn extract_page_count(&self, markup: &str) -> Result<u32, ExtractionError> {
        let raw = markup
            .strip_prefix("pages:")
            .ok_or(ExtractionError::MissingPageCount)?;
        raw.trim()
            .parse()
            .map_err(|_| ExtractionError::InvalidPageCount(raw.to_string()))
    }

    fn extract_items(&self, markup: &str) -> Vec<ListingSummary> {
        markup
            .split(';')
            .filter_map(|chunk| chunk.trim().strip_prefix("card:"))
            .filter_map(|rest| rest.split_once(':'))
            .map(|(id, name)| ListingSummary {
                id: id.to_string(),
                name: name.to_string(),
                price: "250 €".to_string(),
                location: "Marseille".to_string(),
                relative_link: format!("/tools/36/accommodations/{id}"),
            })
            .collect()
    }

    fn has_unavailable_marker(&self, markup: &str) -> bool {
        markup.contains("UNAVAILABLE")
    }

    fn extract_surface_area(&self, markup: &str) -> Option<String> {
        let start = markup.find("surface:")? + "surface:".len();
        let value = markup[start..].split(';').next()?;
        Some(value.to_string())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    batches: Arc<Mutex<Vec<Catalog>>>,
    failing: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records batches but reports every delivery as failed.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn batches(&self) -> Vec<Catalog> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, novel: &Catalog) -> Result<(), DeliveryError> {
        self.batches.lock().unwrap().push(novel.clone());
        if self.failing {
            let bad_address = "relay-down".parse::<lettre::Address>().unwrap_err();
            Err(DeliveryError::Address(bad_address))
        } else {
            Ok(())
        }
    }
}
