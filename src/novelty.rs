use std::collections::HashSet;

use crate::models::Catalog;

/// Identifiers already reported as available, for the life of the process.
///
/// Ids are never removed: an accommodation that goes unavailable and later comes back
/// is not reported a second time.
#[derive(Debug, Default, Clone)]
pub struct SeenSet {
    ids: HashSet<String>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entries of `available` never seen before, then records all of them
    pub fn diff_and_merge(&mut self, available: &Catalog) -> Catalog {
        let novel: Catalog = available
            .iter()
            .filter(|(id, _)| !self.ids.contains(*id))
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();

        self.ids.extend(available.keys().cloned());
        novel
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
