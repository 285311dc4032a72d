use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::models::Item;

/// Consumed collaborator: yields candidate items with their metadata. The
/// engine filters out rated/watchlisted items after fetching (§4.1 step 4).
///
/// §9 notes that the source this spec was distilled from returns an empty
/// candidate list unconditionally — a known gap, not a design choice. This
/// trait is the seam a real catalog (backed by a datastore) plugs into;
/// [`InMemoryCatalog`] is a working stand-in for the demo binary and tests.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch_candidates(&self) -> anyhow::Result<Vec<Item>>;
}

/// Serves a fixed, injectable item set. Not a persistence layer — items
/// are supplied wholesale at construction time.
#[derive(Default)]
pub struct InMemoryCatalog {
    items: RwLock<HashMap<i64, Item>>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: RwLock::new(items.into_iter().map(|i| (i.id, i)).collect()),
        }
    }

    pub fn insert(&self, item: Item) {
        self.items.write().unwrap().insert(item.id, item);
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn fetch_candidates(&self) -> anyhow::Result<Vec<Item>> {
        Ok(self.items.read().unwrap().values().cloned().collect())
    }
}
