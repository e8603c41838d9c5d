//! Ranked endpoint directory.
//!
//! The directory maps `(chain, class)` to base URLs ordered by rank (rank 1 first). It is written
//! by the [`EndpointProber`](super::prober::EndpointProber) or seeded from configuration, and read
//! by the [`RequestRouter`](super::router::RequestRouter) on every call.

use crate::{
    config::GatewayConfig,
    types::{chain_key, EndpointClass, EndpointRecord},
};
use async_trait::async_trait;
use dashmap::DashMap;
use std::{collections::BTreeMap, sync::Arc};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory store unavailable: {0}")]
    Unavailable(String),
}

/// Read side of the endpoint directory, as consumed by the router.
#[async_trait]
pub trait EndpointDirectory: Send + Sync {
    /// Returns base URLs for `(chain, class)` in rank order, best first.
    async fn list_endpoints(
        &self,
        chain: &str,
        class: EndpointClass,
    ) -> Result<Vec<String>, DirectoryError>;

    /// The ranking for `(chain, class)` as records, rank 1 first.
    async fn records(
        &self,
        chain: &str,
        class: EndpointClass,
    ) -> Result<Vec<EndpointRecord>, DirectoryError> {
        let key = chain_key(chain);
        Ok(self
            .list_endpoints(chain, class)
            .await?
            .into_iter()
            .enumerate()
            .map(|(index, base_url)| EndpointRecord {
                chain: key.clone(),
                class,
                rank: index + 1,
                base_url,
            })
            .collect())
    }
}

type DirectoryKey = (String, EndpointClass);

/// In-process directory.
///
/// Each `(chain, class)` slot holds an immutable rank map behind an [`Arc`]. Writers build a new
/// map and swap it in, so readers always observe either the old or the new ranking in full.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    slots: DashMap<DirectoryKey, Arc<BTreeMap<usize, String>>>,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds every configured chain with its candidate URLs in declaration order.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        let directory = Self::new();
        for chain in &config.chains {
            for class in EndpointClass::ALL {
                let candidates = chain.candidates.for_class(class);
                if !candidates.is_empty() {
                    directory.replace(&chain.name, class, candidates.to_vec());
                }
            }
        }
        directory
    }

    /// Replaces the whole ranking for `(chain, class)`. `urls[0]` becomes rank 1.
    ///
    /// Duplicate URLs keep their best rank only.
    pub fn replace(&self, chain: &str, class: EndpointClass, urls: Vec<String>) {
        let mut ranked = BTreeMap::new();
        let mut rank = 1;
        for url in urls {
            if ranked.values().any(|existing| existing == &url) {
                continue;
            }
            ranked.insert(rank, url);
            rank += 1;
        }
        tracing::debug!(chain = chain, class = %class, endpoints = ranked.len(), "directory replaced");
        self.slots.insert((chain_key(chain), class), Arc::new(ranked));
    }

    fn snapshot(&self, chain: &str, class: EndpointClass) -> Option<Arc<BTreeMap<usize, String>>> {
        self.slots.get(&(chain_key(chain), class)).map(|slot| slot.value().clone())
    }
}

#[async_trait]
impl EndpointDirectory for MemoryDirectory {
    async fn list_endpoints(
        &self,
        chain: &str,
        class: EndpointClass,
    ) -> Result<Vec<String>, DirectoryError> {
        Ok(self
            .snapshot(chain, class)
            .map(|slot| slot.values().cloned().collect())
            .unwrap_or_default())
    }
}
