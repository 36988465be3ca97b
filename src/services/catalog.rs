use crate::models::Experience;
use crate::services::{AirtableClient, AirtableError, CacheKey, CatalogCache};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced to callers that need the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(#[from] AirtableError),
}

/// Resolves catalog snapshots, from cache when possible
///
/// Cache failures never fail a request; they are logged and the
/// upstream catalog is used directly.
pub struct CatalogService {
    airtable: Arc<AirtableClient>,
    cache: Arc<CatalogCache>,
    cache_key: String,
}

impl CatalogService {
    pub fn new(airtable: Arc<AirtableClient>, cache: Arc<CatalogCache>, table: &str) -> Self {
        Self {
            airtable,
            cache,
            cache_key: CacheKey::catalog(table),
        }
    }

    pub fn airtable(&self) -> &AirtableClient {
        &self.airtable
    }

    /// Current catalog snapshot
    pub async fn experiences(&self) -> Result<Arc<Vec<Experience>>, CatalogError> {
        match self.cache.get(&self.cache_key).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(crate::services::CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Catalog cache read failed, fetching upstream: {}", e),
        }

        let snapshot = Arc::new(self.airtable.fetch_experiences().await?);
        tracing::info!("Loaded catalog snapshot with {} experiences", snapshot.len());

        match self.cache.set(&self.cache_key, snapshot.clone()).await {
            Ok(()) => tracing::debug!("Catalog cached: {:?}", self.cache.stats()),
            Err(e) => tracing::warn!("Failed to cache catalog snapshot: {}", e),
        }

        Ok(snapshot)
    }

    /// Experiences with the given record ids, fetched upstream
    pub async fn by_ids(&self, ids: &[String]) -> Result<Vec<Experience>, CatalogError> {
        Ok(self.airtable.fetch_by_ids(ids).await?)
    }

    /// Drop the cached snapshot so the next read goes upstream
    pub async fn invalidate(&self) {
        if let Err(e) = self.cache.delete(&self.cache_key).await {
            tracing::warn!("Failed to invalidate catalog cache: {}", e);
        }
    }
}
