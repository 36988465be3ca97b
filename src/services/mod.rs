// Service exports
pub mod airtable;
pub mod cache;
pub mod catalog;

pub use airtable::{normalize_record, normalize_records, AirtableClient, AirtableError, AirtableRecord, AirtableTables};
pub use cache::{CacheError, CacheKey, CacheStats, CatalogCache};
pub use catalog::{CatalogError, CatalogService};
