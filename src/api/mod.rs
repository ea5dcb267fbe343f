//! API clients for external services
//!
//! - JustWatch: title search, details and per-country offers
//!
//! The traits below are the seams the lookup and normalizer are written
//! against, so they can run over any backend.

pub mod justwatch;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::models::{RawOffer, TitleRecord};

pub use justwatch::{JustWatchClient, JustWatchError};

/// Backend able to search the title catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Up to `count` titles matching `query`, in backend order
    async fn search_titles(
        &self,
        query: &str,
        country: &str,
        language: &str,
        count: usize,
    ) -> Result<Vec<TitleRecord>, JustWatchError>;
}

/// Backend able to list offers for a title per region
#[async_trait]
pub trait OfferSource: Send + Sync {
    /// Raw offers keyed by upper-case region code
    async fn offers_for_countries(
        &self,
        title_id: &str,
        countries: &[String],
        language: &str,
        best_only: bool,
    ) -> Result<BTreeMap<String, Vec<RawOffer>>, JustWatchError>;
}
