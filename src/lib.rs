//! streamscout - where does this movie stream?
//!
//! Search a movie by title, pick one of the candidates, and see which
//! streaming services carry it in every country, with prices.
//!
//! # Modules
//!
//! - `models` - Title records, raw offers, the normalized offer table
//! - `catalog` - Region, genre and service reference tables
//! - `api` - JustWatch client and the backend traits
//! - `lookup` - Title search
//! - `normalize` - Offer reduction and service canonicalization
//! - `app` - TUI view state and navigation
//! - `ui` - TUI components
//! - `cli` / `commands` - Scriptable subcommands

pub mod api;
pub mod app;
pub mod browser;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod normalize;
pub mod ui;

// Re-export commonly used types
pub use models::{NormalizedOfferTable, OfferEntry, RawOffer, RegionOffers, TitleRecord};

pub use api::{CatalogSource, JustWatchClient, JustWatchError, OfferSource};
pub use app::{App, View};
pub use catalog::ServiceTable;
pub use lookup::search_titles;
pub use normalize::get_offers;
