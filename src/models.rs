//! Data structures and types for streamscout
//!
//! Contains the shared models used across the application organized by domain:
//! - **Titles**: catalog search results and their scoring
//! - **Offers**: raw per-region offers and the normalized availability table

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Title Models
// =============================================================================

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectType {
    Movie,
    Show,
    #[serde(other)]
    Other,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::Movie => write!(f, "Movie"),
            ObjectType::Show => write!(f, "Show"),
            ObjectType::Other => write!(f, "Other"),
        }
    }
}

/// Ratings attached to a title
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    pub imdb_score: Option<f32>,
    pub imdb_votes: Option<u64>,
    pub tmdb_score: Option<f32>,
    pub tomato_meter: Option<u32>,
}

/// One candidate returned by a catalog lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleRecord {
    /// Opaque node id, e.g. "tm92641"
    pub id: String,
    pub object_type: ObjectType,
    pub title: String,
    /// Catalog page for this title
    pub url: Option<String>,
    pub poster_url: Option<String>,
    pub short_description: String,
    /// Release date as reported upstream ("YYYY-MM-DD" or empty)
    pub release_date: String,
    pub release_year: Option<u16>,
    pub runtime_minutes: Option<u32>,
    /// Short genre codes such as "act" or "scf"
    pub genre_codes: Vec<String>,
    pub imdb_id: Option<String>,
    pub tmdb_id: Option<String>,
    pub scoring: Option<Scoring>,
}

impl TitleRecord {
    /// Runtime formatted as "2h 49m"
    pub fn format_runtime(&self) -> Option<String> {
        self.runtime_minutes
            .filter(|m| *m > 0)
            .map(|m| format!("{}h {:02}m", m / 60, m % 60))
    }
}

impl fmt::Display for TitleRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year_str = self
            .release_year
            .map(|y| format!(" ({})", y))
            .unwrap_or_default();
        write!(f, "{}{} [{}]", self.title, year_str, self.id)
    }
}

// =============================================================================
// Offer Models
// =============================================================================

/// One offer entry for a region, as reported by the offers backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawOffer {
    /// Service clear name; may be an alias of another service
    pub service_name: String,
    /// Service technical name, e.g. "amazonprime"
    pub service_code: String,
    pub url: String,
    /// Formatted price ("$3.99"), absent for flatrate/free listings
    pub price: Option<String>,
    pub price_value: Option<f64>,
    pub currency: Option<String>,
    /// FLATRATE, RENT, BUY, FREE, ADS
    pub monetization_type: String,
    /// SD, HD, _4K
    pub presentation_type: String,
}

impl RawOffer {
    /// Offer with just the fields the normalizer reads
    pub fn new(
        service_name: impl Into<String>,
        url: impl Into<String>,
        price: Option<&str>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            service_code: String::new(),
            url: url.into(),
            price: price.map(str::to_string),
            price_value: None,
            currency: None,
            monetization_type: String::new(),
            presentation_type: String::new(),
        }
    }
}

/// Availability of one service in one region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferEntry {
    pub url: Option<String>,
    pub price: Option<String>,
}

impl OfferEntry {
    pub fn new(url: impl Into<String>, price: Option<&str>) -> Self {
        Self {
            url: Some(url.into()),
            price: price.map(str::to_string),
        }
    }

    /// Numeric amount of the formatted price, ignoring currency symbols
    ///
    /// The last `.` or `,` is the decimal mark when at most two digits
    /// follow it; every other separator is a thousands separator.
    pub fn price_amount(&self) -> Option<f64> {
        let digits: String = self
            .price
            .as_deref()?
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
            .collect();
        let digits = digits.trim_matches(|c| c == '.' || c == ',');
        let decimal = digits
            .rfind(['.', ','])
            .filter(|&i| digits.len() - i - 1 <= 2);
        let normalized: String = digits
            .char_indices()
            .filter_map(|(i, c)| match c {
                '.' | ',' if Some(i) == decimal => Some('.'),
                '.' | ',' => None,
                _ => Some(c),
            })
            .collect();
        normalized.parse().ok()
    }
}

/// Cell text for an offer: its price, "Visit" when available without one,
/// "-" when the service has no offer
pub fn offer_label(entry: Option<&OfferEntry>) -> &str {
    match entry {
        None => "-",
        Some(OfferEntry { price: Some(price), .. }) => price,
        Some(_) => "Visit",
    }
}

/// Service display name to availability; `None` means no offer in the region
pub type RegionOffers = BTreeMap<String, Option<OfferEntry>>;

/// Region code to per-service availability
///
/// Every region holds the same set of service keys. Regions without any raw
/// offer are absent rather than present with all-`None` services.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedOfferTable {
    regions: BTreeMap<String, RegionOffers>,
}

impl NormalizedOfferTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: impl Into<String>, offers: RegionOffers) {
        self.regions.insert(region.into(), offers);
    }

    pub fn get(&self, region: &str) -> Option<&RegionOffers> {
        self.regions.get(region)
    }

    /// Entry for a service in a region; `None` if either is unknown or the
    /// service has no offer there
    pub fn entry(&self, region: &str, service: &str) -> Option<&OfferEntry> {
        self.regions
            .get(region)
            .and_then(|services| services.get(service))
            .and_then(Option::as_ref)
    }

    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.regions.keys().map(String::as_str)
    }

    /// Region codes ordered by country display name; unknown codes sort by
    /// the code itself
    pub fn regions_by_name(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.regions().collect();
        codes.sort_by_key(|code| crate::catalog::country_name(code).unwrap_or(*code));
        codes
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegionOffers)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Keep only the given regions (compared case-insensitively)
    pub fn retain_regions(&mut self, keep: &[String]) {
        self.regions
            .retain(|code, _| keep.iter().any(|k| k.eq_ignore_ascii_case(code)));
    }

    /// Number of (region, service) cells that carry an offer
    pub fn available_count(&self) -> usize {
        self.regions
            .values()
            .flat_map(|services| services.values())
            .filter(|entry| entry.is_some())
            .count()
    }

    pub fn into_inner(self) -> BTreeMap<String, RegionOffers> {
        self.regions
    }
}

impl From<BTreeMap<String, RegionOffers>> for NormalizedOfferTable {
    fn from(regions: BTreeMap<String, RegionOffers>) -> Self {
        Self { regions }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> NormalizedOfferTable {
        let mut us = RegionOffers::new();
        us.insert("Netflix".into(), Some(OfferEntry::new("u1", None)));
        us.insert("Apple TV".into(), None);
        let mut fr = RegionOffers::new();
        fr.insert("Netflix".into(), None);
        fr.insert("Apple TV".into(), Some(OfferEntry::new("u2", Some("3,99 €"))));

        let mut table = NormalizedOfferTable::new();
        table.insert("US", us);
        table.insert("FR", fr);
        table
    }

    #[test]
    fn test_table_serializes_as_plain_map() {
        let table = sample_table();
        let json = serde_json::to_value(&table).unwrap();

        assert_eq!(json["US"]["Netflix"]["url"], "u1");
        assert!(json["US"]["Netflix"]["price"].is_null());
        assert!(json["US"]["Apple TV"].is_null());
        assert_eq!(json["FR"]["Apple TV"]["price"], "3,99 €");
    }

    #[test]
    fn test_entry_lookup() {
        let table = sample_table();
        assert_eq!(table.entry("US", "Netflix").unwrap().url.as_deref(), Some("u1"));
        assert!(table.entry("US", "Apple TV").is_none());
        assert!(table.entry("DE", "Netflix").is_none());
        assert_eq!(table.available_count(), 2);
    }

    #[test]
    fn test_regions_by_name() {
        let mut table = sample_table();
        table.insert("DE", RegionOffers::new());
        // France, Germany, United States
        assert_eq!(table.regions_by_name(), vec!["FR", "DE", "US"]);
    }

    #[test]
    fn test_offer_label() {
        assert_eq!(offer_label(None), "-");
        assert_eq!(offer_label(Some(&OfferEntry::new("u", None))), "Visit");
        assert_eq!(offer_label(Some(&OfferEntry::new("u", Some("$2.99")))), "$2.99");
    }

    #[test]
    fn test_retain_regions_ignores_case() {
        let mut table = sample_table();
        table.retain_regions(&["us".to_string()]);
        assert_eq!(table.regions().collect::<Vec<_>>(), vec!["US"]);
    }

    #[test]
    fn test_format_runtime() {
        let mut record = TitleRecord {
            id: "tm1".into(),
            object_type: ObjectType::Movie,
            title: "Interstellar".into(),
            url: None,
            poster_url: None,
            short_description: String::new(),
            release_date: "2014-11-05".into(),
            release_year: Some(2014),
            runtime_minutes: Some(169),
            genre_codes: vec![],
            imdb_id: None,
            tmdb_id: None,
            scoring: None,
        };
        assert_eq!(record.format_runtime().as_deref(), Some("2h 49m"));
        assert_eq!(record.to_string(), "Interstellar (2014) [tm1]");

        record.runtime_minutes = Some(0);
        assert_eq!(record.format_runtime(), None);
    }

    #[test]
    fn test_price_amount() {
        let amount = |p: &str| OfferEntry::new("u", Some(p)).price_amount();
        assert_eq!(amount("$3.99"), Some(3.99));
        assert_eq!(amount("3,99 €"), Some(3.99));
        assert_eq!(amount("CA$14.99"), Some(14.99));
        assert_eq!(amount("1.299,00 ₽"), Some(1299.0));
        assert_eq!(amount("¥1,500"), Some(1500.0));
        assert_eq!(amount("free"), None);
        assert_eq!(OfferEntry::new("u", None).price_amount(), None);
    }
}
