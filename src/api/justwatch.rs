//! JustWatch GraphQL client
//!
//! Title search, title details, and per-country offer listings.
//! Every call is a single POST of `{operationName, variables, query}`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

use super::{CatalogSource, OfferSource};
use crate::models::{ObjectType, RawOffer, Scoring, TitleRecord};

pub const DEFAULT_BASE_URL: &str = "https://apis.justwatch.com";
const DETAILS_URL: &str = "https://justwatch.com";
const IMAGES_URL: &str = "https://images.justwatch.com";

/// JustWatch API error types
#[derive(Error, Debug)]
pub enum JustWatchError {
    #[error("Title not found: {0}")]
    NotFound(String),

    #[error("Server returned HTTP {0}")]
    Http(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid country code: {0:?}")]
    InvalidCountry(String),

    #[error("No countries specified")]
    NoCountries,

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
}

/// JustWatch API client
pub struct JustWatchClient {
    base_url: String,
    client: reqwest::Client,
}

impl JustWatchClient {
    /// Create a client against the public API
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self::with_options(base_url, Duration::from_secs(30))
    }

    pub fn with_options(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    /// POST a GraphQL request and decode the full response envelope
    async fn post<T: DeserializeOwned>(
        &self,
        request: &Value,
    ) -> Result<GraphQlResponse<T>, JustWatchError> {
        let url = format!("{}/graphql", self.base_url);
        tracing::debug!(
            operation = request["operationName"].as_str().unwrap_or_default(),
            "POST {}",
            url
        );

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                serde_json::from_str(&body).map_err(|e| {
                    JustWatchError::InvalidResponse(format!("JSON parse error: {}", e))
                })
            }
            status => {
                tracing::warn!(status = status.as_u16(), "JustWatch request failed");
                Err(JustWatchError::Http(status.as_u16()))
            }
        }
    }

    /// Search titles by free text
    pub async fn search(
        &self,
        title: &str,
        country: &str,
        language: &str,
        count: usize,
        best_only: bool,
    ) -> Result<Vec<TitleRecord>, JustWatchError> {
        let request = search_request(title, country, language, count, best_only)?;
        let response: GraphQlResponse<SearchData> = self.post(&request).await?;
        let data = response.into_data()?;

        let records: Vec<TitleRecord> = data
            .popular_titles
            .edges
            .into_iter()
            .map(|edge| edge.node.into_record())
            .collect();
        tracing::debug!(query = title, count = records.len(), "search parsed");
        Ok(records)
    }

    /// Details for one title; `None` when the id does not resolve
    pub async fn details(
        &self,
        node_id: &str,
        country: &str,
        language: &str,
        best_only: bool,
    ) -> Result<Option<TitleRecord>, JustWatchError> {
        let request = details_request(node_id, country, language, best_only)?;
        let response: GraphQlResponse<DetailsData> = self.post(&request).await?;
        if response.has_errors() {
            return Ok(None);
        }
        Ok(response
            .data
            .and_then(|d| d.node)
            .map(|node| node.into_record()))
    }

    /// Offers for one title in each of the given countries
    ///
    /// Every requested country is present in the result, with an empty list
    /// when the title has no offers there.
    pub async fn offers_for_countries(
        &self,
        node_id: &str,
        countries: &[String],
        language: &str,
        best_only: bool,
    ) -> Result<BTreeMap<String, Vec<RawOffer>>, JustWatchError> {
        if countries.is_empty() {
            return Ok(BTreeMap::new());
        }
        let request = offers_request(node_id, countries, language, best_only)?;
        let response: GraphQlResponse<OffersData> = self.post(&request).await?;
        if response.has_errors() {
            return Err(JustWatchError::NotFound(node_id.to_string()));
        }
        let node = response
            .data
            .and_then(|d| d.node)
            .ok_or_else(|| JustWatchError::NotFound(node_id.to_string()))?;

        let mut result = BTreeMap::new();
        for country in countries {
            let code = country.to_uppercase();
            let offers = match node.get(&code) {
                Some(Value::Null) | None => Vec::new(),
                Some(value) => Vec::<OfferRaw>::deserialize(value)
                    .map_err(|e| {
                        JustWatchError::InvalidResponse(format!("offers for {}: {}", code, e))
                    })?
                    .into_iter()
                    .map(OfferRaw::into_raw_offer)
                    .collect(),
            };
            result.insert(code, offers);
        }
        tracing::debug!(
            node_id,
            countries = result.len(),
            offers = result.values().map(Vec::len).sum::<usize>(),
            "offers parsed"
        );
        Ok(result)
    }
}

impl Default for JustWatchClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogSource for JustWatchClient {
    async fn search_titles(
        &self,
        query: &str,
        country: &str,
        language: &str,
        count: usize,
    ) -> Result<Vec<TitleRecord>, JustWatchError> {
        self.search(query, country, language, count, false).await
    }
}

#[async_trait]
impl OfferSource for JustWatchClient {
    async fn offers_for_countries(
        &self,
        title_id: &str,
        countries: &[String],
        language: &str,
        best_only: bool,
    ) -> Result<BTreeMap<String, Vec<RawOffer>>, JustWatchError> {
        JustWatchClient::offers_for_countries(self, title_id, countries, language, best_only)
            .await
    }
}

// =============================================================================
// Request Builders
// =============================================================================

fn check_country(code: &str) -> Result<(), JustWatchError> {
    if code.chars().count() != 2 {
        return Err(JustWatchError::InvalidCountry(code.to_string()));
    }
    Ok(())
}

fn search_request(
    title: &str,
    country: &str,
    language: &str,
    count: usize,
    best_only: bool,
) -> Result<Value, JustWatchError> {
    check_country(country)?;
    Ok(json!({
        "operationName": "GetSearchTitles",
        "variables": {
            "first": count,
            "searchTitlesFilter": { "searchQuery": title },
            "language": language,
            "country": country.to_uppercase(),
            "formatPoster": "JPG",
            "profile": "S718",
            "filter": { "bestOnly": best_only },
        },
        "query": format!("{}{}", SEARCH_QUERY, DETAILS_FRAGMENT),
    }))
}

fn details_request(
    node_id: &str,
    country: &str,
    language: &str,
    best_only: bool,
) -> Result<Value, JustWatchError> {
    check_country(country)?;
    Ok(json!({
        "operationName": "GetTitleNode",
        "variables": {
            "nodeId": node_id,
            "language": language,
            "country": country.to_uppercase(),
            "formatPoster": "JPG",
            "profile": "S718",
            "filter": { "bestOnly": best_only },
        },
        "query": format!("{}{}", DETAILS_QUERY, DETAILS_FRAGMENT),
    }))
}

fn offers_request(
    node_id: &str,
    countries: &[String],
    language: &str,
    best_only: bool,
) -> Result<Value, JustWatchError> {
    if countries.is_empty() {
        return Err(JustWatchError::NoCountries);
    }
    for country in countries {
        check_country(country)?;
    }
    let entries: Vec<String> = countries
        .iter()
        .map(|c| COUNTRY_OFFERS_ENTRY.replace("{country_code}", &c.to_uppercase()))
        .collect();
    let query = format!(
        "{}{}",
        OFFERS_BY_COUNTRY_QUERY.replace("{country_entries}", &entries.join("\n")),
        OFFER_FRAGMENT
    );
    Ok(json!({
        "operationName": "GetTitleOffers",
        "variables": {
            "nodeId": node_id,
            "language": language,
            "filter": { "bestOnly": best_only },
        },
        "query": query,
    }))
}

// =============================================================================
// Response Structures (internal deserialization)
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl<T> GraphQlResponse<T> {
    /// An empty `errors` array counts as no errors
    fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    fn into_data(self) -> Result<T, JustWatchError> {
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(JustWatchError::InvalidResponse(messages.join("; ")));
        }
        self.data
            .ok_or_else(|| JustWatchError::InvalidResponse("missing data".into()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchData {
    popular_titles: Edges,
}

#[derive(Debug, Deserialize)]
struct Edges {
    #[serde(default)]
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct Edge {
    node: NodeRaw,
}

#[derive(Debug, Deserialize)]
struct DetailsData {
    node: Option<NodeRaw>,
}

#[derive(Debug, Deserialize)]
struct OffersData {
    node: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRaw {
    id: String,
    object_type: ObjectType,
    content: ContentRaw,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentRaw {
    title: String,
    full_path: Option<String>,
    original_release_year: Option<u16>,
    original_release_date: Option<String>,
    runtime: Option<u32>,
    short_description: Option<String>,
    #[serde(default)]
    genres: Vec<GenreRaw>,
    external_ids: Option<ExternalIdsRaw>,
    poster_url: Option<String>,
    scoring: Option<ScoringRaw>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenreRaw {
    short_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExternalIdsRaw {
    imdb_id: Option<String>,
    tmdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoringRaw {
    imdb_score: Option<f32>,
    imdb_votes: Option<f64>,
    tmdb_score: Option<f32>,
    tomato_meter: Option<f64>,
}

impl NodeRaw {
    fn into_record(self) -> TitleRecord {
        let content = self.content;
        let (imdb_id, tmdb_id) = content
            .external_ids
            .map(|ids| (ids.imdb_id, ids.tmdb_id))
            .unwrap_or_default();

        TitleRecord {
            id: self.id,
            object_type: self.object_type,
            title: content.title,
            url: content.full_path.map(|p| format!("{}{}", DETAILS_URL, p)),
            poster_url: content.poster_url.map(|p| poster_url(&p)),
            short_description: content.short_description.unwrap_or_default(),
            release_date: content.original_release_date.unwrap_or_default(),
            release_year: content.original_release_year,
            runtime_minutes: content.runtime,
            genre_codes: content.genres.into_iter().map(|g| g.short_name).collect(),
            imdb_id,
            tmdb_id,
            scoring: content.scoring.map(|s| Scoring {
                imdb_score: s.imdb_score,
                imdb_votes: s.imdb_votes.map(|v| v as u64),
                tmdb_score: s.tmdb_score,
                tomato_meter: s.tomato_meter.map(|v| v as u32),
            }),
        }
    }
}

/// Absolute poster URL with any profile/format placeholders filled in
fn poster_url(path: &str) -> String {
    let path = path.replace("{profile}", "s718").replace("{format}", "jpg");
    format!("{}{}", IMAGES_URL, path)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OfferRaw {
    monetization_type: Option<String>,
    presentation_type: Option<String>,
    retail_price: Option<String>,
    retail_price_value: Option<f64>,
    currency: Option<String>,
    package: PackageRaw,
    #[serde(rename = "standardWebURL")]
    standard_web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageRaw {
    clear_name: String,
    technical_name: Option<String>,
}

impl OfferRaw {
    fn into_raw_offer(self) -> RawOffer {
        RawOffer {
            service_name: self.package.clear_name,
            service_code: self.package.technical_name.unwrap_or_default(),
            url: self.standard_web_url.unwrap_or_default(),
            price: self.retail_price,
            price_value: self.retail_price_value,
            currency: self.currency,
            monetization_type: self.monetization_type.unwrap_or_default(),
            presentation_type: self.presentation_type.unwrap_or_default(),
        }
    }
}

// =============================================================================
// GraphQL Documents
// =============================================================================

const SEARCH_QUERY: &str = r#"
query GetSearchTitles(
  $searchTitlesFilter: TitleFilter!,
  $country: Country!,
  $language: Language!,
  $first: Int!,
  $formatPoster: ImageFormat,
  $profile: PosterProfile,
  $filter: OfferFilter!,
) {
  popularTitles(
    country: $country
    filter: $searchTitlesFilter
    first: $first
    sortBy: POPULAR
    sortRandomSeed: 0
  ) {
    edges {
      node {
        ...TitleDetails
        __typename
      }
      __typename
    }
    __typename
  }
}
"#;

const DETAILS_QUERY: &str = r#"
query GetTitleNode(
  $nodeId: ID!,
  $language: Language!,
  $country: Country!,
  $formatPoster: ImageFormat,
  $profile: PosterProfile,
  $filter: OfferFilter!,
) {
  node(id: $nodeId) {
    ...TitleDetails
    __typename
  }
  __typename
}
"#;

const DETAILS_FRAGMENT: &str = r#"
fragment TitleDetails on MovieOrShow {
  id
  objectId
  objectType
  content(country: $country, language: $language) {
    title
    fullPath
    originalReleaseYear
    originalReleaseDate
    runtime
    shortDescription
    genres {
      shortName
      __typename
    }
    externalIds {
      imdbId
      tmdbId
      __typename
    }
    posterUrl(profile: $profile, format: $formatPoster)
    scoring {
      imdbScore
      imdbVotes
      tmdbScore
      tomatoMeter
      __typename
    }
    __typename
  }
  __typename
}
"#;

const OFFERS_BY_COUNTRY_QUERY: &str = r#"
query GetTitleOffers(
  $nodeId: ID!,
  $language: Language!,
  $filter: OfferFilter!,
) {
  node(id: $nodeId) {
    ... on MovieOrShow {
      {country_entries}
      __typename
    }
    __typename
  }
  __typename
}
"#;

const COUNTRY_OFFERS_ENTRY: &str = r#"
      {country_code}: offers(country: {country_code}, platform: WEB, filter: $filter) {
        ...TitleOffer
        __typename
      }
"#;

const OFFER_FRAGMENT: &str = r#"
fragment TitleOffer on Offer {
  id
  monetizationType
  presentationType
  retailPrice(language: $language)
  retailPriceValue
  currency
  package {
    id
    packageId
    clearName
    technicalName
    __typename
  }
  standardWebURL
  __typename
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_country() {
        assert!(check_country("US").is_ok());
        assert!(check_country("u").is_err());
        assert!(check_country("USA").is_err());
    }

    #[test]
    fn test_offers_request_has_one_entry_per_country() {
        let countries = vec!["us".to_string(), "FR".to_string()];
        let request = offers_request("tm1", &countries, "en", false).unwrap();
        let query = request["query"].as_str().unwrap();

        assert!(query.contains("US: offers(country: US"));
        assert!(query.contains("FR: offers(country: FR"));
        assert!(!query.contains("{country_entries}"));
        assert_eq!(request["variables"]["filter"]["bestOnly"], false);
    }

    #[test]
    fn test_offers_request_rejects_empty_and_bad_codes() {
        assert!(matches!(
            offers_request("tm1", &[], "en", false),
            Err(JustWatchError::NoCountries)
        ));
        assert!(matches!(
            offers_request("tm1", &["USA".to_string()], "en", false),
            Err(JustWatchError::InvalidCountry(_))
        ));
    }

    #[test]
    fn test_search_request_uppercases_country() {
        let request = search_request("dune", "us", "en", 20, false).unwrap();
        assert_eq!(request["variables"]["country"], "US");
        assert_eq!(request["variables"]["searchTitlesFilter"]["searchQuery"], "dune");
        assert_eq!(request["operationName"], "GetSearchTitles");
    }

    #[test]
    fn test_poster_url_fills_placeholders() {
        assert_eq!(
            poster_url("/poster/123/{profile}/dune.{format}"),
            "https://images.justwatch.com/poster/123/s718/dune.jpg"
        );
    }
}
