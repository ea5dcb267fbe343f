//! Catalog lookup
//!
//! Free-text title search with loose country/language coercion. Codes are
//! only trimmed and re-cased here; anything else is left to the backend.

use crate::api::{CatalogSource, JustWatchError};
use crate::models::TitleRecord;

/// Number of candidates requested per search
pub const SEARCH_LIMIT: usize = 20;

/// Search titles, preserving the backend's result order
pub async fn search_titles<S>(
    source: &S,
    query: &str,
    country: &str,
    language: &str,
) -> Result<Vec<TitleRecord>, JustWatchError>
where
    S: CatalogSource + ?Sized,
{
    let country = normalize_country(country);
    let language = normalize_language(language);
    tracing::debug!(query, %country, %language, "searching titles");

    source
        .search_titles(query, &country, &language, SEARCH_LIMIT)
        .await
}

/// First two characters, upper-cased
pub fn normalize_country(code: &str) -> String {
    code.chars().take(2).collect::<String>().to_uppercase()
}

/// First two characters, lower-cased
pub fn normalize_language(code: &str) -> String {
    code.chars().take(2).collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_country() {
        assert_eq!(normalize_country("us"), "US");
        assert_eq!(normalize_country("usa"), "US");
        assert_eq!(normalize_country("Fr"), "FR");
        assert_eq!(normalize_country("x"), "X");
        assert_eq!(normalize_country(""), "");
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("EN"), "en");
        assert_eq!(normalize_language("english"), "en");
        assert_eq!(normalize_language("es-ES"), "es");
    }
}
