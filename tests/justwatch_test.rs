//! JustWatch client tests
//!
//! Search, details and offer parsing against a mocked GraphQL endpoint, plus
//! error handling.

use mockito::{Matcher, Server};
use serde_json::json;
use streamscout::api::{JustWatchClient, JustWatchError};
use streamscout::models::ObjectType;

fn node(id: &str, title: &str, year: u16) -> serde_json::Value {
    json!({
        "id": id,
        "objectId": 92641,
        "objectType": "MOVIE",
        "content": {
            "title": title,
            "fullPath": format!("/us/movie/{}", title.to_lowercase()),
            "originalReleaseYear": year,
            "originalReleaseDate": format!("{}-11-05", year),
            "runtime": 169,
            "shortDescription": "The adventures of a group of explorers.",
            "genres": [{"shortName": "scf"}, {"shortName": "drm"}],
            "externalIds": {"imdbId": "tt0816692", "tmdbId": "157336"},
            "posterUrl": "/poster/1/{profile}/interstellar.{format}",
            "scoring": {
                "imdbScore": 8.7,
                "imdbVotes": 2100000.0,
                "tmdbScore": 8.4,
                "tomatoMeter": 73.0
            }
        }
    })
}

// =============================================================================
// Search Tests
// =============================================================================

#[tokio::test]
async fn test_search_parses_results() {
    let mut server = Server::new_async().await;

    let body = json!({
        "data": {
            "popularTitles": {
                "edges": [
                    {"node": node("tm92641", "Interstellar", 2014)},
                    {"node": node("tm1", "Interstellar: Behind", 2015)}
                ]
            }
        }
    });

    let mock = server
        .mock("POST", "/graphql")
        .match_body(Matcher::PartialJson(json!({
            "operationName": "GetSearchTitles",
            "variables": {
                "country": "US",
                "language": "en",
                "first": 20,
                "searchTitlesFilter": {"searchQuery": "interstellar"}
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let results = client
        .search("interstellar", "us", "en", 20, false)
        .await
        .unwrap();

    mock.assert_async().await;

    assert_eq!(results.len(), 2);
    let first = &results[0];
    assert_eq!(first.id, "tm92641");
    assert_eq!(first.object_type, ObjectType::Movie);
    assert_eq!(first.title, "Interstellar");
    assert_eq!(first.release_year, Some(2014));
    assert_eq!(first.release_date, "2014-11-05");
    assert_eq!(first.runtime_minutes, Some(169));
    assert_eq!(first.genre_codes, vec!["scf", "drm"]);
    assert_eq!(first.imdb_id.as_deref(), Some("tt0816692"));
    assert_eq!(
        first.url.as_deref(),
        Some("https://justwatch.com/us/movie/interstellar")
    );
    assert_eq!(
        first.poster_url.as_deref(),
        Some("https://images.justwatch.com/poster/1/s718/interstellar.jpg")
    );
    let scoring = first.scoring.as_ref().unwrap();
    assert_eq!(scoring.imdb_votes, Some(2_100_000));
    assert_eq!(scoring.tomato_meter, Some(73));

    // Upstream order is kept
    assert_eq!(results[1].id, "tm1");
}

#[tokio::test]
async fn test_search_tolerates_missing_optional_fields() {
    let mut server = Server::new_async().await;

    let body = json!({
        "data": {
            "popularTitles": {
                "edges": [{
                    "node": {
                        "id": "ts1",
                        "objectType": "SHOW",
                        "content": {"title": "Bare"}
                    }
                }]
            }
        }
    });

    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let results = client.search("bare", "GB", "en", 5, false).await.unwrap();

    assert_eq!(results.len(), 1);
    let record = &results[0];
    assert_eq!(record.object_type, ObjectType::Show);
    assert_eq!(record.release_year, None);
    assert_eq!(record.release_date, "");
    assert_eq!(record.short_description, "");
    assert!(record.genre_codes.is_empty());
    assert!(record.poster_url.is_none());
    assert!(record.scoring.is_none());
}

#[tokio::test]
async fn test_search_rejects_bad_country_without_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/graphql")
        .expect(0)
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let err = client.search("x", "USA", "en", 5, false).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, JustWatchError::InvalidCountry(c) if c == "USA"));
}

#[tokio::test]
async fn test_search_graphql_errors() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(r#"{"errors":[{"message":"Invalid language"}],"data":null}"#)
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let err = client.search("x", "US", "zz", 5, false).await.unwrap_err();
    assert!(matches!(err, JustWatchError::InvalidResponse(msg) if msg.contains("Invalid language")));
}

// =============================================================================
// Details Tests
// =============================================================================

#[tokio::test]
async fn test_details_returns_record() {
    let mut server = Server::new_async().await;
    let body = json!({"data": {"node": node("tm92641", "Interstellar", 2014)}});

    server
        .mock("POST", "/graphql")
        .match_body(Matcher::PartialJson(json!({
            "operationName": "GetTitleNode",
            "variables": {"nodeId": "tm92641", "country": "FR"}
        })))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let record = client
        .details("tm92641", "fr", "fr", false)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.title, "Interstellar");
}

#[tokio::test]
async fn test_details_unknown_id_is_none() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(r#"{"errors":[{"message":"node not found"}],"data":{"node":null}}"#)
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let record = client.details("tm0", "US", "en", false).await.unwrap();
    assert!(record.is_none());
}

#[tokio::test]
async fn test_details_empty_errors_array_is_not_an_error() {
    let mut server = Server::new_async().await;
    let body = json!({"errors": [], "data": {"node": node("tm92641", "Interstellar", 2014)}});

    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let record = client.details("tm92641", "US", "en", false).await.unwrap();
    assert_eq!(record.map(|r| r.id).as_deref(), Some("tm92641"));
}

// =============================================================================
// Offers Tests
// =============================================================================

fn offer(name: &str, url: &str, price: Option<&str>, kind: &str) -> serde_json::Value {
    json!({
        "id": "of1",
        "monetizationType": kind,
        "presentationType": "HD",
        "retailPrice": price,
        "retailPriceValue": null,
        "currency": "USD",
        "package": {"id": "p1", "packageId": 9, "clearName": name, "technicalName": "tech"},
        "standardWebURL": url
    })
}

#[tokio::test]
async fn test_offers_for_countries() {
    let mut server = Server::new_async().await;

    let body = json!({
        "data": {
            "node": {
                "US": [
                    offer("Netflix", "https://netflix.com/t", None, "FLATRATE"),
                    offer("Apple TV", "https://tv.apple.com/t", Some("$3.99"), "RENT")
                ],
                "FR": [],
                "DE": null
            }
        }
    });

    let mock = server
        .mock("POST", "/graphql")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({
                "operationName": "GetTitleOffers",
                "variables": {"nodeId": "tm92641", "filter": {"bestOnly": false}}
            })),
            Matcher::Regex("US: offers\\(country: US".into()),
            Matcher::Regex("JP: offers\\(country: JP".into()),
        ]))
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let countries: Vec<String> = ["us", "FR", "DE", "JP"].iter().map(|c| c.to_string()).collect();
    let client = JustWatchClient::with_base_url(server.url());
    let offers = client
        .offers_for_countries("tm92641", &countries, "en", false)
        .await
        .unwrap();

    mock.assert_async().await;

    // Every requested country is present, upper-cased
    assert_eq!(
        offers.keys().collect::<Vec<_>>(),
        vec!["DE", "FR", "JP", "US"]
    );
    assert!(offers["FR"].is_empty());
    assert!(offers["DE"].is_empty());
    assert!(offers["JP"].is_empty());

    let us = &offers["US"];
    assert_eq!(us.len(), 2);
    assert_eq!(us[0].service_name, "Netflix");
    assert_eq!(us[0].url, "https://netflix.com/t");
    assert_eq!(us[0].price, None);
    assert_eq!(us[0].monetization_type, "FLATRATE");
    assert_eq!(us[1].price.as_deref(), Some("$3.99"));
}

#[tokio::test]
async fn test_offers_empty_country_set_makes_no_request() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/graphql")
        .expect(0)
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let offers = client
        .offers_for_countries("tm1", &[], "en", false)
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(offers.is_empty());
}

#[tokio::test]
async fn test_offers_unknown_title_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(r#"{"data":{"node":null}}"#)
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let err = client
        .offers_for_countries("tm0", &["US".to_string()], "en", false)
        .await
        .unwrap_err();
    assert!(matches!(err, JustWatchError::NotFound(id) if id == "tm0"));
}

#[tokio::test]
async fn test_offers_empty_errors_array_still_parses() {
    let mut server = Server::new_async().await;
    let body = json!({
        "errors": [],
        "data": {"node": {"US": [offer("Netflix", "https://n", None, "FLATRATE")]}}
    });
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let offers = client
        .offers_for_countries("tm92641", &["US".to_string()], "en", false)
        .await
        .unwrap();
    assert_eq!(offers["US"].len(), 1);
}

// =============================================================================
// Transport Errors
// =============================================================================

#[tokio::test]
async fn test_http_error_status() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(503)
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let err = client.search("x", "US", "en", 5, false).await.unwrap_err();
    assert!(matches!(err, JustWatchError::Http(503)));
}

#[tokio::test]
async fn test_malformed_json() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/graphql")
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = JustWatchClient::with_base_url(server.url());
    let err = client.search("x", "US", "en", 5, false).await.unwrap_err();
    assert!(matches!(err, JustWatchError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_connection_refused() {
    // Nothing listens on port 9 locally
    let client = JustWatchClient::with_base_url("http://127.0.0.1:9");
    let err = client.search("x", "US", "en", 5, false).await.unwrap_err();
    assert!(matches!(err, JustWatchError::RequestFailed(_)));
}
