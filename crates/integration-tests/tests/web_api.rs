//! JSON API over HTTP.
//!
//! These tests require the sample data from `crates/cli/data/sample.yaml`
//! and the web server running.

use delicious_core::GeoPoint;
use delicious_integration_tests::{client, web_base_url};
use delicious_web::db::stores::NEAR_RADIUS_METERS;
use reqwest::StatusCode;
use serde_json::Value;

async fn get_json(path: &str) -> (StatusCode, Value) {
    let resp = client()
        .get(format!("{}{path}", web_base_url()))
        .send()
        .await
        .expect("Failed to send request");
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_search_ranks_name_matches() {
    let (status, body) = get_json("/api/search?q=coffee").await;
    assert_eq!(status, StatusCode::OK);

    let hits = body.as_array().expect("search returns a list");
    assert!(!hits.is_empty());
    assert!(hits.len() <= 5);
    assert_eq!(hits[0]["slug"], "the-coffee-shop");

    let scores: Vec<f64> = hits.iter().filter_map(|h| h["score"].as_f64()).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
#[ignore = "Requires running web server"]
async fn test_blank_search_is_empty() {
    let (status, body) = get_json("/api/search?q=").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
#[ignore = "Requires running web server and database"]
async fn test_near_returns_nearest_first_within_ten_km() {
    let (status, body) = get_json("/api/stores/near?lng=-0.09&lat=51.5").await;
    assert_eq!(status, StatusCode::OK);

    let stores = body.as_array().expect("near returns a list");
    assert!(!stores.is_empty());
    assert!(stores.len() <= 10);
    assert!(stores.iter().all(|s| s["slug"] != "harbour-fish"));

    let first = &stores[0];
    assert_eq!(first["slug"], "borough-bites");
    assert_eq!(first["location"]["type"], "Point");
    assert!(first["location"]["coordinates"].as_array().is_some_and(|c| c.len() == 2));

    let origin = GeoPoint::new(-0.09, 51.5).expect("valid origin");
    let distances: Vec<f64> = stores
        .iter()
        .map(|s| {
            let point: GeoPoint =
                serde_json::from_value(s["location"]["coordinates"].clone())
                    .expect("coordinates are [lng, lat]");
            origin.distance_meters(&point)
        })
        .collect();
    assert!(distances.iter().all(|&d| d <= NEAR_RADIUS_METERS + 1.0));
    assert!(distances.windows(2).all(|w| w[0] <= w[1] + 1e-6));
}

#[tokio::test]
#[ignore = "Requires running web server"]
async fn test_near_rejects_missing_coordinates() {
    let (status, _) = get_json("/api/stores/near?lng=-0.09").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running web server"]
async fn test_heart_requires_login() {
    let resp = client()
        .post(format!("{}/api/stores/1/heart", web_base_url()))
        .send()
        .await
        .expect("Failed to post heart");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}
