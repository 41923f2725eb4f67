// PokéAPI client scenarios against a local httpmock server (no network).

use dex_catalog::{CatalogUpstream, EntityKey, PageWindow, PokeApiClient, UpstreamError};
use httpmock::prelude::*;
use serde_json::json;

fn client_for(server: &MockServer) -> PokeApiClient {
    PokeApiClient::new_with_base_url(server.base_url()).expect("client build")
}

fn pokemon_body(id: i64, name: &str, types: &[&str]) -> serde_json::Value {
    let types: Vec<_> = types
        .iter()
        .enumerate()
        .map(|(i, t)| json!({"slot": i + 1, "type": {"name": t, "url": ""}}))
        .collect();
    json!({
        "id": id,
        "name": name,
        "types": types,
        "sprites": {"front_default": format!("https://img/{id}.png"), "other": {}}
    })
}

fn species_body(text_es: &str) -> serde_json::Value {
    json!({
        "id": 25,
        "flavor_text_entries": [
            {"flavor_text": "english text", "language": {"name": "en", "url": ""}},
            {"flavor_text": text_es, "language": {"name": "es", "url": ""}}
        ]
    })
}

// ---------------------------------------------------------------------------
// fetch_page clamps the limit before the request is made
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_page_never_requests_more_than_50() {
    let server = MockServer::start_async().await;
    let listing = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pokemon")
                .query_param("limit", "50")
                .query_param("offset", "100");
            then.status(200).json_body(json!({
                "count": 1302,
                "results": [
                    {"name": "bulbasaur", "url": ""},
                    {"name": "ivysaur", "url": ""}
                ]
            }));
        })
        .await;

    let client = client_for(&server);
    let names = client
        .fetch_page(PageWindow::new(500, 100))
        .await
        .expect("page");

    listing.assert_async().await;
    assert_eq!(names, vec!["bulbasaur", "ivysaur"]);
}

// ---------------------------------------------------------------------------
// fetch_total_count
// ---------------------------------------------------------------------------

#[tokio::test]
async fn total_count_reads_count_field_with_page_size_one() {
    let server = MockServer::start_async().await;
    let m = server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon").query_param("limit", "1");
            then.status(200)
                .json_body(json!({"count": 1302, "results": [{"name": "bulbasaur", "url": ""}]}));
        })
        .await;

    assert_eq!(client_for(&server).fetch_total_count().await, 1302);
    m.assert_async().await;
}

#[tokio::test]
async fn total_count_falls_back_to_zero_on_failure() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon");
            then.status(500);
        })
        .await;

    assert_eq!(client_for(&server).fetch_total_count().await, 0);
}

#[tokio::test]
async fn total_count_falls_back_to_zero_on_garbage_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon");
            then.status(200).body("not json");
        })
        .await;

    assert_eq!(client_for(&server).fetch_total_count().await, 0);
}

// ---------------------------------------------------------------------------
// fetch_detail
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_detail_merges_both_payloads() {
    let server = MockServer::start_async().await;
    let p = server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon/pikachu");
            then.status(200)
                .json_body(pokemon_body(25, "pikachu", &["electric"]));
        })
        .await;
    let s = server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon-species/pikachu");
            then.status(200).json_body(species_body("Ratón eléctrico."));
        })
        .await;

    let key = EntityKey::parse("PIKACHU").unwrap();
    let detail = client_for(&server).fetch_detail(&key).await.expect("detail");

    p.assert_async().await;
    s.assert_async().await;
    assert_eq!(detail.primary.id, 25);
    assert_eq!(detail.primary.types[0].kind.name, "electric");
    assert_eq!(detail.secondary.flavor_text_entries.len(), 2);
}

#[tokio::test]
async fn fetch_detail_404_on_both_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon/missingmon");
            then.status(404).body("Not Found");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon-species/missingmon");
            then.status(404).body("Not Found");
        })
        .await;

    let key = EntityKey::parse("missingmon").unwrap();
    let err = client_for(&server).fetch_detail(&key).await.unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {err}");
}

#[tokio::test]
async fn fetch_detail_404_on_species_only_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon/10001");
            then.status(200)
                .json_body(pokemon_body(10001, "deoxys-attack", &["psychic"]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon-species/10001");
            then.status(404);
        })
        .await;

    let err = client_for(&server)
        .fetch_detail(&EntityKey::Id(10001))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn fetch_detail_server_error_is_unavailable() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon/pikachu");
            then.status(503);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/pokemon-species/pikachu");
            then.status(200).json_body(species_body("x"));
        })
        .await;

    let err = client_for(&server)
        .fetch_detail(&EntityKey::parse("pikachu").unwrap())
        .await
        .unwrap_err();
    match err {
        UpstreamError::Unavailable { resource, detail } => {
            assert_eq!(resource, "pokemon/pikachu");
            assert_eq!(detail, "http status 503");
        }
        other => panic!("expected Unavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_upstream_is_unavailable() {
    // Nothing listens on port 9 on a test host.
    let client = PokeApiClient::new_with_base_url("http://127.0.0.1:9".to_string()).unwrap();
    let err = client
        .fetch_detail(&EntityKey::parse("pikachu").unwrap())
        .await
        .unwrap_err();
    assert!(!err.is_not_found());
}

// ---------------------------------------------------------------------------
// fetch_by_category
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_by_category_truncates_to_limit_in_order() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/type/fire");
            then.status(200).json_body(json!({
                "name": "fire",
                "pokemon": [
                    {"slot": 1, "pokemon": {"name": "charmander", "url": ""}},
                    {"slot": 1, "pokemon": {"name": "charmeleon", "url": ""}},
                    {"slot": 1, "pokemon": {"name": "charizard", "url": ""}}
                ]
            }));
        })
        .await;

    let names = client_for(&server)
        .fetch_by_category("FIRE", 2)
        .await
        .expect("category");
    assert_eq!(names, vec!["charmander", "charmeleon"]);
}

#[tokio::test]
async fn fetch_by_unknown_category_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/type/plasma");
            then.status(404);
        })
        .await;

    let err = client_for(&server)
        .fetch_by_category("plasma", 10)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        UpstreamError::NotFound {
            resource: "type/plasma".to_string()
        }
    );
}
