use recipe_mixer::api_connection::{FoodDataError, MeasureUnit};
use recipe_mixer::config::FoodDataConfig;
use recipe_mixer::food_catalog::{CandidateSource, FoodCandidate, FoodCatalogClient, NutrientSnapshot};
use recipe_mixer::nutrition_aggregator::compute_rows;
use recipe_mixer::recipe_session::{RecipeSession, SEARCH_PLACEHOLDER};
use recipe_mixer::request_cache::RequestCache;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PARSER: &str = "/api/food-database/v2/parser";
const NUTRIENTS: &str = "/api/food-database/v2/nutrients";

fn create_test_config(server_url: &str) -> FoodDataConfig {
    let mut config = FoodDataConfig::new("test-app-id", "test-app-key");
    config.base_url = server_url.to_string();
    config
}

fn banana_search_body() -> serde_json::Value {
    json!({
        "text": "banana",
        "parsed": [{ "food": { "foodId": "b1", "label": "Banana" } }],
        "hints": [{ "food": { "foodId": "b2", "label": "Banana, raw" } }]
    })
}

fn banana_nutrients_body() -> serde_json::Value {
    json!({
        "calories": 89,
        "totalNutrients": {
            "CHOCDF": { "label": "Carbs", "quantity": 23, "unit": "g" },
            "PROCNT": { "label": "Protein", "quantity": 1.1, "unit": "g" }
        },
        "ingredients": [{ "parsed": [{ "food": "Banana", "foodId": "b1" }] }]
    })
}

async fn mount_banana_search(server: &MockServer, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(PARSER))
        .and(query_param("ingr", "banana"))
        .and(query_param("nutrition-type", "cooking"))
        .and(query_param("app_id", "test-app-id"))
        .and(query_param("app_key", "test-app-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(banana_search_body()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_banana_nutrients(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(NUTRIENTS))
        .and(body_json(json!({
            "ingredients": [{
                "quantity": 1.0,
                "measureURI": "http://www.edamam.com/ontologies/edamam.owl#Measure_gram",
                "foodId": "b1"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(banana_nutrients_body()))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn search_orders_parsed_before_hints() {
    let server = MockServer::start().await;
    mount_banana_search(&server, 1).await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    let candidates = client.search("banana").await.unwrap();
    assert_eq!(
        candidates,
        vec![
            FoodCandidate {
                food_id: "b1".into(),
                label: "Banana".into(),
                source: CandidateSource::Parsed
            },
            FoodCandidate {
                food_id: "b2".into(),
                label: "Banana, raw".into(),
                source: CandidateSource::Hint
            },
        ]
    );
}

#[tokio::test]
async fn search_respects_explicit_limit() {
    let server = MockServer::start().await;
    mount_banana_search(&server, 1).await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    let candidates = client.search_limited("  banana ", 1).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].source, CandidateSource::Parsed);
}

#[tokio::test]
async fn blank_search_makes_no_request() {
    let server = MockServer::start().await;
    mount_banana_search(&server, 0).await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    assert!(client.search("   ").await.unwrap().is_empty());
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn search_with_no_matches_is_empty_not_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PARSER))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "text": "xyzzy" })))
        .mount(&server)
        .await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    assert!(client.search("xyzzy").await.unwrap().is_empty());
}

#[tokio::test]
async fn search_reports_error_status_as_upstream_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PARSER))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .expect(2)
        .mount(&server)
        .await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    let err = client.search("banana").await.unwrap_err();
    assert!(err.is_upstream_failure());
    assert!(err.to_string().contains("401"));
    assert!(!err.to_string().contains("test-app-key"));

    // failures are not cached
    assert!(client.search("banana").await.is_err());
    assert!(client.cache().is_empty());
}

#[tokio::test]
async fn error_body_echoing_credentials_is_not_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PARSER))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string("Unauthorized app_id=test-app-id app_key=test-app-key"),
        )
        .mount(&server)
        .await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    let message = client.search("banana").await.unwrap_err().to_string();
    assert!(!message.contains("test-app-id"));
    assert!(!message.contains("test-app-key"));
}

#[tokio::test]
async fn unreachable_service_is_upstream_failure_without_credentials() {
    // nothing listens on this port
    let client = FoodCatalogClient::new(&create_test_config("http://127.0.0.1:9"));
    let err = client.search("banana").await.unwrap_err();
    assert!(matches!(err, FoodDataError::UpstreamUnavailable(_)));
    assert!(!err.to_string().contains("test-app-key"));
}

#[tokio::test]
async fn search_with_unexpected_shape_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PARSER))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "parsed": [{ "food": { "label": "No id" } }] })),
        )
        .mount(&server)
        .await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    let err = client.search("banana").await.unwrap_err();
    assert!(matches!(err, FoodDataError::MalformedResponse(_)));
}

#[tokio::test]
async fn fetch_nutrients_is_served_from_cache_the_second_time() {
    let server = MockServer::start().await;
    mount_banana_nutrients(&server, 1).await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    let first = client.fetch_nutrients("b1", 1.0, MeasureUnit::Gram).await.unwrap();
    let second = client.fetch_nutrients("b1", 1.0, MeasureUnit::Gram).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        first,
        NutrientSnapshot {
            ingredient_label: "Banana".into(),
            calories_per_unit: 89.0,
            carb_per_unit: 23.0,
            fat_per_unit: 0.0,
            protein_per_unit: 1.1,
        }
    );
    assert_eq!(client.cache().len(), 1);
}

#[tokio::test]
async fn shared_cache_serves_other_clients() {
    let server = MockServer::start().await;
    mount_banana_nutrients(&server, 1).await;
    let config = create_test_config(&server.uri());
    let cache = Arc::new(RequestCache::new());
    let first_client = FoodCatalogClient::with_cache(&config, cache.clone());
    let second_client = FoodCatalogClient::with_cache(&config, cache);

    first_client.fetch_nutrients("b1", 1.0, MeasureUnit::Gram).await.unwrap();
    second_client.fetch_nutrients("b1", 1.0, MeasureUnit::Gram).await.unwrap();
}

async fn mount_single_hint(server: &MockServer, food_id: &str) {
    Mock::given(method("GET"))
        .and(path(PARSER))
        .and(query_param("ingr", "banana"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hints": [{ "food": { "foodId": food_id, "label": "Banana" } }]
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn shared_cache_keeps_hosts_apart() {
    let server_a = MockServer::start().await;
    let server_b = MockServer::start().await;
    mount_single_hint(&server_a, "A").await;
    mount_single_hint(&server_b, "B").await;

    let cache = Arc::new(RequestCache::new());
    let client_a = FoodCatalogClient::with_cache(&create_test_config(&server_a.uri()), cache.clone());
    let client_b = FoodCatalogClient::with_cache(&create_test_config(&server_b.uri()), cache.clone());

    let from_a = client_a.search("banana").await.unwrap();
    let from_b = client_b.search("banana").await.unwrap();

    assert_eq!(from_a[0].food_id, "A");
    assert_eq!(from_b[0].food_id, "B");
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn fetch_scaled_banana_row() {
    let server = MockServer::start().await;
    mount_banana_nutrients(&server, 1).await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    let snapshot = client.fetch_nutrients("b1", 1.0, MeasureUnit::Gram).await.unwrap();
    let table = compute_rows(&[recipe_mixer::nutrition_aggregator::SelectedIngredient {
        food_id: "b1".into(),
        measure: MeasureUnit::Gram,
        snapshot,
        quantity: 2.0,
    }]);

    let row = &table.rows[0];
    assert_eq!(row.kcal, 178.0);
    assert_eq!(row.carb, 46.0);
    assert_eq!(row.fat, 0.0);
    assert_eq!(row.protein, 2.2);
    assert_eq!(table.total.kcal, 178.0);
}

#[tokio::test]
async fn fetch_without_label_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(NUTRIENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "calories": 0,
            "totalNutrients": {},
            "ingredients": [{}]
        })))
        .mount(&server)
        .await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    let err = client.fetch_nutrients("zz", 1.0, MeasureUnit::Serving).await.unwrap_err();
    assert!(matches!(err, FoodDataError::MalformedResponse(_)));
}

#[tokio::test]
async fn unknown_measure_fails_before_any_request() {
    let server = MockServer::start().await;
    mount_banana_nutrients(&server, 0).await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    let err = client.fetch_nutrients_named("b1", 1.0, "cup").await.unwrap_err();
    assert!(matches!(err, FoodDataError::UnknownMeasure(_)));
}

#[tokio::test]
async fn invalid_fetch_arguments_are_rejected_locally() {
    let server = MockServer::start().await;
    mount_banana_nutrients(&server, 0).await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));

    assert!(matches!(
        client.fetch_nutrients("", 1.0, MeasureUnit::Gram).await,
        Err(FoodDataError::InvalidRequest(_))
    ));
    assert!(matches!(
        client.fetch_nutrients("b1", 0.0, MeasureUnit::Gram).await,
        Err(FoodDataError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn session_adds_searched_ingredient() {
    let server = MockServer::start().await;
    mount_banana_search(&server, 1).await;
    mount_banana_nutrients(&server, 1).await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));
    let mut session = RecipeSession::new(&client, true);
    assert_eq!(session.placeholder(), Some(SEARCH_PLACEHOLDER));

    session.search("banana").await.unwrap();
    assert_eq!(session.candidate_placeholder(), "Banana");

    session.add_ingredient("b1", Some(2.0), "gram").await.unwrap();
    // same food again, snapshot comes from the cache
    let table = session.add_ingredient("b1", None, "gram").await.unwrap();

    assert_eq!(session.placeholder(), None);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1].kcal, 0.0);
    assert_eq!(table.total.kcal, 178.0);
}

#[tokio::test]
async fn session_keeps_list_unchanged_when_fetch_fails() {
    let server = MockServer::start().await;
    mount_banana_search(&server, 1).await;
    Mock::given(method("POST"))
        .and(path(NUTRIENTS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ingredients": [] })))
        .mount(&server)
        .await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));
    let mut session = RecipeSession::new(&client, true);

    session.search("banana").await.unwrap();
    let err = session.add_ingredient("b1", Some(1.0), "gram").await.unwrap_err();
    assert!(matches!(err, FoodDataError::MalformedResponse(_)));
    assert!(session.ingredients().is_empty());
    assert!(session.table().is_empty());
}

#[tokio::test]
async fn session_rejects_ids_not_from_last_search() {
    let server = MockServer::start().await;
    mount_banana_search(&server, 1).await;
    mount_banana_nutrients(&server, 0).await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));
    let mut session = RecipeSession::new(&client, true);

    session.search("banana").await.unwrap();
    let err = session.add_ingredient("other", Some(1.0), "gram").await.unwrap_err();
    assert!(matches!(err, FoodDataError::InvalidRequest(_)));
    let err = session.add_ingredient("b1", Some(1.0), "pinch").await.unwrap_err();
    assert!(matches!(err, FoodDataError::UnknownMeasure(_)));
}

#[tokio::test]
async fn session_quantity_edit_recomputes_totals() {
    let server = MockServer::start().await;
    mount_banana_search(&server, 1).await;
    mount_banana_nutrients(&server, 1).await;
    let client = FoodCatalogClient::new(&create_test_config(&server.uri()));
    let mut session = RecipeSession::new(&client, false);

    session.search("banana").await.unwrap();
    session.add_ingredient("b1", Some(1.0), "gram").await.unwrap();
    session.add_ingredient("b1", Some(1.0), "gram").await.unwrap();
    assert_eq!(session.ingredients().len(), 1);
    assert_eq!(session.ingredients()[0].quantity, 2.0);

    let table = session.set_quantity(0, Some(3.0)).unwrap();
    assert_eq!(table.total.kcal, 267.0);
    assert!(session.set_quantity(4, Some(1.0)).is_none());
}
