mod support;

use axum::http::StatusCode;
use marketplace_daemon::{http_server, ServiceState};

use support::*;

fn product_uri(contract: &str, product: &str, rest: &str) -> String {
    format!("/api/v0/contracts/{contract}/products/{product}{rest}")
}

#[tokio::test]
async fn test_unknown_contract_is_not_found() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app, &product_uri("c-missing", "0", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Contract not found.");
}

#[tokio::test]
async fn test_non_numeric_product_is_bad_request() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app, &product_uri(DIAMOND, "first", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_missing_offers_and_pools() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app.clone(), &product_uri(DIAMOND_NO_OFFERS, "0", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Offers not found.");

    let (status, body) = get_json(app, &product_uri(CLASSIC_NO_POOL, "0", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "OfferPools not found.");
}

#[tokio::test]
async fn test_listing_envelope() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app, &product_uri(DIAMOND, "0", "?fromToken=1&toToken=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["totalCount"], 12);
    assert_eq!(token_numbers(&body), vec!["0", "1", "2", "3", "4"]);

    let first = &body["result"]["tokens"][0];
    assert_eq!(first["offer"]["id"], "o0");
    assert_eq!(first["offer"]["price"], "100");
    assert_eq!(first["metadata"]["attributes"][0]["trait_type"], "Color");
    assert_eq!(first["metadata"]["attributes"][0]["count"], 3);
    assert_eq!(first["metadata"]["attributes"][0]["percentage"], 60.0);
}

#[tokio::test]
async fn test_token_bounds_compare_numerically() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(
        app.clone(),
        &product_uri(DIAMOND, "0", "?fromToken=11&toToken=20"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(token_numbers(&body), vec!["10", "11"]);
    // the count ignores the lower bound
    assert_eq!(body["result"]["totalCount"], 12);

    let (_, body) = get_json(app, &product_uri(DIAMOND, "0", "?sortByToken=-1")).await;
    let tokens = token_numbers(&body);
    assert_eq!(&tokens[..3], &["11", "10", "9"]);
}

#[tokio::test]
async fn test_for_sale_filter() {
    let (db, app) = seeded_router().await;

    let (_, body) = get_json(app.clone(), &product_uri(DIAMOND, "0", "?forSale=true")).await;
    assert_eq!(body["result"]["totalCount"], 8);
    assert_eq!(
        token_numbers(&body),
        vec!["2", "3", "4", "7", "8", "9", "10", "11"]
    );

    let (_, body) = get_json(app.clone(), &product_uri(DIAMOND, "0", "?forSale=false")).await;
    assert_eq!(body["result"]["totalCount"], 4);
    assert_eq!(token_numbers(&body), vec!["0", "1", "5", "6"]);

    db.set_server_setting(common::prelude::ServerSetting {
        only_minted_tokens_result: true,
    })
    .await
    .unwrap();
    let (_, body) = get_json(app, &product_uri(DIAMOND, "0", "?forSale=true")).await;
    assert_eq!(body["result"]["totalCount"], 4);
}

#[tokio::test]
async fn test_price_range_and_sort() {
    let (_db, app) = seeded_router().await;

    // "1000" must not fall between "200" and "300"
    let (_, body) = get_json(
        app.clone(),
        &product_uri(DIAMOND, "0", "?priceFrom=200&priceTo=300"),
    )
    .await;
    assert_eq!(body["result"]["totalCount"], 5);
    assert_eq!(token_numbers(&body), vec!["5", "6", "7", "8", "9"]);

    let (_, body) = get_json(app, &product_uri(DIAMOND, "0", "?sortByPrice=-1")).await;
    let tokens = token_numbers(&body);
    assert_eq!(&tokens[..3], &["10", "11", "5"]);
    assert_eq!(tokens.last().map(String::as_str), Some("4"));
}

#[tokio::test]
async fn test_metadata_filters_match_any_trait() {
    let (_db, app) = seeded_router().await;

    // {"Color":["Red"]}
    let (_, body) = get_json(
        app.clone(),
        &product_uri(
            DIAMOND,
            "0",
            "?metadataFilters=%7B%22Color%22%3A%5B%22Red%22%5D%7D",
        ),
    )
    .await;
    assert_eq!(body["result"]["totalCount"], 6);
    assert_eq!(token_numbers(&body), vec!["0", "2", "4", "6", "8", "10"]);

    // {"Color":["Red"],"Level":["3"]}
    let (_, body) = get_json(
        app.clone(),
        &product_uri(
            DIAMOND,
            "0",
            "?metadataFilters=%7B%22Color%22%3A%5B%22Red%22%5D%2C%22Level%22%3A%5B%223%22%5D%7D",
        ),
    )
    .await;
    assert_eq!(body["result"]["totalCount"], 7);

    let (status, body) =
        get_json(app, &product_uri(DIAMOND, "0", "?metadataFilters=not-json")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["totalCount"], 12);
}

#[tokio::test]
async fn test_on_resale_listing() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app, &product_uri(DIAMOND, "0", "?onResale=true")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["totalCount"], 2);
    assert_eq!(token_numbers(&body), vec!["1", "3"]);
    assert_eq!(body["result"]["tokens"][0]["resaleData"]["id"], "r1-active");
}

#[tokio::test]
async fn test_invalid_params_are_bad_request() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app.clone(), &product_uri(DIAMOND, "0", "?fromToken=abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = get_json(app.clone(), &product_uri(DIAMOND, "0", "?sortByPrice=up")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get_json(app, &product_uri(DIAMOND, "0", "?priceFrom=1.5")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_token_numbers_route() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app, &product_uri(CLASSIC, "1", "/tokenNumbers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["tokens"],
        serde_json::json!(["0", "1", "2", "3", "4", "5"])
    );
}

#[tokio::test]
async fn test_attributes_are_classified_and_cached() {
    let (db, app) = seeded_router().await;
    assert!(db.product_attributes(DIAMOND, 0).await.unwrap().is_none());

    let (status, body) = get_json(app, &product_uri(DIAMOND, "0", "/attributes")).await;
    assert_eq!(status, StatusCode::OK);

    let traits = body["attributes"]["attributes"].as_array().unwrap();
    assert_eq!(traits.len(), 2);
    assert_eq!(traits[0]["name"], "Color");
    assert_eq!(
        traits[0]["values"],
        serde_json::json!([
            {"value": "Blue", "count": 6},
            {"value": "Red", "count": 6}
        ])
    );
    assert_eq!(traits[1]["name"], "Level");
    assert_eq!(traits[1]["values"].as_array().unwrap().len(), 12);
    assert_eq!(traits[1]["values"][2]["value"], "2");

    let cached = db.product_attributes(DIAMOND, 0).await.unwrap().unwrap();
    assert_eq!(cached.attributes.len(), 2);
}

#[tokio::test]
async fn test_product_files_require_user() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app.clone(), &product_uri(DIAMOND, "0", "/files")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");

    let (status, body) =
        get_json_as(app, &product_uri(DIAMOND, "0", "/files"), Some("0xalice")).await;
    assert_eq!(status, StatusCode::OK);

    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 3);
    assert_eq!(files[0]["id"], "f-alpha");
    assert_eq!(files[0]["isUnlocked"], true);
    assert_eq!(files[1]["id"], "f-bravo");
    assert_eq!(files[1]["isUnlocked"], false);
    assert!(files[0].get("key").is_none());
}

#[tokio::test]
async fn test_token_files() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app.clone(), &product_uri(DIAMOND, "0", "/files/2")).await;
    assert_eq!(status, StatusCode::OK);
    let files = body["files"].as_array().unwrap();
    assert_eq!(files.len(), 4);
    assert!(files.iter().all(|f| f["isUnlocked"] == false));

    let (_, body) = get_json_as(
        app.clone(),
        &product_uri(DIAMOND, "0", "/files/2"),
        Some("0xAlice"),
    )
    .await;
    assert_eq!(body["files"][0]["isUnlocked"], true);

    let (status, body) = get_json(app, &product_uri(DIAMOND, "0", "/files/0")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"], serde_json::json!([]));
}

#[tokio::test]
async fn test_product_offers() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app.clone(), &product_uri(DIAMOND, "0", "/offers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["product"]["name"], "Genesis");
    assert_eq!(body["product"]["owner"], "0xcreator");
    assert_eq!(body["product"]["offers"].as_array().unwrap().len(), 3);

    let (status, body) = get_json(app, &product_uri(DIAMOND, "5", "/offers")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Product not found.");
}

#[tokio::test]
async fn test_product_locks() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app.clone(), &product_uri(DIAMOND, "0", "/locks")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locks"][0]["id"], "o1");

    let (status, body) = get_json(app, &product_uri(CLASSIC, "1", "/locks")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No locks found");
}

#[tokio::test]
async fn test_single_token() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app.clone(), &product_uri(DIAMOND, "0", "/token/7")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"]["token"], "7");
    assert_eq!(body["token"]["offer"]["id"], "o1");

    let (status, body) = get_json(app, &product_uri(DIAMOND, "0", "/token/70")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Token not found.");
}

#[tokio::test]
async fn test_status_and_fallback_routes() {
    let (_db, app) = seeded_router().await;

    let (status, body) = get_json(app.clone(), "/_status/livez").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _) = get_json(app.clone(), "/_status/readyz").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get_json(app, "/api/v0/nothing/here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "not found");
}

#[tokio::test]
async fn test_readiness_reports_shutdown() {
    let db = seeded_db().await;
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
    let state = ServiceState::from_database(db).with_shutdown(shutdown_rx);
    let app = http_server::router(state);

    let (status, _) = get_json(app.clone(), "/_status/readyz").await;
    assert_eq!(status, StatusCode::OK);

    shutdown_tx.send(()).unwrap();

    let (status, body) = get_json(app.clone(), "/_status/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "failure");
    assert_eq!(body["message"], "service is shutting down");

    // liveness is unaffected while draining
    let (status, _) = get_json(app, "/_status/livez").await;
    assert_eq!(status, StatusCode::OK);
}
