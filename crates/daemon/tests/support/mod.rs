//! Shared marketplace fixture for integration tests.
//!
//! Diamond contract `c-diamond`, product 0: offers `o0` `[0, 4]` @ 100,
//! `o1` `[5, 9]` @ 250, `o2` `[10, 14]` @ 1000, and tokens `0..=11`.
//! Tokens 0 and 1 are minted to `0xAlice`, 5 and 6 to `0xBob`.
//! Even tokens are `Red`, odd tokens `Blue`; `Level` is the token number.
//!
//! Classic contract `c-classic`, product 1: pool index 7 with offers at
//! offer index 0 and 1, and tokens `0..=5`. Token `99` belongs to pool 8.

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use common::prelude::{
    Contract, File, MintedToken, NftMetadata, Offer, OfferPool, Product, ResaleTokenOffer,
    TokenAttribute, Unlock,
};
use marketplace_daemon::{http_server, Database, ServiceState};

pub const DIAMOND: &str = "c-diamond";
pub const CLASSIC: &str = "c-classic";
pub const DIAMOND_NO_OFFERS: &str = "c-diamond-empty";
pub const CLASSIC_NO_POOL: &str = "c-classic-empty";

pub async fn setup_test_db() -> Database {
    let db_url = url::Url::parse("sqlite::memory:").unwrap();
    Database::connect(&db_url).await.unwrap()
}

pub async fn seeded_db() -> Database {
    let db = setup_test_db().await;
    seed(&db).await;
    db
}

pub async fn seeded_router() -> (Database, Router) {
    let db = seeded_db().await;
    let router = http_server::router(ServiceState::from_database(db.clone()));
    (db, router)
}

fn contract(id: &str, diamond: bool) -> Contract {
    Contract {
        id: id.to_string(),
        blockchain: "0x89".to_string(),
        contract_address: format!("0xaddr-{id}"),
        diamond,
        user: "0xcreator".to_string(),
    }
}

fn offer(id: &str, contract: &str, product: i64, range: [&str; 2], price: &str) -> Offer {
    Offer {
        id: id.to_string(),
        contract: contract.to_string(),
        product,
        offer_pool: None,
        offer_index: None,
        diamond_range_index: None,
        range: [range[0].to_string(), range[1].to_string()],
        price: price.to_string(),
        offer_name: format!("Offer {id}"),
        copies: 5,
        locked_copies: 0,
    }
}

fn token(contract: &str, n: u32, offer: i64, offer_pool: Option<i64>) -> MintedToken {
    let color = if n % 2 == 0 { "Red" } else { "Blue" };
    MintedToken {
        id: format!("{contract}-t{n}"),
        contract: contract.to_string(),
        token: n.to_string(),
        unique_index_in_contract: n.to_string(),
        is_minted: false,
        owner_address: None,
        offer,
        offer_pool,
        metadata: NftMetadata {
            name: format!("Token #{n}"),
            description: String::new(),
            image: String::new(),
            attributes: vec![
                TokenAttribute::new("Color", color),
                TokenAttribute::new("Level", n),
            ],
        },
    }
}

fn file(id: &str, title: &str, hidden: bool) -> File {
    File {
        id: id.to_string(),
        title: title.to_string(),
        file_type: "video".to_string(),
        hidden,
        key: Some(format!("storage/{id}")),
        encryption_type: Some("aes-256-gcm".to_string()),
        total_encrypted_files: Some(1),
        extension: Some("mp4".to_string()),
    }
}

fn unlock(file: &str, offers: &[&str]) -> Unlock {
    Unlock {
        file: file.to_string(),
        offers: offers.iter().map(|o| o.to_string()).collect(),
    }
}

pub async fn seed(db: &Database) {
    for c in [
        contract(DIAMOND, true),
        contract(CLASSIC, false),
        contract(DIAMOND_NO_OFFERS, true),
        contract(CLASSIC_NO_POOL, false),
    ] {
        db.insert_contract(&c).await.unwrap();
    }
    db.insert_product(&Product {
        contract: DIAMOND.to_string(),
        collection_index_in_contract: 0,
        name: "Genesis".to_string(),
        copies: 15,
    })
    .await
    .unwrap();

    // diamond product 0
    for (i, (id, range, price)) in [
        ("o0", ["0", "4"], "100"),
        ("o1", ["5", "9"], "250"),
        ("o2", ["10", "14"], "1000"),
    ]
    .into_iter()
    .enumerate()
    {
        let mut o = offer(id, DIAMOND, 0, range, price);
        o.diamond_range_index = Some(i as i64);
        o.locked_copies = if id == "o1" { 2 } else { 0 };
        db.insert_offer(&o).await.unwrap();
    }
    for n in 0..12u32 {
        let mut t = token(DIAMOND, n, (n / 5) as i64, None);
        match n {
            0 | 1 => {
                t.is_minted = true;
                t.owner_address = Some("0xAlice".to_string());
            }
            5 | 6 => {
                t.is_minted = true;
                t.owner_address = Some("0xBob".to_string());
            }
            _ => {}
        }
        db.insert_minted_token(&t).await.unwrap();
    }

    // classic product 1
    db.insert_offer_pool(&OfferPool {
        contract: CLASSIC.to_string(),
        product: 1,
        marketplace_catalog_index: 7,
    })
    .await
    .unwrap();
    for (index, (id, range, price)) in [("p0", ["0", "2"], "10"), ("p1", ["3", "5"], "20")]
        .into_iter()
        .enumerate()
    {
        let mut o = offer(id, CLASSIC, 1, range, price);
        o.offer_pool = Some(7);
        o.offer_index = Some(index as i64);
        db.insert_offer(&o).await.unwrap();
    }
    for n in 0..6u32 {
        db.insert_minted_token(&token(CLASSIC, n, (n / 3) as i64, Some(7)))
            .await
            .unwrap();
    }
    db.insert_minted_token(&token(CLASSIC, 99, 0, Some(8)))
        .await
        .unwrap();

    // classic contract with offers but no pool
    db.insert_offer(&offer("q0", CLASSIC_NO_POOL, 0, ["0", "9"], "5"))
        .await
        .unwrap();

    // resale listings on the diamond contract
    for (id, token_index, price, buyer) in [
        ("r1-sold", "1", "300", Some("0xCarol")),
        ("r1-active", "1", "400", None),
        ("r1-later", "1", "450", None),
        ("r2-sold", "2", "150", Some("0xDan")),
        ("r3-active", "3", "500", None),
    ] {
        db.insert_resale_offer(&ResaleTokenOffer {
            id: id.to_string(),
            contract: DIAMOND.to_string(),
            token_index: token_index.to_string(),
            price: price.to_string(),
            seller: "0xAlice".to_string(),
            buyer: buyer.map(str::to_string),
        })
        .await
        .unwrap();
    }

    // unlockable files
    for f in [
        file("f-alpha", "Alpha", false),
        file("f-bravo", "Bravo", false),
        file("f-charlie", "Charlie", false),
        file("f-hidden", "Hidden", true),
    ] {
        db.insert_file(&f).await.unwrap();
    }
    for u in [
        unlock("f-alpha", &["o0"]),
        unlock("f-bravo", &["o1"]),
        unlock("f-hidden", &["o0"]),
        unlock("f-alpha", &["o0", "o1"]),
        unlock("f-charlie", &["o0", "o1"]),
    ] {
        db.insert_unlock(&u).await.unwrap();
    }
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    get_json_as(app, uri, None).await
}

pub async fn get_json_as(app: Router, uri: &str, user: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        request = request.header("x-user-address", user);
    }
    let request = request.body(Body::empty()).expect("request");

    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body");
    let payload: Value = serde_json::from_slice(&body).expect("json body");
    (status, payload)
}

/// `token` field of every token in a listing response.
pub fn token_numbers(payload: &Value) -> Vec<String> {
    payload["result"]["tokens"]
        .as_array()
        .expect("tokens array")
        .iter()
        .map(|t| t["token"].as_str().expect("token string").to_string())
        .collect()
}
