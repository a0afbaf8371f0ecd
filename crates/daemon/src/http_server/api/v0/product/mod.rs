//! Routes scoped to one product of one contract.
//!
//! Every handler starts from a [`ProductScope`], which loads the contract
//! named in the path and fails with 404 when it is unknown.

use axum::async_trait;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use common::prelude::Contract;

use crate::database::ResolveError;
use crate::http_server::api::USER_ADDRESS_HEADER;
use crate::ServiceState;

pub mod attributes;
pub mod files;
pub mod locks;
pub mod offers;
pub mod token;
pub mod token_numbers;
pub mod tokens;

pub const PRODUCT_PATH: &str = "/contracts/:contract_id/products/:product";

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route(PRODUCT_PATH, get(tokens::handler))
        .route(
            &format!("{PRODUCT_PATH}/attributes"),
            get(attributes::handler),
        )
        .route(
            &format!("{PRODUCT_PATH}/tokenNumbers"),
            get(token_numbers::handler),
        )
        .route(
            &format!("{PRODUCT_PATH}/files"),
            get(files::product_handler),
        )
        .route(
            &format!("{PRODUCT_PATH}/files/:token"),
            get(files::token_handler),
        )
        .route(&format!("{PRODUCT_PATH}/offers"), get(offers::handler))
        .route(&format!("{PRODUCT_PATH}/locks"), get(locks::handler))
        .route(&format!("{PRODUCT_PATH}/token/:token"), get(token::handler))
        .with_state(state)
}

/// API path of a product, relative to the server root.
pub fn product_url_path(contract_id: &str, product: i64) -> String {
    format!("/api/v0/contracts/{contract_id}/products/{product}")
}

/// Body of every unsuccessful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub success: bool,
    pub message: String,
}

pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(Failure {
            success: false,
            message: message.into(),
        }),
    )
        .into_response()
}

/// Resolver failures: missing offers or pool are 404s, store errors are 500s.
pub fn resolve_failure(err: ResolveError) -> Response {
    match err {
        ResolveError::OffersNotFound | ResolveError::OfferPoolNotFound => {
            failure(StatusCode::NOT_FOUND, err.to_string())
        }
        ResolveError::Database(e) => internal_failure(e),
    }
}

pub fn internal_failure(err: impl std::fmt::Display) -> Response {
    tracing::error!(error = %err, "product request failed");
    failure(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}

#[derive(Debug, Deserialize)]
struct ProductPath {
    contract_id: String,
    product: String,
}

/// The contract and product addressed by the request path.
#[derive(Debug, Clone)]
pub struct ProductScope {
    pub contract: Contract,
    pub product: i64,
}

#[async_trait]
impl FromRequestParts<ServiceState> for ProductScope {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let Path(path) = Path::<ProductPath>::from_request_parts(parts, state)
            .await
            .map_err(|e| failure(StatusCode::BAD_REQUEST, e.body_text()))?;

        let product = path.product.parse::<i64>().map_err(|_| {
            failure(
                StatusCode::BAD_REQUEST,
                format!("product must be an integer, got '{}'", path.product),
            )
        })?;

        let contract = state
            .database()
            .get_contract(&path.contract_id)
            .await
            .map_err(internal_failure)?
            .ok_or_else(|| failure(StatusCode::NOT_FOUND, "Contract not found."))?;

        Ok(Self { contract, product })
    }
}

/// Address of the requesting user, if the request carries one.
#[derive(Debug, Clone, Default)]
pub struct RequestUser(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for RequestUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .headers
            .get(USER_ADDRESS_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Ok(Self(user))
    }
}
