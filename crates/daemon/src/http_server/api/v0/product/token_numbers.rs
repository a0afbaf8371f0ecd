use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::TokenQueryPlanner;

use super::{internal_failure, product_url_path, resolve_failure, ProductScope};
use crate::database::{ResolveError, TokenQueryError};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenNumbersRequest {
    pub contract_id: String,
    pub product: i64,
}

/// Every token number of the product, ascending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenNumbersResponse {
    pub success: bool,
    pub tokens: Vec<String>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    scope: ProductScope,
) -> Result<impl IntoResponse, TokenNumbersError> {
    let db = state.database();

    let join = db.resolve_join_context(&scope.contract, scope.product).await?;
    let plan =
        TokenQueryPlanner::new(&scope.contract.id, &join, Default::default()).token_numbers();
    let tokens = db.token_numbers(&plan).await?;

    Ok((
        http::StatusCode::OK,
        Json(TokenNumbersResponse {
            success: true,
            tokens,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum TokenNumbersError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("token query failed: {0}")]
    Query(#[from] TokenQueryError),
}

impl IntoResponse for TokenNumbersError {
    fn into_response(self) -> Response {
        match self {
            TokenNumbersError::Resolve(e) => resolve_failure(e),
            TokenNumbersError::Query(e) => internal_failure(e),
        }
    }
}

impl ApiRequest for TokenNumbersRequest {
    type Response = TokenNumbersResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let mut full_url = base_url.clone();
        full_url.set_path(&format!(
            "{}/tokenNumbers",
            product_url_path(&self.contract_id, self.product)
        ));
        client.get(full_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_targets_product_token_numbers() {
        let base = Url::parse("http://localhost:5001").unwrap();
        let request = TokenNumbersRequest {
            contract_id: "c1".to_string(),
            product: 3,
        }
        .build_request(&base, &Client::new())
        .build()
        .unwrap();

        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(
            request.url().as_str(),
            "http://localhost:5001/api/v0/contracts/c1/products/3/tokenNumbers"
        );
    }
}
