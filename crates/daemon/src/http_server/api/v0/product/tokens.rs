//! Paged, filtered token listing of a product.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{QueryParamError, TokenQueryParams, TokenQueryPlanner};

use super::{failure, internal_failure, product_url_path, resolve_failure, ProductScope};
use crate::database::{ResolveError, TokenQueryError};
use crate::http_server::api::client::ApiRequest;
use crate::listing::{execute_token_query, TokenPage};
use crate::ServiceState;

/// Request the token listing of a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTokensRequest {
    pub contract_id: String,
    pub product: i64,
    pub params: TokenQueryParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTokensResponse {
    pub success: bool,
    pub result: TokenPage,
}

#[tracing::instrument(
    skip(state, scope),
    fields(contract = %scope.contract.id, product = scope.product)
)]
pub async fn handler(
    State(state): State<ServiceState>,
    scope: ProductScope,
    Query(params): Query<TokenQueryParams>,
) -> Result<impl IntoResponse, ListTokensError> {
    let db = state.database();

    let settings = db.server_setting().await?;
    let join = db.resolve_join_context(&scope.contract, scope.product).await?;

    let planner = TokenQueryPlanner::new(&scope.contract.id, &join, settings);
    let query = planner.plan(&params)?;
    let result = execute_token_query(db, &query).await?;

    Ok((
        http::StatusCode::OK,
        Json(ListTokensResponse {
            success: true,
            result,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum ListTokensError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("invalid query: {0}")]
    Params(#[from] QueryParamError),
    #[error("token query failed: {0}")]
    Query(#[from] TokenQueryError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for ListTokensError {
    fn into_response(self) -> Response {
        match self {
            ListTokensError::Resolve(e) => resolve_failure(e),
            ListTokensError::Params(e) => failure(http::StatusCode::BAD_REQUEST, e.to_string()),
            ListTokensError::Query(e) => internal_failure(e),
            ListTokensError::Database(e) => internal_failure(e),
        }
    }
}

impl ApiRequest for ListTokensRequest {
    type Response = ListTokensResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> RequestBuilder {
        let mut full_url = base_url.clone();
        full_url.set_path(&product_url_path(&self.contract_id, self.product));
        client.get(full_url).query(&self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_sends_only_given_params() {
        let base = Url::parse("http://localhost:5001").unwrap();
        let request = ListTokensRequest {
            contract_id: "c1".to_string(),
            product: 0,
            params: TokenQueryParams {
                from_token: Some("11".to_string()),
                sort_by_price: Some("-1".to_string()),
                ..Default::default()
            },
        }
        .build_request(&base, &Client::new())
        .build()
        .unwrap();

        assert_eq!(request.url().path(), "/api/v0/contracts/c1/products/0");
        assert_eq!(request.url().query(), Some("fromToken=11&sortByPrice=-1"));
    }
}
