use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use common::prelude::{ProductToken, TokenQueryPlanner};

use super::files::TokenPath;
use super::{failure, internal_failure, resolve_failure, ProductScope};
use crate::database::{ResolveError, TokenQueryError};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: ProductToken,
}

/// A single token of the product with its offer.
pub async fn handler(
    State(state): State<ServiceState>,
    scope: ProductScope,
    Path(TokenPath { token }): Path<TokenPath>,
) -> Result<impl IntoResponse, TokenError> {
    let db = state.database();

    let join = db.resolve_join_context(&scope.contract, scope.product).await?;
    let plan = TokenQueryPlanner::new(&scope.contract.id, &join, Default::default())
        .single_token(&token);
    let found = db
        .fetch_tokens(&plan)
        .await?
        .into_iter()
        .next()
        .ok_or(TokenError::NotFound)?;

    Ok((
        http::StatusCode::OK,
        Json(TokenResponse {
            success: true,
            token: found,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Token not found.")]
    NotFound,
    #[error("token query failed: {0}")]
    Query(#[from] TokenQueryError),
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        match self {
            TokenError::Resolve(e) => resolve_failure(e),
            TokenError::NotFound => failure(http::StatusCode::NOT_FOUND, self.to_string()),
            TokenError::Query(e) => internal_failure(e),
        }
    }
}
