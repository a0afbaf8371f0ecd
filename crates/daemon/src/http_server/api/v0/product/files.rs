//! Unlockable files of a product or of a single token.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use common::prelude::AccessibleFile;

use super::{failure, internal_failure, ProductScope, RequestUser};
use crate::access::filter_file_access;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesResponse {
    pub success: bool,
    pub files: Vec<AccessibleFile>,
}

#[derive(Debug, Deserialize)]
pub struct TokenPath {
    pub token: String,
}

/// Files unlocked by the offers whose range holds `token`.
pub async fn token_handler(
    State(state): State<ServiceState>,
    scope: ProductScope,
    Path(TokenPath { token }): Path<TokenPath>,
    RequestUser(user): RequestUser,
) -> Result<impl IntoResponse, FilesError> {
    let db = state.database();

    let candidates = db
        .token_file_candidates(&scope.contract.id, scope.product, &token)
        .await?;
    let files = filter_file_access(db, candidates, user.as_deref(), false).await?;

    Ok((
        http::StatusCode::OK,
        Json(FilesResponse {
            success: true,
            files,
        }),
    )
        .into_response())
}

/// Every visible file of the product, once each, sorted by title.
pub async fn product_handler(
    State(state): State<ServiceState>,
    scope: ProductScope,
    RequestUser(user): RequestUser,
) -> Result<impl IntoResponse, FilesError> {
    let user = user.ok_or(FilesError::Unauthorized)?;
    let db = state.database();

    let candidates = db
        .product_file_candidates(&scope.contract.id, scope.product)
        .await?;
    let files = filter_file_access(db, candidates, Some(&user), true).await?;

    Ok((
        http::StatusCode::OK,
        Json(FilesResponse {
            success: true,
            files,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    #[error("a user session is required")]
    Unauthorized,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for FilesError {
    fn into_response(self) -> Response {
        match self {
            FilesError::Unauthorized => failure(http::StatusCode::UNAUTHORIZED, "Unauthorized"),
            FilesError::Database(e) => internal_failure(e),
        }
    }
}
