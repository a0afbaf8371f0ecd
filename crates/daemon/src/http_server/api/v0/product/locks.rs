use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use common::prelude::Offer;

use super::{failure, internal_failure, ProductScope};
use crate::ServiceState;

/// Offers of the product holding locked copies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocksResponse {
    pub success: bool,
    pub locks: Vec<Offer>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    scope: ProductScope,
) -> Result<impl IntoResponse, LocksError> {
    let locks = state
        .database()
        .locked_offers(&scope.contract.id, scope.product)
        .await?;

    if locks.is_empty() {
        return Err(LocksError::NoLocks);
    }

    Ok((
        http::StatusCode::OK,
        Json(LocksResponse {
            success: true,
            locks,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum LocksError {
    #[error("No locks found")]
    NoLocks,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for LocksError {
    fn into_response(self) -> Response {
        match self {
            LocksError::NoLocks => failure(http::StatusCode::NOT_FOUND, self.to_string()),
            LocksError::Database(e) => internal_failure(e),
        }
    }
}
