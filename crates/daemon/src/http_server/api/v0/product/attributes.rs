//! Attribute catalog of a product, classified from token metadata on a
//! cache miss.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use common::prelude::{classify_attributes, ProductAttributes, TokenQueryPlanner};

use super::{internal_failure, resolve_failure, ProductScope};
use crate::database::{Database, ResolveError, TokenQueryError};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributesResponse {
    pub success: bool,
    pub attributes: ProductAttributes,
}

pub async fn handler(
    State(state): State<ServiceState>,
    scope: ProductScope,
) -> Result<impl IntoResponse, AttributesError> {
    let db = state.database();

    let attributes = match db
        .product_attributes(&scope.contract.id, scope.product)
        .await?
    {
        Some(cached) if !cached.attributes.is_empty() => cached,
        _ => classify_product(db, &scope).await?,
    };

    Ok((
        http::StatusCode::OK,
        Json(AttributesResponse {
            success: true,
            attributes,
        }),
    )
        .into_response())
}

async fn classify_product(
    db: &Database,
    scope: &ProductScope,
) -> Result<ProductAttributes, AttributesError> {
    let join = db.resolve_join_context(&scope.contract, scope.product).await?;
    let plan =
        TokenQueryPlanner::new(&scope.contract.id, &join, Default::default()).token_numbers();
    let metadata = db.token_metadata(&plan).await?;

    let catalog = ProductAttributes {
        contract: scope.contract.id.clone(),
        product: scope.product,
        attributes: classify_attributes(&metadata),
    };
    tracing::info!(
        contract = %catalog.contract,
        product = catalog.product,
        traits = catalog.attributes.len(),
        "classified product metadata"
    );

    if !catalog.attributes.is_empty() {
        db.store_product_attributes(&catalog).await?;
    }

    Ok(catalog)
}

#[derive(Debug, thiserror::Error)]
pub enum AttributesError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("token query failed: {0}")]
    Query(#[from] TokenQueryError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AttributesError {
    fn into_response(self) -> Response {
        match self {
            AttributesError::Resolve(e) => resolve_failure(e),
            AttributesError::Query(e) => internal_failure(e),
            AttributesError::Database(e) => internal_failure(e),
        }
    }
}
