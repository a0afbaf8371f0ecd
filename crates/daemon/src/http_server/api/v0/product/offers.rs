use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use common::prelude::{Offer, Product};

use super::{internal_failure, Failure, ProductScope};
use crate::ServiceState;

/// A product with all of its offers and the contract owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOffers {
    #[serde(flatten)]
    pub product: Product,
    pub offers: Vec<Offer>,
    pub owner: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OffersResponse {
    pub success: bool,
    pub product: ProductOffers,
}

pub async fn handler(
    State(state): State<ServiceState>,
    scope: ProductScope,
) -> Result<Response, OffersError> {
    let db = state.database();

    // a missing product is reported in the body, not the status
    let Some(product) = db.get_product(&scope.contract.id, scope.product).await? else {
        return Ok(Json(Failure {
            success: false,
            message: "Product not found.".to_string(),
        })
        .into_response());
    };
    let offers = db
        .product_offers(&scope.contract.id, product.collection_index_in_contract)
        .await?;

    Ok((
        http::StatusCode::OK,
        Json(OffersResponse {
            success: true,
            product: ProductOffers {
                product,
                offers,
                owner: scope.contract.user,
            },
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum OffersError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for OffersError {
    fn into_response(self) -> Response {
        match self {
            OffersError::Database(e) => internal_failure(e),
        }
    }
}
