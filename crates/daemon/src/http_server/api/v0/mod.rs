use axum::Router;

pub mod product;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .merge(product::router(state.clone()))
        .with_state(state)
}
