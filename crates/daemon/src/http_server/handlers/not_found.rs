use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub async fn not_found_handler() -> Response {
    let err_msg = serde_json::json!({"success": false, "message": "not found"});
    (StatusCode::NOT_FOUND, Json(err_msg)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_not_found_is_json() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[axum::http::header::CONTENT_TYPE],
            "application/json"
        );
    }
}
