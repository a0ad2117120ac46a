//! `GET`/`POST` handlers for the key/value surface.
//!
//! The full request path, including its leading `/`, is the key: two
//! clients asking for `/foo` and `/foo/` address different entries.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use kvs_core::StoreError;

use super::AppState;

/// `GET /<key>` -- returns the stored value, or 404 if absent/expired.
pub async fn get_handler(State(state): State<AppState>, uri: Uri) -> Response {
    let key = uri.path().as_bytes();
    match state.store.get(key) {
        Ok(value) => (StatusCode::OK, value).into_response(),
        Err(err) => store_error_response(&err),
    }
}

/// `POST /<key>` -- stores the request body under the path as key.
pub async fn post_handler(State(state): State<AppState>, uri: Uri, body: Bytes) -> Response {
    let key = uri.path().as_bytes();
    match state.store.add(key, &body) {
        Ok(()) => StatusCode::OK.into_response(),
        Err(err) => store_error_response(&err),
    }
}

/// Maps a core storage error to its HTTP status code.
///
/// `NotFound` and `Expired` are indistinguishable to the client -- both are
/// a plain 404. `OutOfLimit` reports 507 (Insufficient Storage); anything
/// else is an unexpected internal failure.
fn store_error_response(err: &StoreError) -> Response {
    let status = match err {
        StoreError::NotFound | StoreError::Expired => StatusCode::NOT_FOUND,
        StoreError::OutOfLimit => StatusCode::INSUFFICIENT_STORAGE,
        StoreError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    status.into_response()
}

/// Fallback for any method other than `GET`/`POST` on a key route.
pub async fn method_not_allowed_handler() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{NetworkConfig, ShutdownController};
    use axum::body::to_bytes;
    use std::sync::Arc;
    use std::time::Instant;

    fn test_state() -> AppState {
        AppState {
            store: crate::test_support::test_kv_store(),
            shutdown: Arc::new(ShutdownController::new()),
            config: Arc::new(NetworkConfig::default()),
            start_time: Instant::now(),
        }
    }

    fn uri(path: &str) -> Uri {
        path.parse().unwrap()
    }

    #[tokio::test]
    async fn post_then_get_round_trips() {
        let state = test_state();
        let post = post_handler(State(state.clone()), uri("/widgets/1"), Bytes::from_static(b"hello")).await;
        assert_eq!(post.status(), StatusCode::OK);

        let get = get_handler(State(state), uri("/widgets/1")).await;
        assert_eq!(get.status(), StatusCode::OK);
        let body = to_bytes(get.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn get_missing_key_is_404() {
        let state = test_state();
        let get = get_handler(State(state), uri("/nope")).await;
        assert_eq!(get.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn different_paths_are_different_keys() {
        let state = test_state();
        post_handler(State(state.clone()), uri("/a"), Bytes::from_static(b"one")).await;
        let get = get_handler(State(state), uri("/b")).await;
        assert_eq!(get.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn method_not_allowed_reports_405() {
        assert_eq!(method_not_allowed_handler().await, StatusCode::METHOD_NOT_ALLOWED);
    }
}
