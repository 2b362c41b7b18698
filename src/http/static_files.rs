//! Static file fallback.
//!
//! Serves GET/HEAD requests that matched no route from the document root.
//! Directory requests serve their `index.html`.

use std::convert::Infallible;
use std::path::Path;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::http::response;

/// True if the target may be looked up on disk.
pub fn is_legal_target(target: &str) -> bool {
    !target.is_empty() && target.starts_with('/') && !target.contains("..")
}

/// Serve `request` from `doc_root`, answering JSON 404 for missing files.
pub async fn serve(doc_root: &Path, request: Request<Body>) -> Response {
    let target = request.uri().path().to_string();
    let service = ServeDir::new(doc_root).append_index_html_on_directories(true);

    let result: Result<_, Infallible> = service.oneshot(request).await;
    let response = match result {
        Ok(response) => response,
        Err(never) => match never {},
    };

    if response.status() == StatusCode::NOT_FOUND {
        tracing::debug!(target = %target, root = %doc_root.display(), "Static file not found");
        return response::not_found(&target);
    }

    response.map(Body::new).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_targets() {
        assert!(is_legal_target("/index.html"));
        assert!(is_legal_target("/"));
        assert!(!is_legal_target(""));
        assert!(!is_legal_target("index.html"));
        assert!(!is_legal_target("/../etc/passwd"));
        assert!(!is_legal_target("/a/..%2f/b/.."));
    }
}
