//! Integer id path parameter extractor.

use crate::errors::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

/// Extractor for positive integer `{id}` path parameters.
///
/// A segment that is not a positive `i32` cannot name any stored row, so it
/// is rejected as `404 Not Found` rather than `400`.
///
/// ```ignore
/// use axum::{Router, routing::get};
/// use axum_helpers::extractors::IdPath;
///
/// async fn get_product(IdPath(id): IdPath) -> String {
///     format!("Product {}", id)
/// }
///
/// let app: Router = Router::new().route("/individual_product/{id}/", get(get_product));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdPath(pub i32);

impl IdPath {
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .map(IdPath)
    }
}

impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::NotFound(e.body_text()))?;

        IdPath::parse(&raw)
            .ok_or_else(|| AppError::NotFound(format!("No resource matches id '{}'", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    #[test]
    fn test_parse_accepts_positive_integers() {
        assert_eq!(IdPath::parse("42"), Some(IdPath(42)));
        assert_eq!(IdPath::parse("0"), None);
        assert_eq!(IdPath::parse("-3"), None);
        assert_eq!(IdPath::parse("abc"), None);
        assert_eq!(IdPath::parse("99999999999"), None);
    }

    #[tokio::test]
    async fn test_invalid_id_yields_not_found() {
        async fn handler(IdPath(id): IdPath) -> String {
            id.to_string()
        }

        let app = Router::new().route("/items/{id}/", get(handler));

        let ok = app
            .clone()
            .oneshot(Request::get("/items/5/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);

        let bad = app
            .oneshot(Request::get("/items/abc/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::NOT_FOUND);
    }
}
