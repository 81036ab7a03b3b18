use super::jwt::JwtAuth;
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

/// Extract JWT from Authorization header or `access_token` cookie
fn extract_token_from_request(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .or_else(|| {
            headers
                .get("cookie")
                .and_then(|v| v.to_str().ok())
                .and_then(|cookies| {
                    cookies.split(';').find_map(|cookie| {
                        let (name, value) = cookie.trim().split_once('=')?;
                        (name == "access_token").then(|| value.to_string())
                    })
                })
        })
        .filter(|token| !token.is_empty())
}

/// JWT authentication middleware.
///
/// Rejects the request with `401` unless it carries a valid token. On success
/// the decoded [`JwtClaims`](super::JwtClaims) are inserted into the request
/// extensions.
///
/// ```ignore
/// let protected = Router::new()
///     .route("/delete_product/{id}/", delete(handler))
///     .route_layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
/// ```
pub async fn jwt_auth_middleware(
    State(auth): State<JwtAuth>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_token_from_request(&headers) else {
        tracing::debug!("No JWT found in Authorization header or cookie");
        return Err(AppError::Unauthorized("No token provided".to_string()));
    };

    let claims = auth.verify_token(&token).map_err(|e| {
        tracing::debug!("JWT verification failed: {}", e);
        AppError::Unauthorized("Invalid token".to_string())
    })?;

    tracing::debug!(
        subject = %claims.sub,
        method = %request.method(),
        path = %request.uri().path(),
        "Authenticated request"
    );

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ACCESS_TOKEN_TTL, JwtConfig};
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        middleware::from_fn_with_state,
        routing::post,
    };
    use tower::ServiceExt;

    const SECRET: &str = "candy-shop-test-secret-0123456789abcdef";

    fn app(auth: JwtAuth) -> Router {
        Router::new()
            .route("/protected", post(|| async { "ok" }))
            .route_layer(from_fn_with_state(auth, jwt_auth_middleware))
    }

    fn jwt_auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new(SECRET).unwrap())
    }

    #[test]
    fn test_extract_token_prefers_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        headers.insert(header::COOKIE, "access_token=xyz".parse().unwrap());
        assert_eq!(extract_token_from_request(&headers), Some("abc".to_string()));
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            "theme=dark; access_token=xyz".parse().unwrap(),
        );
        assert_eq!(extract_token_from_request(&headers), Some("xyz".to_string()));
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = app(jwt_auth())
            .oneshot(Request::post("/protected").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let response = app(jwt_auth())
            .oneshot(
                Request::post("/protected")
                    .header(header::AUTHORIZATION, "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        let auth = jwt_auth();
        let token = auth.issue_token("staff-1", &[], ACCESS_TOKEN_TTL).unwrap();

        let response = app(auth)
            .oneshot(
                Request::post("/protected")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
