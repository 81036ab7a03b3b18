use super::jwt::JwtClaims;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;

/// Claims of the authenticated caller, if [`jwt_auth_middleware`](super::jwt_auth_middleware)
/// ran for this route. Never rejects.
#[derive(Debug, Clone, Default)]
pub struct Caller(pub Option<JwtClaims>);

impl Caller {
    pub fn subject(&self) -> Option<String> {
        self.0.as_ref().map(|claims| claims.sub.clone())
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(parts.extensions.get::<JwtClaims>().cloned()))
    }
}
