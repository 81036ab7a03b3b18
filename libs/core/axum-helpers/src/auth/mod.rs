//! Bearer-token authentication for mutating routes.
//!
//! Tokens are HS256 JWTs issued by an external identity provider and verified
//! statelessly against the shared `JWT_SECRET`.
//!
//! ```ignore
//! use axum_helpers::auth::{JwtAuth, JwtConfig, jwt_auth_middleware};
//! use core_config::FromEnv;
//!
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//!
//! let protected = Router::new()
//!     .route("/add_category/", post(handler))
//!     .route_layer(axum::middleware::from_fn_with_state(auth, jwt_auth_middleware));
//! ```

pub mod caller;
pub mod config;
pub mod jwt;
pub mod middleware;

pub use caller::Caller;
pub use config::JwtConfig;
pub use jwt::{ACCESS_TOKEN_TTL, JwtAuth, JwtClaims};
pub use middleware::jwt_auth_middleware;
