use crate::{env_required, ConfigError, FromEnv};

/// Origins allowed to call the API from a browser (the storefront).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
        }
    }
}

impl FromEnv for CorsConfig {
    /// Requires CORS_ALLOWED_ORIGIN, a comma-separated list such as
    /// `http://localhost:3000,https://shop.example.com`
    fn from_env() -> Result<Self, ConfigError> {
        let raw = env_required("CORS_ALLOWED_ORIGIN")?;

        let allowed_origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if allowed_origins.is_empty() {
            return Err(ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: "at least one origin is required".to_string(),
            });
        }

        Ok(Self { allowed_origins })
    }
}
