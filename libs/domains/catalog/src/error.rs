use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::DbErr;
use std::borrow::Cow;
use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Product {0} not found")]
    ProductNotFound(i32),

    #[error("Category {0} not found")]
    CategoryNotFound(i32),

    #[error("Category '{0}' not found")]
    UnknownCategoryName(String),

    #[error("No products found matching '{0}'")]
    NoSearchResults(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    /// A single field-level validation failure.
    pub fn field(
        field: &'static str,
        code: &'static str,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, ValidationError::new(code).with_message(message.into()));
        CatalogError::Validation(errors)
    }

    pub fn duplicate_category_name() -> Self {
        Self::field(
            "name",
            "unique",
            "category with this name already exists.",
        )
    }

    pub fn unknown_category(id: i32) -> Self {
        Self::field(
            "category",
            "does_not_exist",
            format!("Invalid pk \"{}\" - object does not exist.", id),
        )
    }
}

/// Convert CatalogError to AppError for standardized error responses
impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            e @ (CatalogError::ProductNotFound(_)
            | CatalogError::CategoryNotFound(_)
            | CatalogError::UnknownCategoryName(_)
            | CatalogError::NoSearchResults(_)) => AppError::NotFound(e.to_string()),
            CatalogError::Validation(errors) => AppError::ValidationError(errors),
            CatalogError::InvalidInput(msg) => AppError::BadRequest(msg),
            CatalogError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_not_found_variants_map_to_404() {
        for err in [
            CatalogError::ProductNotFound(1),
            CatalogError::CategoryNotFound(2),
            CatalogError::UnknownCategoryName("Gum".to_string()),
            CatalogError::NoSearchResults(String::new()),
        ] {
            assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn test_validation_and_invalid_input_map_to_400() {
        assert_eq!(
            CatalogError::duplicate_category_name()
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CatalogError::InvalidInput("ids".to_string())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_database_error_maps_to_500() {
        assert_eq!(
            CatalogError::Database(DbErr::Custom("boom".to_string()))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unknown_category_is_field_error() {
        let CatalogError::Validation(errors) = CatalogError::unknown_category(99) else {
            panic!("expected validation error");
        };
        assert!(errors.field_errors().contains_key("category"));
    }
}
