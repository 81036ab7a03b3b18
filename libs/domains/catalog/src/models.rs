use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError, ValidationErrors};

pub use migration::{DEFAULT_CATEGORY_ID, DEFAULT_CATEGORY_NAME};

/// Upper bound on entries in a bulk lookup request.
pub const MAX_BULK_IDS: usize = 100;

const PRICE_DECIMAL_PLACES: u32 = 2;
const PRICE_INTEGER_DIGITS: u32 = 8;

const REQUIRED: &str = "This field is required.";
const NOT_NULL: &str = "This field may not be null.";

/// `price` must fit NUMERIC(10, 2).
fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.normalize().scale() > PRICE_DECIMAL_PLACES {
        return Err(ValidationError::new("decimal_places").with_message(
            format!(
                "Ensure that there are no more than {} decimal places.",
                PRICE_DECIMAL_PLACES
            )
            .into(),
        ));
    }

    if price.trunc().abs() >= Decimal::from(10_i64.pow(PRICE_INTEGER_DIGITS)) {
        return Err(ValidationError::new("max_whole_digits").with_message(
            format!(
                "Ensure that there are no more than {} digits before the decimal point.",
                PRICE_INTEGER_DIGITS
            )
            .into(),
        ));
    }

    Ok(())
}

/// `image_url` must be an absolute http(s) or ftp(s) URL with a host.
fn validate_image_url(value: &str) -> Result<(), ValidationError> {
    let valid = url::Url::parse(value)
        .map(|url| {
            matches!(url.scheme(), "http" | "https" | "ftp" | "ftps") && url.host().is_some()
        })
        .unwrap_or(false);

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("url").with_message("Enter a valid URL.".into()))
    }
}

/// Keeps an explicit `null` apart from a missing key: missing stays `None`
/// through `#[serde(default)]`, `null` becomes `Some(None)`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Store prices with exactly two decimal places (`4.5` becomes `4.50`).
fn normalize_price(mut price: Decimal) -> Decimal {
    price.rescale(PRICE_DECIMAL_PLACES);
    price
}

fn required<T>(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<T>,
) -> Option<T> {
    if value.is_none() {
        errors.add(
            field,
            ValidationError::new("required").with_message(REQUIRED.into()),
        );
    }
    value
}

/// Trim surrounding whitespace; blank input counts as empty.
fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

fn trim_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(trimmed)
}

fn not_null<T>(errors: &mut ValidationErrors, field: &'static str, value: &Option<Option<T>>) {
    if matches!(value, Some(None)) {
        errors.add(
            field,
            ValidationError::new("null").with_message(NOT_NULL.into()),
        );
    }
}

/// Run derive rules plus the price check, merging all field errors.
fn validate_with_price(
    derived: Result<(), ValidationErrors>,
    price: Option<&Decimal>,
) -> Result<(), ValidationErrors> {
    let mut errors = derived.err().unwrap_or_default();

    if let Some(Err(e)) = price.map(validate_price) {
        errors.add("price", e);
    }

    if errors.errors().is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A product category (e.g. "Chocolate", "Gummies")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i32,
    #[schema(example = "Chocolate")]
    pub name: String,
}

/// A catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i32,
    #[schema(example = "Sour Worms")]
    pub name: String,
    pub description: String,
    /// Decimal amount, serialized as a string
    #[schema(value_type = String, example = "4.50")]
    pub price: Decimal,
    /// Payment processor price reference
    pub price_id: Option<String>,
    pub image_url: String,
    /// Category id
    pub category: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Apply a partial update. `updated_at` always advances.
    pub fn apply_update(&mut self, changes: ProductChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(description) = changes.description {
            self.description = description;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(price_id) = changes.price_id {
            self.price_id = price_id;
        }
        if let Some(image_url) = changes.image_url {
            self.image_url = image_url;
        }
        if let Some(category) = changes.category {
            self.category = category;
        }
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// Request body for creating a product
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 100, message = "Name must be between 1 and 100 characters")
    )]
    #[schema(example = "Sour Worms")]
    pub name: Option<String>,

    #[validate(
        required(message = "This field is required."),
        length(min = 1, message = "Description cannot be blank")
    )]
    pub description: Option<String>,

    /// Number or decimal string, at most 2 decimal places
    #[validate(required(message = "This field is required."))]
    #[schema(value_type = Option<String>, example = "4.50")]
    pub price: Option<Decimal>,

    #[validate(length(max = 100, message = "Price id cannot exceed 100 characters"))]
    pub price_id: Option<String>,

    #[validate(
        required(message = "This field is required."),
        custom(function = "validate_image_url"),
        length(max = 200, message = "Image URL cannot exceed 200 characters")
    )]
    #[schema(example = "https://cdn.example.com/sour-worms.png")]
    pub image_url: Option<String>,

    /// Category id; the default category when omitted
    pub category: Option<i32>,
}

impl CreateProduct {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        validate_with_price(self.validate(), self.price.as_ref())
    }
}

/// Validated product ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub price_id: Option<String>,
    pub image_url: String,
    pub category: i32,
}

impl TryFrom<CreateProduct> for NewProduct {
    type Error = ValidationErrors;

    fn try_from(input: CreateProduct) -> Result<Self, Self::Error> {
        input.check()?;

        let mut errors = ValidationErrors::new();
        let name = required(&mut errors, "name", input.name);
        let description = required(&mut errors, "description", input.description);
        let price = required(&mut errors, "price", input.price);
        let image_url = required(&mut errors, "image_url", input.image_url);

        match (name, description, price, image_url) {
            (Some(name), Some(description), Some(price), Some(image_url)) => Ok(NewProduct {
                name,
                description,
                price: normalize_price(price),
                price_id: input.price_id,
                image_url,
                category: input.category.unwrap_or(DEFAULT_CATEGORY_ID),
            }),
            _ => Err(errors),
        }
    }
}

/// Request body for a partial product update; absent fields are untouched
///
/// An explicit `null` clears `price_id` and is rejected on every other field.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    #[schema(value_type = Option<String>)]
    pub name: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(min = 1, message = "Description cannot be blank"))]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, example = "3.25")]
    pub price: Option<Option<Decimal>>,

    /// `null` clears the stored price id
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 100, message = "Price id cannot exceed 100 characters"))]
    #[schema(value_type = Option<String>)]
    pub price_id: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[validate(
        custom(function = "validate_image_url"),
        length(max = 200, message = "Image URL cannot exceed 200 characters")
    )]
    #[schema(value_type = Option<String>)]
    pub image_url: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub category: Option<Option<i32>>,
}

impl UpdateProduct {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let price = self.price.as_ref().and_then(Option::as_ref);
        let mut errors = validate_with_price(self.validate(), price)
            .err()
            .unwrap_or_default();

        not_null(&mut errors, "name", &self.name);
        not_null(&mut errors, "description", &self.description);
        not_null(&mut errors, "price", &self.price);
        not_null(&mut errors, "image_url", &self.image_url);
        not_null(&mut errors, "category", &self.category);

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Validated partial update.
///
/// `price_id` is `Some(None)` when the stored value should be cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub price_id: Option<Option<String>>,
    pub image_url: Option<String>,
    pub category: Option<i32>,
}

impl TryFrom<UpdateProduct> for ProductChanges {
    type Error = ValidationErrors;

    fn try_from(input: UpdateProduct) -> Result<Self, Self::Error> {
        input.check()?;

        Ok(ProductChanges {
            name: input.name.flatten(),
            description: input.description.flatten(),
            price: input.price.flatten().map(normalize_price),
            price_id: input.price_id,
            image_url: input.image_url.flatten(),
            category: input.category.flatten(),
        })
    }
}

/// Request body for creating a category
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[serde(default, deserialize_with = "trim_string")]
    #[validate(
        required(message = "This field is required."),
        length(min = 1, max = 30, message = "Name must be between 1 and 30 characters")
    )]
    #[schema(example = "Chocolate")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub name: String,
}

impl TryFrom<CreateCategory> for NewCategory {
    type Error = ValidationErrors;

    fn try_from(input: CreateCategory) -> Result<Self, Self::Error> {
        let input = CreateCategory {
            name: trimmed(input.name),
        };
        input.validate()?;

        let mut errors = ValidationErrors::new();
        required(&mut errors, "name", input.name)
            .map(|name| NewCategory { name })
            .ok_or(errors)
    }
}

/// Query parameters for listing products
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Exact category name
    pub category: Option<String>,
}

impl ProductFilter {
    /// The category name to filter on; an empty value means no filter.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_deref().filter(|name| !name.is_empty())
    }
}

/// Query parameters for product search
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring of the product name
    #[serde(default)]
    pub search_product: String,
}

/// Request body for bulk product lookup
///
/// `ids` entries that are not positive integers (or numeric strings) are
/// ignored.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct BulkProductsRequest {
    #[serde(default)]
    #[schema(value_type = Vec<i32>)]
    pub ids: Vec<serde_json::Value>,
}
