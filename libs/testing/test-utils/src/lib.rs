//! Shared test utilities for domain testing
//!
//! - `TestDatabase`: PostgreSQL container with migrations applied (feature: "postgres")
//! - `TestDataBuilder`: deterministic catalog fixture values
//! - `assertions`: small assertion helpers
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let category = builder.category_name("sweets");
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Builder for deterministic test data.
///
/// Values derive from a seed so reruns of the same test produce the same
/// names, while different tests sharing a database do not collide.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (seed is the hash of the name).
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_product");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    fn tag(&self) -> String {
        format!("{:08x}", self.seed as u32)
    }

    /// Category names are capped at 30 characters, so keep `suffix` short.
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let name = TestDataBuilder::new(7).category_name("gum");
    /// assert!(name.len() <= 30);
    /// ```
    pub fn category_name(&self, suffix: &str) -> String {
        let mut name = format!("cat-{}-{}", self.tag(), suffix);
        name.truncate(30);
        name
    }

    pub fn product_name(&self, suffix: &str) -> String {
        format!("Candy {} {}", self.tag(), suffix)
    }

    pub fn image_url(&self, suffix: &str) -> String {
        format!("https://cdn.example.com/{}/{}.png", self.tag(), suffix)
    }

    /// Token subject for authenticated requests.
    pub fn subject(&self) -> String {
        format!("staff-{}", self.tag())
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }

    /// Assert that `ids` are strictly ascending (sorted, no duplicates)
    pub fn assert_strictly_ascending(ids: &[i32], context: &str) {
        assert!(
            ids.windows(2).all(|w| w[0] < w[1]),
            "{}: expected strictly ascending ids, got {:?}",
            context,
            ids
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.category_name("a"), builder2.category_name("a"));
        assert_eq!(builder1.product_name("b"), builder2.product_name("b"));
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.product_name("x"), builder2.product_name("x"));
    }

    #[test]
    fn test_category_name_fits_column() {
        let name = TestDataBuilder::new(u64::MAX).category_name("a-very-long-suffix-indeed");
        assert_eq!(name.len(), 30);
    }

    #[test]
    fn test_strictly_ascending() {
        assertions::assert_strictly_ascending(&[1, 2, 5], "sorted");
    }

    #[test]
    #[should_panic(expected = "strictly ascending")]
    fn test_strictly_ascending_rejects_duplicates() {
        assertions::assert_strictly_ascending(&[1, 1], "dupes");
    }
}
