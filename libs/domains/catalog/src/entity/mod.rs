//! Sea-ORM entities for the `categories` and `products` tables.

pub mod category;
pub mod product;
