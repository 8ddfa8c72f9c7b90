// handlers/public/mod.rs - Public handlers (no authentication required)

pub mod health;
pub mod products;

pub use health::health;
pub use products::{product_reviews_list, product_show, products_list};
