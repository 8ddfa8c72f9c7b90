pub mod product;
pub mod review;

pub use product::Product;
pub use review::{ClientReview, Review, SafeReview};
