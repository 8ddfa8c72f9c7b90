pub mod catalog;
pub mod models;
pub mod pool;

pub use catalog::{CatalogStore, PgCatalog};
pub use pool::{connect, run_migrations, DatabaseError};
