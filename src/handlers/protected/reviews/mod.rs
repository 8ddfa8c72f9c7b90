// handlers/protected/reviews/mod.rs - Review submission handlers

pub mod create; // POST /api/reviews

pub use create::review_create;
