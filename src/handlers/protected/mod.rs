// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Routes in this tier sit behind `middleware::require_auth`, so every handler
// can take `Extension<AuthUser>` and rely on it being present.

pub mod reviews;

pub use reviews::review_create;
