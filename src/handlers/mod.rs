// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (bearer token verified by `require_auth`)
pub mod protected;
pub mod public;

