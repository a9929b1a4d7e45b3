// === PUBLIC CONTRACT ===
// Other crates should only depend on the contract module.
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::GardenUsers;

// === INTERNAL MODULES ===
// Exposed for tests and the CLI bootstrap; use `contract` for stable APIs.
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
