// === PUBLIC CONTRACT ===
// Other modules (identity, notifications) consume events through the contract only
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::Events;

// === INTERNAL MODULES ===
// Exposed for integration tests and the server binary's wiring.
// External consumers should stick to `contract`.
#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
