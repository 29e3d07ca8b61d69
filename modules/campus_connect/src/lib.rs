//! Campus Connect: announcements, events and shared resources for a campus
//! community, with likes, comments and capacity-limited event registration.
//!
//! Other modules talk to it through [`contract::client::CampusConnectApi`]
//! (see [`CampusConnectModule::client`]); browsers and apps use the REST
//! routes mounted on the ingress.

// === PUBLIC CONTRACT ===
pub mod contract;
pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::CampusConnectModule;

pub const MODULE_NAME: &str = "campus_connect";

// === INTERNAL MODULES ===
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
