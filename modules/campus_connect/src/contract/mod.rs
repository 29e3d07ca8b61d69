pub mod client;
pub mod error;
pub mod model;

pub use client::CampusConnectApi;
pub use error::CampusError;
pub use model::*;
