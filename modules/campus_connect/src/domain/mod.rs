pub mod error;
pub mod identity;
pub mod policy;
pub mod ports;
pub mod repo;
pub mod service;
