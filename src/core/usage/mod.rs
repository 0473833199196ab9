// Core usage module - user and query statistics.

pub mod usage_models;
pub mod usage_service;

pub use usage_models::*;
pub use usage_service::*;
