//! # PSP Configuration Core
//!
//! Application service over the `ConfigRepository` port: request
//! validation, currency validators, and orchestration of the versioned
//! record operations. No infrastructure code lives here.

pub mod currency;
pub mod operation;
pub mod service;

mod validate;

#[cfg(test)]
mod service_tests;

pub use service::ConfigService;
