//! # PSP Configuration Types
//!
//! Domain types and port traits for the PSP configuration service.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Versioned configuration records (fee, conversion rate, risk
//!   rule, routing rule) and the read-only currency/flow-target facts
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto` - Request and detail-view structs for service boundaries
//! - `error` - Domain, store, and application error types

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    ChargeFeeType, ConversionRateConfig, CurrencyLimit, CustomerCriteriaType, FeeChildren,
    FeeComponent, FeeComponentType, FeeConfig, FetchOption, FlowTarget, MarkupOption, MarkupValue,
    PspSelectionMode, RateSource, RiskAction, RiskDuration, RiskRule, RiskType, RoutingPsp,
    RoutingRule, Scope, Status, Versioned,
};
pub use dto::*;
pub use error::{ConfigError, DomainError, ErrorCode, StoreError};
pub use ports::ConfigRepository;
