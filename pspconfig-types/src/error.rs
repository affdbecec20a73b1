//! Error types for the configuration core.
//!
//! Three layers, innermost first:
//! - [`DomainError`] - business-rule violations, no IO involved
//! - [`StoreError`] - what repository adapters return
//! - [`ConfigError`] - what the service surfaces, each variant carrying a
//!   stable [`ErrorCode`]

use thiserror::Error;

/// Business-rule violations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("{0}")]
    Invalid(String),

    #[error(
        "an enabled conversion rate already exists for {source_currency}->{target_currency} with {markup_option} markup"
    )]
    DuplicateCurrencyPair {
        source_currency: String,
        target_currency: String,
        markup_option: String,
    },

    #[error("currency {currency} is not supported by psps: {}", unsupported_psps.join(", "))]
    CurrencyNotSupported {
        currency: String,
        unsupported_psps: Vec<String>,
    },

    #[error("no configured psp supports currency {currency}")]
    NoPspSupportsCurrency { currency: String },

    #[error("flow target not found: {0}")]
    FlowTargetNotFound(String),

    #[error("flow target has no supported currencies")]
    FlowTargetWithoutCurrencies,

    #[error("operation currencies rejected: {}", violations.join("; "))]
    OperationCurrenciesRejected { violations: Vec<String> },

    #[error("cannot delete the default routing rule while other rules exist")]
    DefaultRuleDeleteForbidden,

    #[error("cannot delete the last routing rule in scope")]
    LastRuleDeleteForbidden,
}

/// Errors from repository adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("database error: {0}")]
    Database(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("record not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Stable error codes exposed to clients. Codes are string-typed numerics
/// so they survive serialization unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    GenericError,
    ValidationError,
    ResourceNotFound,
    Conflict,
    DatabaseError,
    PspConfigurationError,
    PspCurrencyNotSupported,
    FeeNotFound,
    FeeAlreadyExists,
    FeeConfigurationError,
    ConversionRateNotFound,
    ConversionRateInvalid,
    RiskRuleNotFound,
    RiskRuleInvalid,
    RoutingRuleNotFound,
    RoutingRuleInvalid,
    RoutingDefaultRuleDeleteForbidden,
    RoutingLastRuleDeleteForbidden,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::GenericError => "1000",
            ErrorCode::ValidationError => "1001",
            ErrorCode::ResourceNotFound => "1003",
            ErrorCode::Conflict => "1006",
            ErrorCode::DatabaseError => "1100",
            ErrorCode::PspConfigurationError => "1602",
            ErrorCode::PspCurrencyNotSupported => "1612",
            ErrorCode::FeeNotFound => "1700",
            ErrorCode::FeeAlreadyExists => "1701",
            ErrorCode::FeeConfigurationError => "1704",
            ErrorCode::ConversionRateNotFound => "1800",
            ErrorCode::ConversionRateInvalid => "1802",
            ErrorCode::RiskRuleNotFound => "2100",
            ErrorCode::RiskRuleInvalid => "2102",
            ErrorCode::RoutingRuleNotFound => "2200",
            ErrorCode::RoutingRuleInvalid => "2202",
            ErrorCode::RoutingDefaultRuleDeleteForbidden => "2205",
            ErrorCode::RoutingLastRuleDeleteForbidden => "2206",
        }
    }

    /// HTTP status an outer transport layer should use for this code.
    /// Exhaustive on purpose: adding a code without a status is a compile
    /// error.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::GenericError => 500,
            ErrorCode::ValidationError => 400,
            ErrorCode::ResourceNotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::DatabaseError => 500,
            ErrorCode::PspConfigurationError => 422,
            ErrorCode::PspCurrencyNotSupported => 422,
            ErrorCode::FeeNotFound => 404,
            ErrorCode::FeeAlreadyExists => 409,
            ErrorCode::FeeConfigurationError => 422,
            ErrorCode::ConversionRateNotFound => 404,
            ErrorCode::ConversionRateInvalid => 422,
            ErrorCode::RiskRuleNotFound => 404,
            ErrorCode::RiskRuleInvalid => 422,
            ErrorCode::RoutingRuleNotFound => 404,
            ErrorCode::RoutingRuleInvalid => 422,
            ErrorCode::RoutingDefaultRuleDeleteForbidden => 422,
            ErrorCode::RoutingLastRuleDeleteForbidden => 422,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Service-level errors. `Validation`/`NotFound`/`Conflict` carry the
/// [`ErrorCode`] clients key on; `Storage` hides the engine detail behind
/// [`ErrorCode::DatabaseError`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("[{code}] {message}")]
    Validation { code: ErrorCode, message: String },

    #[error("[{code}] {message}")]
    NotFound { code: ErrorCode, message: String },

    #[error("[{code}] {message}")]
    Conflict { code: ErrorCode, message: String },

    #[error("storage failure")]
    Storage,
}

impl ConfigError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        ConfigError::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        ConfigError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        ConfigError::Conflict {
            code,
            message: message.into(),
        }
    }

    /// The code clients see.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ConfigError::Validation { code, .. }
            | ConfigError::NotFound { code, .. }
            | ConfigError::Conflict { code, .. } => *code,
            ConfigError::Storage => ErrorCode::DatabaseError,
        }
    }

    pub fn http_status(&self) -> u16 {
        self.error_code().http_status()
    }
}

impl From<DomainError> for ConfigError {
    fn from(err: DomainError) -> Self {
        let message = err.to_string();
        match err {
            DomainError::MissingField { .. } | DomainError::Invalid(_) => {
                ConfigError::validation(ErrorCode::ValidationError, message)
            }
            DomainError::DuplicateCurrencyPair { .. } => {
                ConfigError::validation(ErrorCode::ConversionRateInvalid, message)
            }
            DomainError::CurrencyNotSupported { .. } => {
                ConfigError::validation(ErrorCode::FeeConfigurationError, message)
            }
            DomainError::NoPspSupportsCurrency { .. } => {
                ConfigError::validation(ErrorCode::ValidationError, message)
            }
            DomainError::FlowTargetNotFound(_) => {
                ConfigError::validation(ErrorCode::PspConfigurationError, message)
            }
            DomainError::FlowTargetWithoutCurrencies
            | DomainError::OperationCurrenciesRejected { .. } => {
                ConfigError::validation(ErrorCode::PspCurrencyNotSupported, message)
            }
            DomainError::DefaultRuleDeleteForbidden => {
                ConfigError::validation(ErrorCode::RoutingDefaultRuleDeleteForbidden, message)
            }
            DomainError::LastRuleDeleteForbidden => {
                ConfigError::validation(ErrorCode::RoutingLastRuleDeleteForbidden, message)
            }
        }
    }
}

impl From<StoreError> for ConfigError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(domain) => domain.into(),
            StoreError::Database(detail) | StoreError::Transaction(detail) => {
                // Engine messages carry table and constraint names; log
                // them, never return them.
                tracing::error!(error = %detail, "storage failure");
                ConfigError::Storage
            }
            StoreError::NotFound => {
                ConfigError::not_found(ErrorCode::ResourceNotFound, "record not found")
            }
            StoreError::Conflict(msg) => ConfigError::conflict(ErrorCode::Conflict, msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_guard_errors_map_to_routing_codes() {
        let err: ConfigError = StoreError::Domain(DomainError::DefaultRuleDeleteForbidden).into();
        assert_eq!(err.error_code(), ErrorCode::RoutingDefaultRuleDeleteForbidden);
        assert_eq!(err.error_code().code(), "2205");
        assert_eq!(err.http_status(), 422);

        let err: ConfigError = DomainError::LastRuleDeleteForbidden.into();
        assert_eq!(err.error_code().code(), "2206");
    }

    #[test]
    fn test_storage_errors_hide_engine_detail() {
        let raw = "UNIQUE constraint failed: fees.id, fees.version";
        let err: ConfigError = StoreError::Database(raw.into()).into();
        assert_eq!(err.error_code(), ErrorCode::DatabaseError);
        assert_eq!(err.error_code().code(), "1100");
        assert_eq!(err.http_status(), 500);

        let shown = err.to_string();
        assert!(!shown.contains("UNIQUE"));
        assert!(!shown.contains("fees"));
        assert_eq!(shown, "storage failure");

        let err: ConfigError = StoreError::Transaction("cannot rollback".into()).into();
        assert_eq!(err.error_code(), ErrorCode::DatabaseError);
        assert_eq!(err.to_string(), "storage failure");
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ConfigError = StoreError::NotFound.into();
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn test_duplicate_pair_maps_to_conversion_rate_invalid() {
        let err: ConfigError = DomainError::DuplicateCurrencyPair {
            source_currency: "EUR".into(),
            target_currency: "USD".into(),
            markup_option: "FIXED_PER_UNIT".into(),
        }
        .into();
        assert_eq!(err.error_code().code(), "1802");
    }
}
