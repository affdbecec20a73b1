//! Column-to-domain decoding helpers shared by the table modules.
//!
//! Enums are stored as their SCREAMING_SNAKE_CASE display strings and
//! timestamps as RFC 3339 text. A value that does not decode means the
//! schema and the code disagree, so it surfaces as a database error rather
//! than a domain one.

use chrono::{DateTime, Utc};

use pspconfig_types::{
    ChargeFeeType, CustomerCriteriaType, FeeComponentType, FetchOption, MarkupOption,
    PspSelectionMode, RateSource, RiskAction, RiskDuration, RiskType, Status, StoreError,
};

fn unknown(column: &str, value: &str) -> StoreError {
    StoreError::Database(format!("unreadable {column} column: {value}"))
}

pub(crate) fn timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| unknown("timestamp", value))
}

pub(crate) fn status(value: &str) -> Result<Status, StoreError> {
    match value {
        "ENABLED" => Ok(Status::Enabled),
        "DISABLED" => Ok(Status::Disabled),
        other => Err(unknown("status", other)),
    }
}

pub(crate) fn charge_fee_type(value: &str) -> Result<ChargeFeeType, StoreError> {
    match value {
        "INCLUSIVE" => Ok(ChargeFeeType::Inclusive),
        "EXCLUSIVE" => Ok(ChargeFeeType::Exclusive),
        other => Err(unknown("charge_fee_type", other)),
    }
}

pub(crate) fn component_type(value: &str) -> Result<FeeComponentType, StoreError> {
    match value {
        "FIXED" => Ok(FeeComponentType::Fixed),
        "FIXED_PER_UNIT" => Ok(FeeComponentType::FixedPerUnit),
        "PERCENTAGE" => Ok(FeeComponentType::Percentage),
        other => Err(unknown("component_type", other)),
    }
}

pub(crate) fn rate_source(value: &str) -> Result<RateSource, StoreError> {
    match value {
        "FIXER_API" => Ok(RateSource::FixerApi),
        "MANUAL" => Ok(RateSource::Manual),
        "CUSTOM_URL" => Ok(RateSource::CustomUrl),
        other => Err(unknown("source_type", other)),
    }
}

pub(crate) fn fetch_option(value: &str) -> Result<FetchOption, StoreError> {
    match value {
        "REAL_TIME" => Ok(FetchOption::RealTime),
        "PREVIOUS_DAY_CLOSING" => Ok(FetchOption::PreviousDayClosing),
        other => Err(unknown("fetch_option", other)),
    }
}

pub(crate) fn markup_option(value: &str) -> Result<MarkupOption, StoreError> {
    match value {
        "FIXED_PER_UNIT" => Ok(MarkupOption::FixedPerUnit),
        "PERCENTAGE" => Ok(MarkupOption::Percentage),
        other => Err(unknown("markup_option", other)),
    }
}

pub(crate) fn risk_type(value: &str) -> Result<RiskType, StoreError> {
    match value {
        "DEFAULT" => Ok(RiskType::Default),
        "CUSTOMER" => Ok(RiskType::Customer),
        other => Err(unknown("rule_type", other)),
    }
}

pub(crate) fn risk_action(value: &str) -> Result<RiskAction, StoreError> {
    match value {
        "BLOCK" => Ok(RiskAction::Block),
        "ALERT" => Ok(RiskAction::Alert),
        other => Err(unknown("action", other)),
    }
}

pub(crate) fn risk_duration(value: &str) -> Result<RiskDuration, StoreError> {
    match value {
        "HOUR" => Ok(RiskDuration::Hour),
        "DAY" => Ok(RiskDuration::Day),
        "WEEK" => Ok(RiskDuration::Week),
        "MONTH" => Ok(RiskDuration::Month),
        other => Err(unknown("duration", other)),
    }
}

pub(crate) fn criteria_type(value: &str) -> Result<CustomerCriteriaType, StoreError> {
    match value {
        "TAG" => Ok(CustomerCriteriaType::Tag),
        "ACCOUNT_TYPE" => Ok(CustomerCriteriaType::AccountType),
        other => Err(unknown("criteria_type", other)),
    }
}

pub(crate) fn selection_mode(value: &str) -> Result<PspSelectionMode, StoreError> {
    match value {
        "PRIORITY" => Ok(PspSelectionMode::Priority),
        "RANDOM" => Ok(PspSelectionMode::Random),
        "WEIGHTED" => Ok(PspSelectionMode::Weighted),
        other => Err(unknown("psp_selection_mode", other)),
    }
}
