//! Conversion-rate configuration records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{self, prefix};
use super::record::{Status, Versioned, audit_actor};
use super::scope::Scope;

/// Where rates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateSource {
    FixerApi,
    Manual,
    CustomUrl,
}

impl std::fmt::Display for RateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateSource::FixerApi => write!(f, "FIXER_API"),
            RateSource::Manual => write!(f, "MANUAL"),
            RateSource::CustomUrl => write!(f, "CUSTOM_URL"),
        }
    }
}

/// Which quote the source is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FetchOption {
    RealTime,
    PreviousDayClosing,
}

impl std::fmt::Display for FetchOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchOption::RealTime => write!(f, "REAL_TIME"),
            FetchOption::PreviousDayClosing => write!(f, "PREVIOUS_DAY_CLOSING"),
        }
    }
}

/// How the markup amount is applied to the fetched rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarkupOption {
    FixedPerUnit,
    Percentage,
}

impl std::fmt::Display for MarkupOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkupOption::FixedPerUnit => write!(f, "FIXED_PER_UNIT"),
            MarkupOption::Percentage => write!(f, "PERCENTAGE"),
        }
    }
}

/// Markup applied on top of a source/target currency pair. Each conversion
/// rate version owns exactly one markup value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupValue {
    pub markup_option: MarkupOption,
    pub source_currency: String,
    pub target_currency: String,
    pub amount: f64,
}

/// One immutable version of a conversion-rate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRateConfig {
    pub id: String,
    pub version: i32,
    pub source_type: RateSource,
    pub fetch_option: FetchOption,
    pub scope: Scope,
    pub status: Status,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl ConversionRateConfig {
    /// Builds version 1 of a new conversion-rate configuration.
    pub fn create(
        source_type: RateSource,
        fetch_option: FetchOption,
        scope: Scope,
        created_by: Option<&str>,
    ) -> Self {
        let now = Utc::now();
        let actor = audit_actor(created_by);
        Self {
            id: id::generate(prefix::CONVERSION_RATE),
            version: 1,
            source_type,
            fetch_option,
            scope,
            status: Status::Enabled,
            created_at: now,
            created_by: actor.clone(),
            updated_at: now,
            updated_by: actor,
        }
    }

    /// Builds the next version of this configuration.
    pub fn new_version(
        &self,
        source_type: RateSource,
        fetch_option: FetchOption,
        status: Status,
        updated_by: Option<&str>,
    ) -> Self {
        Self {
            id: self.id.clone(),
            version: self.version + 1,
            source_type,
            fetch_option,
            scope: self.scope.clone(),
            status,
            created_at: self.created_at,
            created_by: self.created_by.clone(),
            updated_at: Utc::now(),
            updated_by: audit_actor(updated_by),
        }
    }
}

impl Versioned for ConversionRateConfig {
    fn record_id(&self) -> &str {
        &self.id
    }

    fn record_version(&self) -> i32 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_version_increments_and_carries_scope() {
        let v1 = ConversionRateConfig::create(
            RateSource::FixerApi,
            FetchOption::RealTime,
            Scope::new("brn_1", "env_1"),
            None,
        );
        assert_eq!(v1.version, 1);
        assert_eq!(v1.created_by, "system");

        let v2 = v1.new_version(
            RateSource::Manual,
            FetchOption::PreviousDayClosing,
            Status::Disabled,
            Some("bob"),
        );
        assert_eq!(v2.version, 2);
        assert_eq!(v2.id, v1.id);
        assert_eq!(v2.scope, v1.scope);
        assert_eq!(v2.created_at, v1.created_at);
        assert_eq!(v2.updated_by, "bob");
    }
}
