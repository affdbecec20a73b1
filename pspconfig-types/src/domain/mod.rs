//! Domain model for versioned PSP configuration records.

pub mod conversion_rate;
pub mod fee;
pub mod id;
pub mod lookup;
pub mod record;
pub mod risk_rule;
pub mod routing_rule;
pub mod scope;

pub use conversion_rate::{ConversionRateConfig, FetchOption, MarkupOption, MarkupValue, RateSource};
pub use fee::{ChargeFeeType, FeeChildren, FeeComponent, FeeComponentType, FeeConfig};
pub use lookup::{CurrencyLimit, FlowTarget};
pub use record::{Status, Versioned, audit_actor};
pub use risk_rule::{CustomerCriteriaType, RiskAction, RiskDuration, RiskRule, RiskType};
pub use routing_rule::{PspSelectionMode, RoutingPsp, RoutingRule};
pub use scope::Scope;
