//! Read-side facts used by currency validation.
//!
//! These are not versioned records; they describe what PSPs and flow
//! targets support and are seeded out of band.

use serde::{Deserialize, Serialize};

use super::scope::Scope;

/// States that one PSP supports `currency` for one flow action within a
/// scope, with the amount band it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyLimit {
    pub scope: Scope,
    pub flow_action_id: String,
    pub psp_id: String,
    pub currency: String,
    pub min_value: f64,
    pub max_value: f64,
}

/// A payment flow target and the currencies it accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowTarget {
    pub id: String,
    pub name: String,
    pub currencies: Vec<String>,
}
