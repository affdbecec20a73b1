//! Tenant scope.

use serde::{Deserialize, Serialize};

/// The `(brand, environment)` pair that partitions configuration data
/// per tenant environment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub brand_id: String,
    pub environment_id: String,
}

impl Scope {
    pub fn new(brand_id: impl Into<String>, environment_id: impl Into<String>) -> Self {
        Self {
            brand_id: brand_id.into(),
            environment_id: environment_id.into(),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.brand_id, self.environment_id)
    }
}
