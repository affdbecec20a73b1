//! Per-kind table bindings for the scoped record store.

pub(crate) mod conversion_rate;
pub(crate) mod fee;
pub(crate) mod risk_rule;
pub(crate) mod routing_rule;
