//! Opaque record identifiers.
//!
//! Ids are TypeID-style strings: a short prefix naming the entity kind,
//! an underscore, then 26 random alphanumeric characters. The random part
//! is generated exactly once per record id; new versions reuse the id.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of the random portion of an id.
const RANDOM_LEN: usize = 26;

/// Entity-kind prefixes.
pub mod prefix {
    pub const BRAND: &str = "brn";
    pub const ENVIRONMENT: &str = "env";
    pub const FLOW_ACTION: &str = "fat";
    pub const FLOW_TARGET: &str = "ftg";
    pub const PSP: &str = "psp";
    pub const FEE: &str = "fee";
    pub const CONVERSION_RATE: &str = "crc";
    pub const RISK_RULE: &str = "rrl";
    pub const ROUTING_RULE: &str = "rtr";
}

/// Generates a new id with the given prefix.
pub fn generate(prefix: &str) -> String {
    let random: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_LEN)
        .map(char::from)
        .collect();

    if prefix.is_empty() {
        random
    } else {
        format!("{prefix}_{random}")
    }
}

/// Returns true if `id` carries the expected prefix.
pub fn has_prefix(id: &str, expected: &str) -> bool {
    id.strip_prefix(expected)
        .and_then(|rest| rest.strip_prefix('_'))
        .is_some_and(|rest| !rest.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_has_prefix_and_length() {
        let id = generate(prefix::FEE);
        assert!(has_prefix(&id, prefix::FEE));
        assert_eq!(id.len(), "fee".len() + 1 + RANDOM_LEN);
    }

    #[test]
    fn test_generate_is_unique() {
        let a = generate(prefix::ROUTING_RULE);
        let b = generate(prefix::ROUTING_RULE);
        assert_ne!(a, b);
    }

    #[test]
    fn test_has_prefix_rejects_wrong_kind() {
        let id = generate(prefix::RISK_RULE);
        assert!(!has_prefix(&id, prefix::FEE));
        assert!(!has_prefix("fee", prefix::FEE));
    }
}
