//! Request payload validation. Pure checks over the DTOs; anything that
//! needs a database lookup lives in `currency` or `operation`.

use std::collections::HashSet;

use pspconfig_types::{
    DomainError, FeeChildren, FeeComponent, MarkupValue, RiskType, RoutingPsp,
};

pub(crate) fn require(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::MissingField { field });
    }
    Ok(())
}

/// Component rules: at least one, no duplicate types, positive amounts,
/// coherent bounds.
pub(crate) fn fee_components(components: &[FeeComponent]) -> Result<(), DomainError> {
    if components.is_empty() {
        return Err(DomainError::MissingField {
            field: "components",
        });
    }

    let mut seen = HashSet::new();
    for component in components {
        if !seen.insert(component.component_type) {
            return Err(DomainError::Invalid(format!(
                "duplicate fee component type: {}",
                component.component_type
            )));
        }
        if component.amount <= 0.0 {
            return Err(DomainError::Invalid(
                "fee component amount must be positive".to_string(),
            ));
        }
        if let (Some(min), Some(max)) = (component.min_value, component.max_value) {
            if min >= max {
                return Err(DomainError::Invalid(format!(
                    "fee component min_value {min} must be below max_value {max}"
                )));
            }
        }
    }

    Ok(())
}

pub(crate) fn fee_children(children: &FeeChildren) -> Result<(), DomainError> {
    fee_components(&children.components)?;
    if children.countries.is_empty() {
        return Err(DomainError::MissingField { field: "countries" });
    }
    if children.psps.is_empty() {
        return Err(DomainError::MissingField { field: "psps" });
    }
    Ok(())
}

pub(crate) fn markup(markup: &MarkupValue) -> Result<(), DomainError> {
    require("source_currency", &markup.source_currency)?;
    require("target_currency", &markup.target_currency)?;
    if markup.amount < 0.0 {
        return Err(DomainError::Invalid(
            "markup amount must not be negative".to_string(),
        ));
    }
    Ok(())
}

/// CUSTOMER rules carry both criteria fields; DEFAULT rules carry neither.
pub(crate) fn risk_criteria(
    rule_type: RiskType,
    criteria_type: bool,
    criteria_value: Option<&str>,
) -> Result<(), DomainError> {
    let has_value = criteria_value.is_some_and(|v| !v.trim().is_empty());
    match rule_type {
        RiskType::Customer => {
            if !criteria_type || !has_value {
                return Err(DomainError::Invalid(
                    "customer risk rules require criteria_type and criteria_value".to_string(),
                ));
            }
        }
        RiskType::Default => {
            if criteria_type || has_value {
                return Err(DomainError::Invalid(
                    "default risk rules must not carry customer criteria".to_string(),
                ));
            }
        }
    }
    Ok(())
}

pub(crate) fn risk_amount(max_amount: f64) -> Result<(), DomainError> {
    if max_amount <= 0.0 {
        return Err(DomainError::Invalid(
            "max_amount must be positive".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn psp_list(psps: &[String]) -> Result<(), DomainError> {
    if psps.is_empty() {
        return Err(DomainError::MissingField { field: "psps" });
    }
    Ok(())
}

pub(crate) fn routing_psps(psps: &[RoutingPsp]) -> Result<(), DomainError> {
    if psps.is_empty() {
        return Err(DomainError::MissingField { field: "psps" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pspconfig_types::FeeComponentType;

    fn component(component_type: FeeComponentType, amount: f64) -> FeeComponent {
        FeeComponent {
            component_type,
            amount,
            min_value: None,
            max_value: None,
        }
    }

    #[test]
    fn test_fee_components_rejects_duplicates() {
        let components = vec![
            component(FeeComponentType::Fixed, 1.0),
            component(FeeComponentType::Fixed, 2.0),
        ];
        assert!(fee_components(&components).is_err());
    }

    #[test]
    fn test_fee_components_rejects_inverted_bounds() {
        let mut bad = component(FeeComponentType::Percentage, 1.0);
        bad.min_value = Some(10.0);
        bad.max_value = Some(5.0);
        assert!(fee_components(&[bad]).is_err());
    }

    #[test]
    fn test_risk_criteria_rules() {
        assert!(risk_criteria(RiskType::Customer, true, Some("vip")).is_ok());
        assert!(risk_criteria(RiskType::Customer, false, None).is_err());
        assert!(risk_criteria(RiskType::Customer, true, Some("  ")).is_err());
        assert!(risk_criteria(RiskType::Default, false, None).is_ok());
        assert!(risk_criteria(RiskType::Default, true, Some("vip")).is_err());
    }
}
