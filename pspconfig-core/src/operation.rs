//! Batch validation of operation currencies against a flow target.

use pspconfig_types::{ConfigRepository, DomainError, OperationCurrencyRequest, StoreError};

/// Checks every requested `(flow_action, currency)` against the flow
/// target's currency list. A missing or currency-less flow target fails
/// immediately; currency violations are collected across the whole batch
/// and reported together, never fail-fast.
pub async fn validate_operation_currencies<R: ConfigRepository>(
    repo: &R,
    request: &OperationCurrencyRequest,
) -> Result<(), StoreError> {
    let target = repo
        .find_flow_target(&request.flow_target_id)
        .await?
        .ok_or_else(|| {
            StoreError::Domain(DomainError::FlowTargetNotFound(
                request.flow_target_id.clone(),
            ))
        })?;

    if target.currencies.is_empty() {
        return Err(StoreError::Domain(DomainError::FlowTargetWithoutCurrencies));
    }

    let mut violations = Vec::new();
    for operation in &request.operations {
        for entry in &operation.currencies {
            if !target.currencies.contains(&entry.currency) {
                violations.push(format!(
                    "currency {} is not supported by flow target {} for flow action {}",
                    entry.currency, target.name, operation.flow_action_id
                ));
            }
        }
    }

    if !violations.is_empty() {
        return Err(StoreError::Domain(
            DomainError::OperationCurrenciesRejected { violations },
        ));
    }

    Ok(())
}
