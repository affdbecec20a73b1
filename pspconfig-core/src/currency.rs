//! Currency support validators over the read-side currency facts.
//!
//! Two policies, both keyed by `(scope, flow_action, currency)`:
//! - ALL: every PSP in the list must support the currency (fees);
//! - ANY with fallback: the ALL check first, and on failure the request
//!   still passes if at least one of the listed PSPs supports the
//!   currency (risk rules). The asymmetry is intentional: a fee applies
//!   to every linked PSP, a risk rule only needs one viable route.

use pspconfig_types::{ConfigRepository, DomainError, Scope, StoreError};

/// Fails unless every listed PSP supports the currency. The error names
/// the PSPs that do not. An empty list passes vacuously.
pub async fn validate_all_supported<R: ConfigRepository>(
    repo: &R,
    scope: &Scope,
    flow_action_id: &str,
    currency: &str,
    psp_ids: &[String],
) -> Result<(), StoreError> {
    let unsupported = unsupported_psps(repo, scope, flow_action_id, currency, psp_ids).await?;

    if !unsupported.is_empty() {
        return Err(StoreError::Domain(DomainError::CurrencyNotSupported {
            currency: currency.to_string(),
            unsupported_psps: unsupported,
        }));
    }

    Ok(())
}

/// ALL check first; on failure, passes anyway when at least one listed PSP
/// supports the currency. Fails only when none does.
pub async fn validate_with_fallback<R: ConfigRepository>(
    repo: &R,
    scope: &Scope,
    flow_action_id: &str,
    currency: &str,
    psp_ids: &[String],
) -> Result<(), StoreError> {
    let unsupported = unsupported_psps(repo, scope, flow_action_id, currency, psp_ids).await?;

    if unsupported.is_empty() {
        return Ok(());
    }

    let supporting = repo
        .supported_psp_ids(scope, flow_action_id, currency)
        .await?;
    let any_supported = psp_ids.iter().any(|id| supporting.contains(id));

    if !any_supported {
        return Err(StoreError::Domain(DomainError::NoPspSupportsCurrency {
            currency: currency.to_string(),
        }));
    }

    tracing::warn!(
        currency,
        flow_action_id,
        unsupported = ?unsupported,
        "currency not supported by every psp, accepting on partial support"
    );
    Ok(())
}

async fn unsupported_psps<R: ConfigRepository>(
    repo: &R,
    scope: &Scope,
    flow_action_id: &str,
    currency: &str,
    psp_ids: &[String],
) -> Result<Vec<String>, StoreError> {
    let mut unsupported = Vec::new();
    for psp_id in psp_ids {
        if !repo
            .currency_supported(scope, flow_action_id, psp_id, currency)
            .await?
        {
            unsupported.push(psp_id.clone());
        }
    }
    Ok(unsupported)
}
