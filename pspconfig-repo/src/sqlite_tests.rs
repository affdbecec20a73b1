//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use pspconfig_types::{
        ChargeFeeType, ConfigRepository, ConversionRateConfig, ConversionRateUpdate,
        CurrencyLimit, CustomerCriteriaType, DomainError, FeeChildren, FeeComponent,
        FeeComponentType, FeeConfig, FeeUpdate, FetchOption, FlowTarget, MarkupOption,
        MarkupValue, PspSelectionMode, RateSource, RiskAction, RiskDuration, RiskRule,
        RiskRuleUpdate, RiskType, RoutingPsp, RoutingRule, RoutingRuleUpdate, Scope, Status,
        StoreError,
    };

    use crate::SqliteRepo;

    async fn setup_repo() -> SqliteRepo {
        SqliteRepo::new("sqlite::memory:").await.unwrap()
    }

    fn scope() -> Scope {
        Scope::new("brn_test", "env_test")
    }

    fn fee_children() -> FeeChildren {
        FeeChildren {
            components: vec![FeeComponent {
                component_type: FeeComponentType::Percentage,
                amount: 1.5,
                min_value: Some(0.5),
                max_value: Some(20.0),
            }],
            countries: vec!["DE".to_string(), "NL".to_string()],
            psps: vec!["psp_a".to_string()],
        }
    }

    fn sample_fee() -> FeeConfig {
        FeeConfig::create(
            "card fee",
            "EUR",
            ChargeFeeType::Exclusive,
            scope(),
            "fat_payin",
            Some("tester"),
        )
    }

    fn fee_update(name: &str, children: FeeChildren) -> FeeUpdate {
        FeeUpdate {
            name: name.to_string(),
            currency: "EUR".to_string(),
            charge_fee_type: ChargeFeeType::Exclusive,
            flow_action_id: "fat_payin".to_string(),
            status: None,
            updated_by: Some("tester".to_string()),
            children,
        }
    }

    fn sample_rate(scope: Scope) -> ConversionRateConfig {
        ConversionRateConfig::create(RateSource::FixerApi, FetchOption::RealTime, scope, None)
    }

    fn markup(source: &str, target: &str) -> MarkupValue {
        MarkupValue {
            markup_option: MarkupOption::Percentage,
            source_currency: source.to_string(),
            target_currency: target.to_string(),
            amount: 0.5,
        }
    }

    fn sample_routing_rule(name: &str, is_default: bool) -> RoutingRule {
        RoutingRule::create(
            name,
            scope(),
            PspSelectionMode::Priority,
            json!({"country": "DE"}),
            is_default,
            None,
        )
    }

    fn routing_psps() -> Vec<RoutingPsp> {
        vec![RoutingPsp {
            psp_id: "psp_a".to_string(),
            psp_value: Some(1),
        }]
    }

    // Fees

    #[tokio::test]
    async fn test_fee_create_and_find_latest() {
        let repo = setup_repo().await;
        let fee = sample_fee();

        repo.insert_fee(&fee, &fee_children()).await.unwrap();

        let found = repo.find_latest_fee(&fee.id).await.unwrap().unwrap();
        assert_eq!(found.version, 1);
        assert_eq!(found.name, "card fee");
        assert_eq!(found.scope, scope());
        assert_eq!(found.status, Status::Enabled);

        let children = repo.fee_children(&fee.id, 1).await.unwrap();
        assert_eq!(children.components.len(), 1);
        assert_eq!(children.countries, vec!["DE", "NL"]);
        assert_eq!(children.psps, vec!["psp_a"]);
    }

    #[tokio::test]
    async fn test_fee_update_appends_version_and_replaces_children() {
        let repo = setup_repo().await;
        let fee = sample_fee();
        repo.insert_fee(&fee, &fee_children()).await.unwrap();

        let mut new_children = fee_children();
        new_children.psps = vec!["psp_b".to_string(), "psp_c".to_string()];

        let v2 = repo
            .insert_fee_version(&fee.id, fee_update("card fee v2", new_children))
            .await
            .unwrap();

        assert_eq!(v2.version, 2);
        assert_eq!(v2.created_by, "tester");

        // v1 row and children untouched
        let versions = repo.find_fee_versions(&fee.id).await.unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].version, 2);
        assert_eq!(versions[1].version, 1);
        assert_eq!(versions[1].name, "card fee");

        let v1_children = repo.fee_children(&fee.id, 1).await.unwrap();
        assert_eq!(v1_children.psps, vec!["psp_a"]);
        let v2_children = repo.fee_children(&fee.id, 2).await.unwrap();
        assert_eq!(v2_children.psps, vec!["psp_b", "psp_c"]);
    }

    #[tokio::test]
    async fn test_fee_update_with_empty_children() {
        let repo = setup_repo().await;
        let fee = sample_fee();
        repo.insert_fee(&fee, &fee_children()).await.unwrap();

        repo.insert_fee_version(&fee.id, fee_update("card fee", FeeChildren::default()))
            .await
            .unwrap();

        let v2_children = repo.fee_children(&fee.id, 2).await.unwrap();
        assert!(v2_children.components.is_empty());
        assert!(v2_children.psps.is_empty());

        let v1_children = repo.fee_children(&fee.id, 1).await.unwrap();
        assert_eq!(v1_children.components.len(), 1);
    }

    #[tokio::test]
    async fn test_fee_update_unknown_id() {
        let repo = setup_repo().await;

        let result = repo
            .insert_fee_version("fee_missing", fee_update("x", FeeChildren::default()))
            .await;

        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn test_fee_status_carries_over_unless_overridden() {
        let repo = setup_repo().await;
        let fee = sample_fee();
        repo.insert_fee(&fee, &fee_children()).await.unwrap();

        let mut disable = fee_update("card fee", fee_children());
        disable.status = Some(Status::Disabled);
        let v2 = repo.insert_fee_version(&fee.id, disable).await.unwrap();
        assert_eq!(v2.status, Status::Disabled);

        let v3 = repo
            .insert_fee_version(&fee.id, fee_update("card fee", fee_children()))
            .await
            .unwrap();
        assert_eq!(v3.status, Status::Disabled);
    }

    #[tokio::test]
    async fn test_fee_find_by_scope_returns_latest_per_id() {
        let repo = setup_repo().await;

        let fee_a = sample_fee();
        repo.insert_fee(&fee_a, &fee_children()).await.unwrap();
        repo.insert_fee_version(&fee_a.id, fee_update("fee a v2", fee_children()))
            .await
            .unwrap();

        let fee_b = FeeConfig::create(
            "other fee",
            "USD",
            ChargeFeeType::Inclusive,
            scope(),
            "fat_payout",
            None,
        );
        repo.insert_fee(&fee_b, &fee_children()).await.unwrap();

        let other_scope_fee = FeeConfig::create(
            "elsewhere",
            "EUR",
            ChargeFeeType::Exclusive,
            Scope::new("brn_other", "env_other"),
            "fat_payin",
            None,
        );
        repo.insert_fee(&other_scope_fee, &fee_children())
            .await
            .unwrap();

        let fees = repo.find_fees_by_scope(&scope()).await.unwrap();
        assert_eq!(fees.len(), 2);
        let a = fees.iter().find(|f| f.id == fee_a.id).unwrap();
        assert_eq!(a.version, 2);
        assert_eq!(a.name, "fee a v2");
    }

    #[tokio::test]
    async fn test_fee_find_by_name() {
        let repo = setup_repo().await;
        let fee = sample_fee();
        repo.insert_fee(&fee, &fee_children()).await.unwrap();

        let found = repo
            .find_fee_by_name(&scope(), "fat_payin", "card fee")
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, fee.id);

        let missing = repo
            .find_fee_by_name(&scope(), "fat_payout", "card fee")
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_fee_find_by_psp() {
        let repo = setup_repo().await;
        let fee = sample_fee();
        repo.insert_fee(&fee, &fee_children()).await.unwrap();

        let linked = repo.find_fees_by_psp(&scope(), "psp_a").await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].id, fee.id);

        let none = repo.find_fees_by_psp(&scope(), "psp_z").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_fee_delete_removes_all_versions() {
        let repo = setup_repo().await;
        let fee = sample_fee();
        repo.insert_fee(&fee, &fee_children()).await.unwrap();
        repo.insert_fee_version(&fee.id, fee_update("v2", fee_children()))
            .await
            .unwrap();

        let removed = repo.delete_fee(&fee.id).await.unwrap();
        assert_eq!(removed, 2);

        assert!(repo.find_latest_fee(&fee.id).await.unwrap().is_none());
        let children = repo.fee_children(&fee.id, 1).await.unwrap();
        assert!(children.components.is_empty());
    }

    #[tokio::test]
    async fn test_fee_delete_unknown_id() {
        let repo = setup_repo().await;

        let result = repo.delete_fee("fee_missing").await;

        assert!(matches!(result, Err(StoreError::NotFound)));
    }

    // Conversion rates

    #[tokio::test]
    async fn test_conversion_rate_duplicate_pair_rejected() {
        let repo = setup_repo().await;
        let first = sample_rate(scope());
        repo.insert_conversion_rate(&first, &markup("EUR", "USD"))
            .await
            .unwrap();

        let second = sample_rate(scope());
        let result = repo
            .insert_conversion_rate(&second, &markup("EUR", "USD"))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Domain(DomainError::DuplicateCurrencyPair { .. }))
        ));
    }

    #[tokio::test]
    async fn test_conversion_rate_different_pair_allowed() {
        let repo = setup_repo().await;
        repo.insert_conversion_rate(&sample_rate(scope()), &markup("EUR", "USD"))
            .await
            .unwrap();

        repo.insert_conversion_rate(&sample_rate(scope()), &markup("EUR", "GBP"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_conversion_rate_disabled_does_not_block_pair() {
        let repo = setup_repo().await;
        let first = sample_rate(scope());
        repo.insert_conversion_rate(&first, &markup("EUR", "USD"))
            .await
            .unwrap();

        repo.insert_conversion_rate_version(
            &first.id,
            ConversionRateUpdate {
                source_type: RateSource::FixerApi,
                fetch_option: FetchOption::RealTime,
                markup: markup("EUR", "USD"),
                status: Some(Status::Disabled),
                updated_by: None,
            },
        )
        .await
        .unwrap();

        // The pair is free again once its holder is disabled.
        repo.insert_conversion_rate(&sample_rate(scope()), &markup("EUR", "USD"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_conversion_rate_disabled_insert_still_checked() {
        let repo = setup_repo().await;
        repo.insert_conversion_rate(&sample_rate(scope()), &markup("EUR", "USD"))
            .await
            .unwrap();

        // The pair check runs on every write, not just enabled ones.
        let mut disabled = sample_rate(scope());
        disabled.status = Status::Disabled;
        let result = repo
            .insert_conversion_rate(&disabled, &markup("EUR", "USD"))
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Domain(DomainError::DuplicateCurrencyPair { .. }))
        ));
    }

    #[tokio::test]
    async fn test_conversion_rate_update_excludes_own_id() {
        let repo = setup_repo().await;
        let config = sample_rate(scope());
        repo.insert_conversion_rate(&config, &markup("EUR", "USD"))
            .await
            .unwrap();

        // Re-publishing the same pair on the same record must pass.
        let v2 = repo
            .insert_conversion_rate_version(
                &config.id,
                ConversionRateUpdate {
                    source_type: RateSource::Manual,
                    fetch_option: FetchOption::PreviousDayClosing,
                    markup: markup("EUR", "USD"),
                    status: None,
                    updated_by: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(v2.version, 2);
        assert_eq!(v2.source_type, RateSource::Manual);

        let stored = repo.conversion_rate_markup(&config.id, 2).await.unwrap();
        assert_eq!(stored.source_currency, "EUR");
        assert_eq!(stored.target_currency, "USD");
    }

    #[tokio::test]
    async fn test_conversion_rate_update_to_taken_pair_rejected() {
        let repo = setup_repo().await;
        repo.insert_conversion_rate(&sample_rate(scope()), &markup("EUR", "USD"))
            .await
            .unwrap();
        let second = sample_rate(scope());
        repo.insert_conversion_rate(&second, &markup("EUR", "GBP"))
            .await
            .unwrap();

        let result = repo
            .insert_conversion_rate_version(
                &second.id,
                ConversionRateUpdate {
                    source_type: RateSource::FixerApi,
                    fetch_option: FetchOption::RealTime,
                    markup: markup("EUR", "USD"),
                    status: None,
                    updated_by: None,
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(StoreError::Domain(DomainError::DuplicateCurrencyPair { .. }))
        ));
    }

    #[tokio::test]
    async fn test_conversion_rate_pair_free_in_other_scope() {
        let repo = setup_repo().await;
        repo.insert_conversion_rate(&sample_rate(scope()), &markup("EUR", "USD"))
            .await
            .unwrap();

        let elsewhere = sample_rate(Scope::new("brn_other", "env_other"));
        repo.insert_conversion_rate(&elsewhere, &markup("EUR", "USD"))
            .await
            .unwrap();
    }

    // Risk rules

    #[tokio::test]
    async fn test_risk_rule_roundtrip_and_versioning() {
        let repo = setup_repo().await;
        let rule = RiskRule::create(
            "daily cap",
            RiskType::Customer,
            RiskAction::Block,
            "EUR",
            RiskDuration::Day,
            Some(CustomerCriteriaType::Tag),
            Some("vip".to_string()),
            5_000.0,
            scope(),
            "fat_payin",
            Some("tester"),
        );
        repo.insert_risk_rule(&rule, &["psp_a".to_string()])
            .await
            .unwrap();

        let found = repo.find_latest_risk_rule(&rule.id).await.unwrap().unwrap();
        assert_eq!(found.criteria_type, Some(CustomerCriteriaType::Tag));
        assert_eq!(found.criteria_value.as_deref(), Some("vip"));
        assert_eq!(found.max_amount, 5_000.0);

        let v2 = repo
            .insert_risk_rule_version(
                &rule.id,
                RiskRuleUpdate {
                    name: "daily cap".to_string(),
                    rule_type: RiskType::Default,
                    action: RiskAction::Alert,
                    currency: "EUR".to_string(),
                    duration: RiskDuration::Week,
                    criteria_type: None,
                    criteria_value: None,
                    max_amount: 9_000.0,
                    flow_action_id: "fat_payin".to_string(),
                    psps: vec!["psp_b".to_string()],
                    status: None,
                    updated_by: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(v2.version, 2);
        assert_eq!(v2.criteria_type, None);

        let v1_psps = repo.risk_rule_psps(&rule.id, 1).await.unwrap();
        assert_eq!(v1_psps, vec!["psp_a"]);
        let v2_psps = repo.risk_rule_psps(&rule.id, 2).await.unwrap();
        assert_eq!(v2_psps, vec!["psp_b"]);
    }

    // Routing rules

    #[tokio::test]
    async fn test_routing_first_rule_forced_default() {
        let repo = setup_repo().await;
        let rule = sample_routing_rule("first", false);

        let written = repo
            .insert_routing_rule(&rule, &routing_psps())
            .await
            .unwrap();

        assert!(written.is_default);
        let stored = repo
            .find_latest_routing_rule(&rule.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.is_default);
    }

    #[tokio::test]
    async fn test_routing_new_default_demotes_previous() {
        let repo = setup_repo().await;
        let first = sample_routing_rule("first", true);
        repo.insert_routing_rule(&first, &routing_psps())
            .await
            .unwrap();

        let second = sample_routing_rule("second", true);
        let written = repo
            .insert_routing_rule(&second, &routing_psps())
            .await
            .unwrap();
        assert!(written.is_default);

        // The old default is demoted in place: flag flipped, still version 1.
        let old = repo
            .find_latest_routing_rule(&first.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!old.is_default);
        assert_eq!(old.version, 1);

        let versions = repo.find_routing_rule_versions(&first.id).await.unwrap();
        assert_eq!(versions.len(), 1);
    }

    #[tokio::test]
    async fn test_routing_update_promotion_demotes_others() {
        let repo = setup_repo().await;
        let first = sample_routing_rule("first", true);
        repo.insert_routing_rule(&first, &routing_psps())
            .await
            .unwrap();
        let second = sample_routing_rule("second", false);
        repo.insert_routing_rule(&second, &routing_psps())
            .await
            .unwrap();

        let promoted = repo
            .insert_routing_rule_version(
                &second.id,
                RoutingRuleUpdate {
                    name: "second".to_string(),
                    psp_selection_mode: None,
                    condition: None,
                    is_default: Some(true),
                    status: None,
                    updated_by: None,
                    psps: routing_psps(),
                },
            )
            .await
            .unwrap();

        assert_eq!(promoted.version, 2);
        assert!(promoted.is_default);

        let old = repo
            .find_latest_routing_rule(&first.id)
            .await
            .unwrap()
            .unwrap();
        assert!(!old.is_default);
    }

    #[tokio::test]
    async fn test_routing_update_carries_omitted_fields() {
        let repo = setup_repo().await;
        let rule = sample_routing_rule("only", true);
        repo.insert_routing_rule(&rule, &routing_psps())
            .await
            .unwrap();

        let v2 = repo
            .insert_routing_rule_version(
                &rule.id,
                RoutingRuleUpdate {
                    name: "renamed".to_string(),
                    psp_selection_mode: None,
                    condition: None,
                    is_default: None,
                    status: None,
                    updated_by: None,
                    psps: routing_psps(),
                },
            )
            .await
            .unwrap();

        assert!(v2.is_default);
        assert_eq!(v2.psp_selection_mode, PspSelectionMode::Priority);
        assert_eq!(v2.condition, json!({"country": "DE"}));
    }

    #[tokio::test]
    async fn test_routing_delete_default_forbidden_while_others_exist() {
        let repo = setup_repo().await;
        let first = sample_routing_rule("first", true);
        repo.insert_routing_rule(&first, &routing_psps())
            .await
            .unwrap();
        let second = sample_routing_rule("second", false);
        repo.insert_routing_rule(&second, &routing_psps())
            .await
            .unwrap();

        let result = repo.delete_routing_rule(&first.id).await;

        assert!(matches!(
            result,
            Err(StoreError::Domain(DomainError::DefaultRuleDeleteForbidden))
        ));
    }

    #[tokio::test]
    async fn test_routing_delete_last_rule_forbidden() {
        let repo = setup_repo().await;
        let only = sample_routing_rule("only", true);
        repo.insert_routing_rule(&only, &routing_psps())
            .await
            .unwrap();

        let result = repo.delete_routing_rule(&only.id).await;

        assert!(matches!(
            result,
            Err(StoreError::Domain(DomainError::LastRuleDeleteForbidden))
        ));
    }

    #[tokio::test]
    async fn test_routing_delete_non_default_succeeds() {
        let repo = setup_repo().await;
        let first = sample_routing_rule("first", true);
        repo.insert_routing_rule(&first, &routing_psps())
            .await
            .unwrap();
        let second = sample_routing_rule("second", false);
        repo.insert_routing_rule(&second, &routing_psps())
            .await
            .unwrap();

        let removed = repo.delete_routing_rule(&second.id).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(repo.count_routing_rules(&scope()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_routing_psps_per_version() {
        let repo = setup_repo().await;
        let rule = sample_routing_rule("rule", true);
        repo.insert_routing_rule(&rule, &routing_psps())
            .await
            .unwrap();

        let psps = repo.routing_rule_psps(&rule.id, 1).await.unwrap();
        assert_eq!(psps.len(), 1);
        assert_eq!(psps[0].psp_id, "psp_a");
        assert_eq!(psps[0].psp_value, Some(1));
    }

    // Currency facts

    #[tokio::test]
    async fn test_currency_limits_and_flow_targets() {
        let repo = setup_repo().await;

        let limit = CurrencyLimit {
            scope: scope(),
            flow_action_id: "fat_payin".to_string(),
            psp_id: "psp_a".to_string(),
            currency: "EUR".to_string(),
            min_value: 1.0,
            max_value: 10_000.0,
        };
        repo.upsert_currency_limit(&limit).await.unwrap();

        assert!(
            repo.currency_supported(&scope(), "fat_payin", "psp_a", "EUR")
                .await
                .unwrap()
        );
        assert!(
            !repo
                .currency_supported(&scope(), "fat_payin", "psp_a", "JPY")
                .await
                .unwrap()
        );

        let ids = repo
            .supported_psp_ids(&scope(), "fat_payin", "EUR")
            .await
            .unwrap();
        assert_eq!(ids, vec!["psp_a"]);

        let stored = repo
            .currency_limit(&scope(), "fat_payin", "psp_a", "EUR")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.max_value, 10_000.0);

        // Upsert overwrites the band.
        let mut wider = limit.clone();
        wider.max_value = 50_000.0;
        repo.upsert_currency_limit(&wider).await.unwrap();
        let stored = repo
            .currency_limit(&scope(), "fat_payin", "psp_a", "EUR")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.max_value, 50_000.0);

        let target = FlowTarget {
            id: "ftg_cards".to_string(),
            name: "cards".to_string(),
            currencies: vec!["EUR".to_string(), "USD".to_string()],
        };
        repo.upsert_flow_target(&target).await.unwrap();

        let found = repo.find_flow_target("ftg_cards").await.unwrap().unwrap();
        assert_eq!(found.currencies, vec!["EUR", "USD"]);
        assert!(repo.find_flow_target("ftg_missing").await.unwrap().is_none());
    }
}
