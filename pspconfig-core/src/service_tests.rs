//! Service tests against the SQLite adapter.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use pspconfig_repo::SqliteRepo;
    use pspconfig_types::{
        ChargeFeeType, ConfigError, CurrencyLimit, CustomerCriteriaType, ErrorCode,
        FeeChildren, FeeComponent, FeeComponentType, FeeUpdate, FetchOption, FlowTarget,
        MarkupOption, MarkupValue, NewConversionRate, NewFee, NewRiskRule, NewRoutingRule,
        OperationCurrency, OperationCurrencyRequest, PspOperation, PspSelectionMode,
        RateSource, RiskAction, RiskDuration, RiskType, RoutingPsp, RoutingRuleUpdate, Scope,
        Status,
    };

    use crate::ConfigService;

    async fn setup() -> ConfigService<SqliteRepo> {
        let repo = SqliteRepo::new("sqlite::memory:").await.unwrap();
        ConfigService::new(repo)
    }

    fn scope() -> Scope {
        Scope::new("brn_test", "env_test")
    }

    async fn seed_support(service: &ConfigService<SqliteRepo>, psp_id: &str, currency: &str) {
        service
            .seed_currency_limit(&CurrencyLimit {
                scope: scope(),
                flow_action_id: "fat_payin".to_string(),
                psp_id: psp_id.to_string(),
                currency: currency.to_string(),
                min_value: 1.0,
                max_value: 100_000.0,
            })
            .await
            .unwrap();
    }

    fn components() -> Vec<FeeComponent> {
        vec![FeeComponent {
            component_type: FeeComponentType::Percentage,
            amount: 2.0,
            min_value: Some(0.5),
            max_value: Some(25.0),
        }]
    }

    fn new_fee(name: &str, psps: Vec<String>) -> NewFee {
        NewFee {
            name: name.to_string(),
            currency: "EUR".to_string(),
            charge_fee_type: ChargeFeeType::Exclusive,
            scope: scope(),
            flow_action_id: "fat_payin".to_string(),
            components: components(),
            countries: vec!["DE".to_string()],
            psps,
            created_by: Some("tester".to_string()),
        }
    }

    fn new_conversion_rate(source: &str, target: &str) -> NewConversionRate {
        NewConversionRate {
            source_type: RateSource::FixerApi,
            fetch_option: FetchOption::RealTime,
            scope: scope(),
            markup: MarkupValue {
                markup_option: MarkupOption::Percentage,
                source_currency: source.to_string(),
                target_currency: target.to_string(),
                amount: 0.4,
            },
            created_by: None,
        }
    }

    fn new_risk_rule(psps: Vec<String>) -> NewRiskRule {
        NewRiskRule {
            name: "daily cap".to_string(),
            rule_type: RiskType::Default,
            action: RiskAction::Block,
            currency: "EUR".to_string(),
            duration: RiskDuration::Day,
            criteria_type: None,
            criteria_value: None,
            max_amount: 5_000.0,
            scope: scope(),
            flow_action_id: "fat_payin".to_string(),
            psps,
            created_by: None,
        }
    }

    fn new_routing_rule(name: &str, is_default: Option<bool>) -> NewRoutingRule {
        NewRoutingRule {
            name: name.to_string(),
            scope: scope(),
            psp_selection_mode: PspSelectionMode::Priority,
            condition: json!({"method": "card"}),
            is_default,
            psps: vec![RoutingPsp {
                psp_id: "psp_a".to_string(),
                psp_value: Some(1),
            }],
            created_by: None,
        }
    }

    fn code(err: &ConfigError) -> ErrorCode {
        err.error_code()
    }

    // Fees

    #[tokio::test]
    async fn test_create_fee_happy_path() {
        let service = setup().await;
        seed_support(&service, "psp_a", "EUR").await;

        let details = service
            .create_fee(new_fee("card fee", vec!["psp_a".to_string()]))
            .await
            .unwrap();

        assert_eq!(details.fee.version, 1);
        assert_eq!(details.fee.status, Status::Enabled);
        assert_eq!(details.children.psps, vec!["psp_a"]);

        let fetched = service.get_fee(&details.fee.id).await.unwrap();
        assert_eq!(fetched.fee.name, "card fee");
        assert_eq!(fetched.children.components.len(), 1);
    }

    #[tokio::test]
    async fn test_create_fee_name_conflict() {
        let service = setup().await;
        seed_support(&service, "psp_a", "EUR").await;

        service
            .create_fee(new_fee("card fee", vec!["psp_a".to_string()]))
            .await
            .unwrap();

        let err = service
            .create_fee(new_fee("card fee", vec!["psp_a".to_string()]))
            .await
            .unwrap_err();

        assert_eq!(code(&err), ErrorCode::FeeAlreadyExists);
        assert_eq!(err.http_status(), 409);
    }

    #[tokio::test]
    async fn test_create_fee_unsupported_currency_names_psps() {
        let service = setup().await;
        seed_support(&service, "psp_a", "EUR").await;
        // psp_b has no EUR support

        let err = service
            .create_fee(new_fee(
                "card fee",
                vec!["psp_a".to_string(), "psp_b".to_string()],
            ))
            .await
            .unwrap_err();

        assert_eq!(code(&err), ErrorCode::FeeConfigurationError);
        assert!(err.to_string().contains("psp_b"));
        assert!(!err.to_string().contains("psp_a,"));
    }

    #[tokio::test]
    async fn test_create_fee_without_components_rejected() {
        let service = setup().await;
        seed_support(&service, "psp_a", "EUR").await;

        let mut req = new_fee("card fee", vec!["psp_a".to_string()]);
        req.components.clear();

        let err = service.create_fee(req).await.unwrap_err();
        assert_eq!(code(&err), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_create_fee_duplicate_component_types_rejected() {
        let service = setup().await;
        seed_support(&service, "psp_a", "EUR").await;

        let mut req = new_fee("card fee", vec!["psp_a".to_string()]);
        req.components = vec![
            FeeComponent {
                component_type: FeeComponentType::Fixed,
                amount: 1.0,
                min_value: None,
                max_value: None,
            },
            FeeComponent {
                component_type: FeeComponentType::Fixed,
                amount: 2.0,
                min_value: None,
                max_value: None,
            },
        ];

        let err = service.create_fee(req).await.unwrap_err();
        assert_eq!(code(&err), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_update_fee_validates_against_existing_currency() {
        let service = setup().await;
        seed_support(&service, "psp_a", "EUR").await;

        let details = service
            .create_fee(new_fee("card fee", vec!["psp_a".to_string()]))
            .await
            .unwrap();

        // psp_b does not support the fee's EUR, so swapping it in fails.
        let err = service
            .update_fee(
                &details.fee.id,
                FeeUpdate {
                    name: "card fee".to_string(),
                    currency: "EUR".to_string(),
                    charge_fee_type: ChargeFeeType::Exclusive,
                    flow_action_id: "fat_payin".to_string(),
                    status: None,
                    updated_by: None,
                    children: FeeChildren {
                        components: components(),
                        countries: vec!["DE".to_string()],
                        psps: vec!["psp_b".to_string()],
                    },
                },
            )
            .await
            .unwrap_err();

        assert_eq!(code(&err), ErrorCode::FeeConfigurationError);
    }

    #[tokio::test]
    async fn test_update_fee_not_found() {
        let service = setup().await;

        let err = service
            .update_fee(
                "fee_missing",
                FeeUpdate {
                    name: "x".to_string(),
                    currency: "EUR".to_string(),
                    charge_fee_type: ChargeFeeType::Exclusive,
                    flow_action_id: "fat_payin".to_string(),
                    status: None,
                    updated_by: None,
                    children: FeeChildren {
                        components: components(),
                        countries: vec!["DE".to_string()],
                        psps: vec!["psp_a".to_string()],
                    },
                },
            )
            .await
            .unwrap_err();

        assert_eq!(code(&err), ErrorCode::FeeNotFound);
        assert_eq!(err.http_status(), 404);
    }

    // Conversion rates

    #[tokio::test]
    async fn test_conversion_rate_duplicate_then_disable_then_reuse() {
        let service = setup().await;

        let first = service
            .create_conversion_rate(new_conversion_rate("EUR", "USD"))
            .await
            .unwrap();

        let err = service
            .create_conversion_rate(new_conversion_rate("EUR", "USD"))
            .await
            .unwrap_err();
        assert_eq!(code(&err), ErrorCode::ConversionRateInvalid);

        // Disable the holder, then the pair is free again.
        service
            .update_conversion_rate(
                &first.config.id,
                pspconfig_types::ConversionRateUpdate {
                    source_type: RateSource::FixerApi,
                    fetch_option: FetchOption::RealTime,
                    markup: first.markup.clone(),
                    status: Some(Status::Disabled),
                    updated_by: None,
                },
            )
            .await
            .unwrap();

        service
            .create_conversion_rate(new_conversion_rate("EUR", "USD"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_conversion_rate_get_returns_markup() {
        let service = setup().await;

        let created = service
            .create_conversion_rate(new_conversion_rate("EUR", "GBP"))
            .await
            .unwrap();

        let fetched = service.get_conversion_rate(&created.config.id).await.unwrap();
        assert_eq!(fetched.markup.target_currency, "GBP");
        assert_eq!(fetched.config.version, 1);
    }

    #[tokio::test]
    async fn test_conversion_rate_not_found() {
        let service = setup().await;

        let err = service.get_conversion_rate("crc_missing").await.unwrap_err();
        assert_eq!(code(&err), ErrorCode::ConversionRateNotFound);
    }

    // Risk rules

    #[tokio::test]
    async fn test_risk_rule_customer_requires_criteria() {
        let service = setup().await;
        seed_support(&service, "psp_a", "EUR").await;

        let mut req = new_risk_rule(vec!["psp_a".to_string()]);
        req.rule_type = RiskType::Customer;

        let err = service.create_risk_rule(req).await.unwrap_err();
        assert_eq!(code(&err), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_risk_rule_default_rejects_criteria() {
        let service = setup().await;
        seed_support(&service, "psp_a", "EUR").await;

        let mut req = new_risk_rule(vec!["psp_a".to_string()]);
        req.criteria_type = Some(CustomerCriteriaType::Tag);
        req.criteria_value = Some("vip".to_string());

        let err = service.create_risk_rule(req).await.unwrap_err();
        assert_eq!(code(&err), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_risk_rule_partial_currency_support_passes() {
        let service = setup().await;
        seed_support(&service, "psp_a", "EUR").await;
        // psp_b has no EUR support; the ANY fallback accepts the pair.

        let details = service
            .create_risk_rule(new_risk_rule(vec![
                "psp_a".to_string(),
                "psp_b".to_string(),
            ]))
            .await
            .unwrap();

        assert_eq!(details.rule.version, 1);
        assert_eq!(details.psps.len(), 2);
    }

    #[tokio::test]
    async fn test_risk_rule_no_supporting_psp_rejected() {
        let service = setup().await;
        // Nothing seeded; no PSP supports EUR.

        let err = service
            .create_risk_rule(new_risk_rule(vec!["psp_a".to_string()]))
            .await
            .unwrap_err();

        assert_eq!(code(&err), ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_risk_rule_empty_psps_rejected() {
        let service = setup().await;

        let err = service.create_risk_rule(new_risk_rule(vec![])).await.unwrap_err();
        assert_eq!(code(&err), ErrorCode::ValidationError);
    }

    // Routing rules

    #[tokio::test]
    async fn test_routing_first_rule_becomes_default() {
        let service = setup().await;

        let details = service
            .create_routing_rule(new_routing_rule("first", Some(false)))
            .await
            .unwrap();

        assert!(details.rule.is_default);
    }

    #[tokio::test]
    async fn test_routing_delete_guards_map_to_codes() {
        let service = setup().await;

        let first = service
            .create_routing_rule(new_routing_rule("first", Some(true)))
            .await
            .unwrap();
        let second = service
            .create_routing_rule(new_routing_rule("second", Some(false)))
            .await
            .unwrap();

        let err = service.delete_routing_rule(&first.rule.id).await.unwrap_err();
        assert_eq!(code(&err), ErrorCode::RoutingDefaultRuleDeleteForbidden);
        assert_eq!(code(&err).code(), "2205");

        service.delete_routing_rule(&second.rule.id).await.unwrap();

        let err = service.delete_routing_rule(&first.rule.id).await.unwrap_err();
        assert_eq!(code(&err), ErrorCode::RoutingLastRuleDeleteForbidden);
        assert_eq!(code(&err).code(), "2206");
    }

    #[tokio::test]
    async fn test_routing_update_promotes_and_demotes() {
        let service = setup().await;

        let first = service
            .create_routing_rule(new_routing_rule("first", Some(true)))
            .await
            .unwrap();
        let second = service
            .create_routing_rule(new_routing_rule("second", Some(false)))
            .await
            .unwrap();

        let promoted = service
            .update_routing_rule(
                &second.rule.id,
                RoutingRuleUpdate {
                    name: "second".to_string(),
                    psp_selection_mode: None,
                    condition: None,
                    is_default: Some(true),
                    status: None,
                    updated_by: None,
                    psps: vec![RoutingPsp {
                        psp_id: "psp_a".to_string(),
                        psp_value: Some(1),
                    }],
                },
            )
            .await
            .unwrap();

        assert!(promoted.rule.is_default);
        assert_eq!(promoted.rule.version, 2);

        let demoted = service.get_routing_rule(&first.rule.id).await.unwrap();
        assert!(!demoted.rule.is_default);
    }

    // Operation currencies

    #[tokio::test]
    async fn test_operation_currencies_flow_target_missing() {
        let service = setup().await;

        let err = service
            .validate_operation_currencies(&OperationCurrencyRequest {
                flow_target_id: "ftg_missing".to_string(),
                operations: vec![],
            })
            .await
            .unwrap_err();

        assert_eq!(code(&err), ErrorCode::PspConfigurationError);
    }

    #[tokio::test]
    async fn test_operation_currencies_empty_target_rejected() {
        let service = setup().await;
        service
            .seed_flow_target(&FlowTarget {
                id: "ftg_empty".to_string(),
                name: "empty".to_string(),
                currencies: vec![],
            })
            .await
            .unwrap();

        let err = service
            .validate_operation_currencies(&OperationCurrencyRequest {
                flow_target_id: "ftg_empty".to_string(),
                operations: vec![],
            })
            .await
            .unwrap_err();

        assert_eq!(code(&err), ErrorCode::PspCurrencyNotSupported);
    }

    #[tokio::test]
    async fn test_operation_currencies_aggregates_all_violations() {
        let service = setup().await;
        service
            .seed_flow_target(&FlowTarget {
                id: "ftg_cards".to_string(),
                name: "cards".to_string(),
                currencies: vec!["EUR".to_string()],
            })
            .await
            .unwrap();

        let err = service
            .validate_operation_currencies(&OperationCurrencyRequest {
                flow_target_id: "ftg_cards".to_string(),
                operations: vec![
                    PspOperation {
                        flow_action_id: "fat_payin".to_string(),
                        currencies: vec![
                            OperationCurrency {
                                currency: "JPY".to_string(),
                                min_value: 1.0,
                                max_value: 100.0,
                            },
                            OperationCurrency {
                                currency: "EUR".to_string(),
                                min_value: 1.0,
                                max_value: 100.0,
                            },
                        ],
                    },
                    PspOperation {
                        flow_action_id: "fat_payout".to_string(),
                        currencies: vec![OperationCurrency {
                            currency: "CHF".to_string(),
                            min_value: 1.0,
                            max_value: 100.0,
                        }],
                    },
                ],
            })
            .await
            .unwrap_err();

        assert_eq!(code(&err), ErrorCode::PspCurrencyNotSupported);
        let message = err.to_string();
        assert!(message.contains("JPY"));
        assert!(message.contains("CHF"));
        assert!(!message.contains("EUR is not supported"));
    }

    #[tokio::test]
    async fn test_operation_currencies_all_supported_passes() {
        let service = setup().await;
        service
            .seed_flow_target(&FlowTarget {
                id: "ftg_cards".to_string(),
                name: "cards".to_string(),
                currencies: vec!["EUR".to_string(), "USD".to_string()],
            })
            .await
            .unwrap();

        service
            .validate_operation_currencies(&OperationCurrencyRequest {
                flow_target_id: "ftg_cards".to_string(),
                operations: vec![PspOperation {
                    flow_action_id: "fat_payin".to_string(),
                    currencies: vec![OperationCurrency {
                        currency: "USD".to_string(),
                        min_value: 1.0,
                        max_value: 500.0,
                    }],
                }],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_operation_currencies_ignores_value_bounds() {
        let service = setup().await;
        service
            .seed_flow_target(&FlowTarget {
                id: "ftg_cards".to_string(),
                name: "cards".to_string(),
                currencies: vec!["EUR".to_string()],
            })
            .await
            .unwrap();

        // Only membership in the target's currency list is validated;
        // inverted bounds pass through untouched.
        service
            .validate_operation_currencies(&OperationCurrencyRequest {
                flow_target_id: "ftg_cards".to_string(),
                operations: vec![PspOperation {
                    flow_action_id: "fat_payin".to_string(),
                    currencies: vec![OperationCurrency {
                        currency: "EUR".to_string(),
                        min_value: 500.0,
                        max_value: 1.0,
                    }],
                }],
            })
            .await
            .unwrap();
    }
}
