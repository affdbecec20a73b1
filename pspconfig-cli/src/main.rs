//! PSP configuration CLI
//!
//! Command-line interface over the configuration service. Create and
//! update payloads are passed as JSON, matching the service request
//! shapes; read commands take ids and scope flags.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde::de::DeserializeOwned;

use pspconfig_core::ConfigService;
use pspconfig_repo::{SqliteRepo, build_repo};
use pspconfig_types::{
    ConversionRateUpdate, CurrencyLimit, FeeUpdate, FlowTarget, NewConversionRate, NewFee,
    NewRiskRule, NewRoutingRule, OperationCurrencyRequest, RiskRuleUpdate, RoutingRuleUpdate,
    Scope,
};

#[derive(Parser)]
#[command(name = "pspconfig")]
#[command(author, version, about = "PSP configuration management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fee configuration operations
    Fee {
        #[command(subcommand)]
        action: FeeCommands,
    },
    /// Conversion-rate configuration operations
    Rate {
        #[command(subcommand)]
        action: RateCommands,
    },
    /// Risk rule operations
    Risk {
        #[command(subcommand)]
        action: RiskCommands,
    },
    /// Routing rule operations
    Routing {
        #[command(subcommand)]
        action: RoutingCommands,
    },
    /// Seed lookup data used by the currency validators
    Seed {
        #[command(subcommand)]
        action: SeedCommands,
    },
    /// Validate operation currencies against a flow target
    ValidateOperations {
        /// Request payload as JSON
        #[arg(long)]
        json: String,
    },
}

#[derive(Subcommand)]
enum FeeCommands {
    /// Create a fee (payload as JSON)
    Create {
        #[arg(long)]
        json: String,
    },
    /// Publish a new version of an existing fee
    Update {
        /// Fee ID
        id: String,
        #[arg(long)]
        json: String,
    },
    /// Get the latest version of a fee with its child rows
    Get {
        /// Fee ID
        id: String,
    },
    /// List all versions of a fee
    Versions {
        /// Fee ID
        id: String,
    },
    /// List the latest fee versions in a scope
    List {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        environment: String,
        /// Only fees linked to this PSP
        #[arg(long)]
        psp: Option<String>,
    },
    /// Delete a fee and all its versions
    Delete {
        /// Fee ID
        id: String,
    },
}

#[derive(Subcommand)]
enum RateCommands {
    /// Create a conversion-rate configuration (payload as JSON)
    Create {
        #[arg(long)]
        json: String,
    },
    /// Publish a new version of a conversion-rate configuration
    Update {
        /// Configuration ID
        id: String,
        #[arg(long)]
        json: String,
    },
    /// Get the latest version with its markup
    Get {
        /// Configuration ID
        id: String,
    },
    /// List all versions of a configuration
    Versions {
        /// Configuration ID
        id: String,
    },
    /// List the latest configurations in a scope
    List {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        environment: String,
    },
    /// Delete a configuration and all its versions
    Delete {
        /// Configuration ID
        id: String,
    },
}

#[derive(Subcommand)]
enum RiskCommands {
    /// Create a risk rule (payload as JSON)
    Create {
        #[arg(long)]
        json: String,
    },
    /// Publish a new version of an existing risk rule
    Update {
        /// Rule ID
        id: String,
        #[arg(long)]
        json: String,
    },
    /// Get the latest version of a risk rule with its PSPs
    Get {
        /// Rule ID
        id: String,
    },
    /// List all versions of a risk rule
    Versions {
        /// Rule ID
        id: String,
    },
    /// List the latest risk rules in a scope
    List {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        environment: String,
    },
    /// Delete a risk rule and all its versions
    Delete {
        /// Rule ID
        id: String,
    },
}

#[derive(Subcommand)]
enum RoutingCommands {
    /// Create a routing rule (payload as JSON)
    Create {
        #[arg(long)]
        json: String,
    },
    /// Publish a new version of an existing routing rule
    Update {
        /// Rule ID
        id: String,
        #[arg(long)]
        json: String,
    },
    /// Get the latest version of a routing rule with its PSPs
    Get {
        /// Rule ID
        id: String,
    },
    /// List all versions of a routing rule
    Versions {
        /// Rule ID
        id: String,
    },
    /// List the latest routing rules in a scope
    List {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        environment: String,
    },
    /// Delete a routing rule, subject to the default and last-rule guards
    Delete {
        /// Rule ID
        id: String,
    },
}

#[derive(Subcommand)]
enum SeedCommands {
    /// Upsert a PSP currency limit
    Limit {
        #[arg(long)]
        brand: String,
        #[arg(long)]
        environment: String,
        #[arg(long)]
        flow_action: String,
        #[arg(long)]
        psp: String,
        #[arg(long)]
        currency: String,
        #[arg(long)]
        min: f64,
        #[arg(long)]
        max: f64,
    },
    /// Upsert a flow target with its supported currencies
    Target {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// Supported currencies (comma-separated)
        #[arg(long, value_delimiter = ',')]
        currencies: Vec<String>,
    },
}

fn parse_payload<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).context("invalid JSON payload")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,pspconfig_cli=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::from_env()?;
    let repo = build_repo(&config.database_url).await?;
    let service = ConfigService::new(repo);

    run(&service, Cli::parse().command).await
}

async fn run(service: &ConfigService<SqliteRepo>, command: Commands) -> Result<()> {
    match command {
        Commands::Fee { action } => match action {
            FeeCommands::Create { json } => {
                let req: NewFee = parse_payload(&json)?;
                print_json(&service.create_fee(req).await?)?;
            }
            FeeCommands::Update { id, json } => {
                let update: FeeUpdate = parse_payload(&json)?;
                print_json(&service.update_fee(&id, update).await?)?;
            }
            FeeCommands::Get { id } => {
                print_json(&service.get_fee(&id).await?)?;
            }
            FeeCommands::Versions { id } => {
                print_json(&service.list_fee_versions(&id).await?)?;
            }
            FeeCommands::List {
                brand,
                environment,
                psp,
            } => {
                let scope = Scope::new(brand, environment);
                match psp {
                    Some(psp_id) => {
                        print_json(&service.list_fees_by_psp(&scope, &psp_id).await?)?;
                    }
                    None => {
                        print_json(&service.list_fees(&scope).await?)?;
                    }
                }
            }
            FeeCommands::Delete { id } => {
                let removed = service.delete_fee(&id).await?;
                println!("✓ fee deleted ({removed} versions)");
            }
        },

        Commands::Rate { action } => match action {
            RateCommands::Create { json } => {
                let req: NewConversionRate = parse_payload(&json)?;
                print_json(&service.create_conversion_rate(req).await?)?;
            }
            RateCommands::Update { id, json } => {
                let update: ConversionRateUpdate = parse_payload(&json)?;
                print_json(&service.update_conversion_rate(&id, update).await?)?;
            }
            RateCommands::Get { id } => {
                print_json(&service.get_conversion_rate(&id).await?)?;
            }
            RateCommands::Versions { id } => {
                print_json(&service.list_conversion_rate_versions(&id).await?)?;
            }
            RateCommands::List { brand, environment } => {
                let scope = Scope::new(brand, environment);
                print_json(&service.list_conversion_rates(&scope).await?)?;
            }
            RateCommands::Delete { id } => {
                let removed = service.delete_conversion_rate(&id).await?;
                println!("✓ conversion rate deleted ({removed} versions)");
            }
        },

        Commands::Risk { action } => match action {
            RiskCommands::Create { json } => {
                let req: NewRiskRule = parse_payload(&json)?;
                print_json(&service.create_risk_rule(req).await?)?;
            }
            RiskCommands::Update { id, json } => {
                let update: RiskRuleUpdate = parse_payload(&json)?;
                print_json(&service.update_risk_rule(&id, update).await?)?;
            }
            RiskCommands::Get { id } => {
                print_json(&service.get_risk_rule(&id).await?)?;
            }
            RiskCommands::Versions { id } => {
                print_json(&service.list_risk_rule_versions(&id).await?)?;
            }
            RiskCommands::List { brand, environment } => {
                let scope = Scope::new(brand, environment);
                print_json(&service.list_risk_rules(&scope).await?)?;
            }
            RiskCommands::Delete { id } => {
                let removed = service.delete_risk_rule(&id).await?;
                println!("✓ risk rule deleted ({removed} versions)");
            }
        },

        Commands::Routing { action } => match action {
            RoutingCommands::Create { json } => {
                let req: NewRoutingRule = parse_payload(&json)?;
                print_json(&service.create_routing_rule(req).await?)?;
            }
            RoutingCommands::Update { id, json } => {
                let update: RoutingRuleUpdate = parse_payload(&json)?;
                print_json(&service.update_routing_rule(&id, update).await?)?;
            }
            RoutingCommands::Get { id } => {
                print_json(&service.get_routing_rule(&id).await?)?;
            }
            RoutingCommands::Versions { id } => {
                print_json(&service.list_routing_rule_versions(&id).await?)?;
            }
            RoutingCommands::List { brand, environment } => {
                let scope = Scope::new(brand, environment);
                print_json(&service.list_routing_rules(&scope).await?)?;
            }
            RoutingCommands::Delete { id } => {
                let removed = service.delete_routing_rule(&id).await?;
                println!("✓ routing rule deleted ({removed} versions)");
            }
        },

        Commands::Seed { action } => match action {
            SeedCommands::Limit {
                brand,
                environment,
                flow_action,
                psp,
                currency,
                min,
                max,
            } => {
                let limit = CurrencyLimit {
                    scope: Scope::new(brand, environment),
                    flow_action_id: flow_action,
                    psp_id: psp,
                    currency,
                    min_value: min,
                    max_value: max,
                };
                service.seed_currency_limit(&limit).await?;
                println!("✓ currency limit saved");
            }
            SeedCommands::Target {
                id,
                name,
                currencies,
            } => {
                let currencies: Vec<String> =
                    currencies.into_iter().filter(|c| !c.is_empty()).collect();
                let target = FlowTarget {
                    id,
                    name,
                    currencies,
                };
                service.seed_flow_target(&target).await?;
                println!("✓ flow target saved");
            }
        },

        Commands::ValidateOperations { json } => {
            let request: OperationCurrencyRequest = parse_payload(&json)?;
            service.validate_operation_currencies(&request).await?;
            println!("✓ all operation currencies supported");
        }
    }

    Ok(())
}
