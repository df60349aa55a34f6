use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

use fuelrs::config::AppConfig;
use fuelrs::logging::{init_logging, LogConfig};
use fuelrs::models::{
    AthleteProfile, Intensity, PlanResult, Product, ProductType, RaceProfile, Sport,
    TemperatureBand,
};
use fuelrs::{catalog, compute_targets, generate_plan};

/// FuelRS - Race-Day Nutrition Planning CLI
///
/// A Rust-based tool for building time-ordered race nutrition plans from an
/// athlete profile, a race profile and a product catalog.
#[derive(Parser)]
#[command(name = "fuelrs")]
#[command(author = "FuelRS Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Race-Day Nutrition Planning CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level override (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format (table, json)
    #[arg(long, global = true, value_name = "FORMAT")]
    format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a race-day nutrition plan
    Plan {
        /// Athlete weight in kilograms
        #[arg(short, long)]
        weight: Decimal,

        /// Sport (run, bike, triathlon)
        #[arg(short, long)]
        sport: String,

        /// Race duration in hours
        #[arg(short, long)]
        duration: Decimal,

        /// Temperature band (cold, moderate, hot)
        #[arg(short, long, default_value = "moderate")]
        temperature: String,

        /// Numeric temperature in °C, mapped onto a band (overrides --temperature)
        #[arg(long)]
        celsius: Option<Decimal>,

        /// Intensity (easy, moderate, hard)
        #[arg(short, long, default_value = "moderate")]
        intensity: String,

        /// Enable caffeine planning
        #[arg(long)]
        caffeine: bool,

        /// Catalog JSON file (defaults to the built-in catalog)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Product types to exclude, comma separated (gel, drink, bar, chew, recovery)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
    },

    /// Show nutrition targets without building a plan
    Targets {
        /// Athlete weight in kilograms
        #[arg(short, long)]
        weight: Decimal,

        /// Sport (run, bike, triathlon)
        #[arg(short, long)]
        sport: String,

        /// Race duration in hours
        #[arg(short, long)]
        duration: Decimal,

        /// Temperature band (cold, moderate, hot)
        #[arg(short, long, default_value = "moderate")]
        temperature: String,

        /// Numeric temperature in °C, mapped onto a band (overrides --temperature)
        #[arg(long)]
        celsius: Option<Decimal>,

        /// Intensity (easy, moderate, hard)
        #[arg(short, long, default_value = "moderate")]
        intensity: String,

        /// Enable caffeine planning
        #[arg(long)]
        caffeine: bool,
    },

    /// List the products the planner would use
    Catalog {
        /// Catalog JSON file (defaults to the built-in catalog)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,
    },
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Product")]
    product: String,
    #[tabled(rename = "Carbs so far")]
    carbs: String,
    #[tabled(rename = "Caffeine so far")]
    caffeine: String,
}

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Product")]
    name: String,
    #[tabled(rename = "Type")]
    product_type: String,
    #[tabled(rename = "Carbs")]
    carbs: String,
    #[tabled(rename = "Sodium")]
    sodium: String,
    #[tabled(rename = "Volume")]
    volume: String,
    #[tabled(rename = "Caffeine")]
    caffeine: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppConfig::default_path);
    let app_config = AppConfig::load(&config_path)?;

    let mut log_config: LogConfig = app_config.logging.clone();
    if let Some(level) = &cli.log_level {
        log_config.level = level
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))?;
    }
    init_logging(&log_config)?;

    let format = cli
        .format
        .clone()
        .unwrap_or_else(|| app_config.settings.output_format.clone());

    match cli.command {
        Commands::Plan {
            weight,
            sport,
            duration,
            temperature,
            celsius,
            intensity,
            caffeine,
            catalog: catalog_path,
            exclude,
        } => {
            let race = build_race(&sport, duration, &temperature, celsius, &intensity)?;
            let athlete = AthleteProfile::new(weight);
            let caffeine_enabled = caffeine || app_config.settings.caffeine_enabled;

            let mut products = load_products(
                catalog_path.as_deref(),
                app_config.settings.catalog_path.as_deref(),
            )?;
            if !exclude.is_empty() {
                let excluded = exclude
                    .iter()
                    .map(|s| ProductType::from_str(s))
                    .collect::<Result<Vec<_>>>()?;
                products = catalog::exclude_types(&products, &excluded);
            }

            let plan = generate_plan(&race, &athlete, &products, caffeine_enabled)
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;
            tracing::info!(
                events = plan.events.len(),
                warnings = plan.warnings.len(),
                errors = plan.errors.len(),
                "plan generated"
            );

            print_plan(&plan, &format)?;
        }

        Commands::Targets {
            weight,
            sport,
            duration,
            temperature,
            celsius,
            intensity,
            caffeine,
        } => {
            let race = build_race(&sport, duration, &temperature, celsius, &intensity)?;
            let athlete = AthleteProfile::new(weight);
            let caffeine_enabled = caffeine || app_config.settings.caffeine_enabled;

            let targets = compute_targets(&race, &athlete, caffeine_enabled)
                .map_err(|e| anyhow::anyhow!(e.user_message()))?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&targets)?);
            } else {
                println!("{}", "Race nutrition targets".bold());
                println!(
                    "  Carbohydrates: {} g ({} g/h)",
                    targets.carbs_g.normalize(),
                    targets.carbs_g_per_hour.normalize()
                );
                println!(
                    "  Fluid:         {} ml ({} ml/h)",
                    targets.fluid_ml.normalize(),
                    targets.fluid_ml_per_hour.normalize()
                );
                println!(
                    "  Sodium:        {} mg ({} mg/h)",
                    targets.sodium_mg.normalize(),
                    targets.sodium_mg_per_hour.normalize()
                );
                if targets.caffeine_mg > Decimal::ZERO {
                    println!("  Caffeine:      {} mg", targets.caffeine_mg.normalize());
                }
                if let Some(phases) = &targets.phase_targets {
                    println!(
                        "  Bike leg:      {} g carbs, {} ml fluid",
                        phases.bike.carbs_g.normalize(),
                        phases.bike.fluid_ml.round_dp(0).normalize()
                    );
                    println!(
                        "  Run leg:       {} g carbs, {} ml fluid",
                        phases.run.carbs_g.normalize(),
                        phases.run.fluid_ml.round_dp(0).normalize()
                    );
                }
            }
        }

        Commands::Catalog {
            catalog: catalog_path,
        } => {
            let products = load_products(
                catalog_path.as_deref(),
                app_config.settings.catalog_path.as_deref(),
            )?;

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&products)?);
            } else {
                let rows: Vec<CatalogRow> = products.iter().map(catalog_row).collect();
                println!("{}", Table::new(rows));
            }
        }
    }

    Ok(())
}

/// Build the race profile from CLI arguments, mapping a numeric °C onto a
/// temperature band when given
fn build_race(
    sport: &str,
    duration: Decimal,
    temperature: &str,
    celsius: Option<Decimal>,
    intensity: &str,
) -> Result<RaceProfile> {
    let temperature = match celsius {
        Some(degrees) => TemperatureBand::from_celsius(degrees),
        None => TemperatureBand::from_str(temperature)?,
    };

    Ok(RaceProfile {
        sport: Sport::from_str(sport)?,
        duration_hours: duration,
        temperature,
        intensity: Intensity::from_str(intensity)?,
    })
}

fn load_products(
    cli_path: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<Vec<Product>> {
    match cli_path.or(config_path) {
        Some(path) => catalog::load_catalog(path)
            .with_context(|| format!("Failed to load catalog from {}", path.display())),
        None => Ok(catalog::builtin_catalog()),
    }
}

fn print_plan(plan: &PlanResult, format: &str) -> Result<()> {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(plan)?);
        return Ok(());
    }

    let rows: Vec<PlanRow> = plan.events.iter().map(plan_row).collect();
    println!("{}", Table::new(rows));

    if let Some(last) = plan.events.last() {
        println!(
            "\n{} {} events, {} g carbs, {} mg caffeine",
            "Plan:".bold(),
            plan.events.len(),
            last.total_carbs_so_far.normalize(),
            last.total_caffeine_so_far.normalize()
        );
    }

    for warning in &plan.warnings {
        println!("{} {}", "warning:".yellow().bold(), warning);
    }
    for error in &plan.errors {
        println!("{} {}", "error:".red().bold(), error);
    }

    Ok(())
}

fn plan_row(event: &fuelrs::models::NutritionEvent) -> PlanRow {
    PlanRow {
        time: format_time(event.time_min),
        phase: event.phase_description.clone(),
        action: event.action.clone(),
        product: event.product_name.clone(),
        carbs: format!("{} g", event.total_carbs_so_far.normalize()),
        caffeine: format!("{} mg", event.total_caffeine_so_far.normalize()),
    }
}

fn catalog_row(product: &Product) -> CatalogRow {
    CatalogRow {
        name: product.name.clone(),
        product_type: format!("{:?}", product.product_type).to_lowercase(),
        carbs: format!("{} g", product.carbs_g.normalize()),
        sodium: format!("{} mg", product.sodium_mg.normalize()),
        volume: format!("{} ml", product.volume_ml.normalize()),
        caffeine: if product.has_caffeine {
            format!("{} mg", product.caffeine_mg.normalize())
        } else {
            "-".to_string()
        },
    }
}

/// Format minutes as h:mm, keeping pre-race times explicit
fn format_time(time_min: i32) -> String {
    if time_min < 0 {
        format!("{} min", time_min)
    } else {
        format!("{}:{:02}", time_min / 60, time_min % 60)
    }
}
