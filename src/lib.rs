// Library interface for FuelRS modules
// This allows integration tests to access the core functionality

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod planner;
pub mod scoring;
pub mod targets;
pub mod timeline;
pub mod validation;

// Re-export commonly used types for convenience
pub use error::{FuelRsError, Result, ValidationError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::*;
pub use planner::NutritionPlanner;
pub use scoring::ProductScorer;
pub use targets::TargetCalculator;
pub use timeline::{PhaseTimeline, SlotEnumerator};
pub use validation::PlanValidator;

/// Compute the multi-nutrient targets for a race
///
/// Pure function of its inputs; validates the athlete and race profiles
/// before computing anything.
pub fn compute_targets(
    race: &RaceProfile,
    athlete: &AthleteProfile,
    caffeine_enabled: bool,
) -> Result<MultiNutrientTargets> {
    TargetCalculator::compute(race, athlete, caffeine_enabled)
}

/// Generate a race-day nutrition plan
///
/// Pure function of its inputs: identical calls yield identical plans and
/// diagnostics. The product list is treated as immutable and may be shared
/// across concurrent callers.
pub fn generate_plan(
    race: &RaceProfile,
    athlete: &AthleteProfile,
    products: &[Product],
    caffeine_enabled: bool,
) -> Result<PlanResult> {
    NutritionPlanner::generate(race, athlete, products, caffeine_enabled)
}
