use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Sport types supported by the nutrition planner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sport {
    Run,
    Bike,
    Triathlon,
}

impl Sport {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "run" | "running" => Ok(Self::Run),
            "bike" | "cycling" => Ok(Self::Bike),
            "triathlon" | "tri" => Ok(Self::Triathlon),
            _ => anyhow::bail!("Unknown sport type: {}", s),
        }
    }
}

/// Temperature bands used by the target computer
///
/// Cold is 5 °C or below, Hot is 25 °C or above, everything in between
/// is Moderate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemperatureBand {
    Cold,
    Moderate,
    Hot,
}

impl TemperatureBand {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cold" => Ok(Self::Cold),
            "moderate" | "mild" => Ok(Self::Moderate),
            "hot" => Ok(Self::Hot),
            _ => anyhow::bail!("Unknown temperature band: {}", s),
        }
    }

    /// Map a numeric temperature in °C onto a band
    pub fn from_celsius(degrees: Decimal) -> Self {
        if degrees <= dec!(5) {
            Self::Cold
        } else if degrees >= dec!(25) {
            Self::Hot
        } else {
            Self::Moderate
        }
    }
}

/// Race effort level driving the per-hour carbohydrate target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intensity {
    Easy,
    Moderate,
    Hard,
}

impl Intensity {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "moderate" => Ok(Self::Moderate),
            "hard" => Ok(Self::Hard),
            _ => anyhow::bail!("Unknown intensity: {}", s),
        }
    }
}

/// Product categories as carried by the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Gel,
    Drink,
    Bar,
    Chew,
    Recovery,
}

impl ProductType {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gel" => Ok(Self::Gel),
            "drink" => Ok(Self::Drink),
            "bar" => Ok(Self::Bar),
            "chew" => Ok(Self::Chew),
            "recovery" => Ok(Self::Recovery),
            _ => anyhow::bail!("Unknown product type: {}", s),
        }
    }
}

/// Physical texture of a product, used for segment suitability and the
/// action label on plan events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Texture {
    Gel,
    LightGel,
    Drink,
    Chew,
    Bake,
}

impl Texture {
    /// Action label shown on a plan event
    pub fn action_label(&self) -> &'static str {
        match self {
            Texture::Gel => "Take gel",
            Texture::LightGel => "Take light gel",
            Texture::Drink => "Drink",
            Texture::Chew => "Chew",
            Texture::Bake => "Eat",
        }
    }
}

/// Race phase an event belongs to
///
/// Pre-race events carry the phase of the opening segment; their
/// description marks them as pre-race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Swim,
    Bike,
    Run,
}

/// Athlete profile used for weight-dependent targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    /// Body weight in kilograms
    pub weight_kg: Decimal,
}

impl AthleteProfile {
    pub fn new(weight_kg: Decimal) -> Self {
        Self { weight_kg }
    }
}

/// Race profile describing the event being planned for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceProfile {
    /// Sport or multisport discipline
    pub sport: Sport,

    /// Expected race duration in hours
    pub duration_hours: Decimal,

    /// Temperature band on race day
    pub temperature: TemperatureBand,

    /// Planned effort level
    pub intensity: Intensity,
}

impl RaceProfile {
    /// Race duration in whole minutes
    pub fn duration_min(&self) -> i32 {
        use rust_decimal::prelude::ToPrimitive;
        (self.duration_hours * dec!(60)).round().to_i32().unwrap_or(0)
    }
}

/// A nutrition product from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Display name, unique within a catalog
    pub name: String,

    /// Product category tag
    pub product_type: ProductType,

    /// Carbohydrates per portion in grams
    pub carbs_g: Decimal,

    /// Sodium per portion in milligrams
    pub sodium_mg: Decimal,

    /// Fluid volume per portion in millilitres
    pub volume_ml: Decimal,

    /// Whether the product contains caffeine
    pub has_caffeine: bool,

    /// Caffeine per portion in milligrams, zero iff `has_caffeine` is false
    pub caffeine_mg: Decimal,

    /// Physical texture
    pub texture: Texture,

    /// Optional descriptive category, e.g. "Energy" or "Isotonic"
    pub category: Option<String>,
}

impl Product {
    /// Drinks above the high-carb threshold anchor the backbone
    pub fn is_high_carb_drink(&self) -> bool {
        self.texture == Texture::Drink && self.carbs_g > HIGH_CARB_DRINK_MIN_G
    }

    /// Solid products need wider spacing than gels and drinks
    pub fn is_solid(&self) -> bool {
        matches!(self.texture, Texture::Bake | Texture::Chew)
    }

    /// Gel-type textures, light or regular
    pub fn is_gel(&self) -> bool {
        matches!(self.texture, Texture::Gel | Texture::LightGel)
    }

    /// Caffeine dose, zero for caffeine-free products
    pub fn caffeine_dose_mg(&self) -> Decimal {
        if self.has_caffeine {
            self.caffeine_mg
        } else {
            Decimal::ZERO
        }
    }
}

/// Per-phase nutrition sub-targets for triathlon races
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseTargets {
    pub carbs_g: Decimal,
    pub fluid_ml: Decimal,
    pub sodium_mg: Decimal,
}

/// Triathlon split of the race totals across the bike and run legs
///
/// The swim leg carries no nutrition and has no entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriathlonTargets {
    pub bike: PhaseTargets,
    pub run: PhaseTargets,
}

/// Multi-nutrient targets for a race, totals plus per-hour values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiNutrientTargets {
    /// Total carbohydrates for the race in grams
    pub carbs_g: Decimal,

    /// Total fluid for the race in millilitres
    pub fluid_ml: Decimal,

    /// Total sodium for the race in milligrams
    pub sodium_mg: Decimal,

    /// Total caffeine budget in milligrams, zero when caffeine is disabled
    pub caffeine_mg: Decimal,

    /// Carbohydrates per hour in grams
    pub carbs_g_per_hour: Decimal,

    /// Fluid per hour in millilitres
    pub fluid_ml_per_hour: Decimal,

    /// Sodium per hour in milligrams
    pub sodium_mg_per_hour: Decimal,

    /// Phase sub-targets, present for triathlon races only
    pub phase_targets: Option<TriathlonTargets>,
}

/// A single scheduled intake in the plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionEvent {
    /// Minutes from race start, negative for pre-race intakes
    pub time_min: i32,

    /// Race phase the event falls into
    pub phase: Phase,

    /// Human-readable phase label
    pub phase_description: String,

    /// Name of the scheduled product
    pub product_name: String,

    /// Number of portions, always 1 in this planner
    pub amount_portions: u32,

    /// Action label derived from the product texture
    pub action: String,

    /// Cumulative carbohydrates in grams after this event
    pub total_carbs_so_far: Decimal,

    /// Cumulative caffeine in milligrams after this event
    pub total_caffeine_so_far: Decimal,

    /// Whether the product contains caffeine
    pub has_caffeine: bool,

    /// Caffeine dose in milligrams, present for caffeinated products
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caffeine_mg: Option<Decimal>,
}

/// The planner output: ordered events plus validation diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResult {
    /// Events in non-decreasing time order
    pub events: Vec<NutritionEvent>,

    /// Non-fatal diagnostics, plan is still usable
    pub warnings: Vec<String>,

    /// Constraint violations surfaced for auditability
    pub errors: Vec<String>,
}

// --- Planner constants -----------------------------------------------------

/// Minimum separation between any two events in minutes
pub const CLUSTER_WINDOW_MIN: i32 = 5;

/// Safety margin removed from the tail of the schedulable window
pub const TAIL_MARGIN_MIN: i32 = 5;

/// Margin excluded before the end of the triathlon bike leg
pub const TRANSITION_MARGIN_MIN: i32 = 10;

/// Spacing floor between caffeinated intakes in minutes
pub const CAFFEINE_SPACING_MIN: i32 = 45;

/// Fixed time of the optional pre-race intake
pub const PRE_RACE_TIME_MIN: i32 = -15;

/// Length of the diversity FIFO of recently used product names
pub const DIVERSITY_WINDOW: usize = 5;

/// Seed of the tie-breaking pseudo-random source
pub const PLANNER_SEED: u64 = 42;

/// Intake cadence for a standalone run race
pub const RUN_CADENCE_MIN: i32 = 22;

/// Intake cadence on the bike, standalone or triathlon
pub const BIKE_CADENCE_MIN: i32 = 18;

/// Intake cadence on the triathlon run leg
pub const TRI_RUN_CADENCE_MIN: i32 = 25;

/// Earliest race progress at which caffeine may be scheduled
pub const CAFFEINE_START_PROGRESS: Decimal = dec!(0.40);

/// Ceiling factor applied to the caffeine and carbohydrate targets
pub const OVERSHOOT_FACTOR: Decimal = dec!(1.2);

/// Absolute cap on the total caffeine budget in milligrams
pub const CAFFEINE_TOTAL_CAP_MG: Decimal = dec!(300);

/// Share of the carb target covered by the drink backbone
pub const BACKBONE_CARB_SHARE: Decimal = dec!(0.45);

/// Backbone share below which a pre-race intake is inserted
pub const PRE_RACE_TRIGGER_SHARE: Decimal = dec!(0.10);

/// Carb threshold above which a drink counts as high-carb
pub const HIGH_CARB_DRINK_MIN_G: Decimal = dec!(30);

/// Acceptable shortfall when topping up towards the carb target
pub const CARB_TOPUP_BUFFER_G: Decimal = dec!(5);

/// Intake frequency above which the scorer applies its rate penalty
pub const MAX_INTAKES_PER_HOUR: Decimal = dec!(4);

/// Triathlon time shares: swim, bike, run
pub const TRI_SWIM_SHARE: Decimal = dec!(0.2);
pub const TRI_BIKE_SHARE: Decimal = dec!(0.5);
pub const TRI_RUN_SHARE: Decimal = dec!(0.3);

/// Share of triathlon carbs assigned to the bike leg
pub const TRI_BIKE_CARB_SHARE: Decimal = dec!(0.7);

/// Share of a triathlon top-up deficit placed on the bike leg
pub const TRI_BIKE_DEFICIT_SHARE: Decimal = dec!(0.7);

/// Minimum spacing for top-up placements per phase
pub const BIKE_TOPUP_SPACING_MIN: i32 = 15;
pub const RUN_TOPUP_SPACING_MIN: i32 = 20;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sport_parsing() {
        assert_eq!(Sport::from_str("run").unwrap(), Sport::Run);
        assert_eq!(Sport::from_str("Cycling").unwrap(), Sport::Bike);
        assert_eq!(Sport::from_str("tri").unwrap(), Sport::Triathlon);
        assert!(Sport::from_str("rowing").is_err());
    }

    #[test]
    fn test_temperature_band_from_celsius() {
        assert_eq!(TemperatureBand::from_celsius(dec!(-3)), TemperatureBand::Cold);
        assert_eq!(TemperatureBand::from_celsius(dec!(5)), TemperatureBand::Cold);
        assert_eq!(TemperatureBand::from_celsius(dec!(15)), TemperatureBand::Moderate);
        assert_eq!(TemperatureBand::from_celsius(dec!(25)), TemperatureBand::Hot);
        assert_eq!(TemperatureBand::from_celsius(dec!(34)), TemperatureBand::Hot);
    }

    #[test]
    fn test_intensity_parsing() {
        assert_eq!(Intensity::from_str("easy").unwrap(), Intensity::Easy);
        assert_eq!(Intensity::from_str("HARD").unwrap(), Intensity::Hard);
        assert!(Intensity::from_str("max").is_err());
    }

    #[test]
    fn test_race_duration_minutes() {
        let race = RaceProfile {
            sport: Sport::Run,
            duration_hours: dec!(2.5),
            temperature: TemperatureBand::Moderate,
            intensity: Intensity::Moderate,
        };
        assert_eq!(race.duration_min(), 150);
    }

    #[test]
    fn test_product_classification() {
        let drink = Product {
            name: "Carb Mix".to_string(),
            product_type: ProductType::Drink,
            carbs_g: dec!(45),
            sodium_mg: dec!(300),
            volume_ml: dec!(500),
            has_caffeine: false,
            caffeine_mg: Decimal::ZERO,
            texture: Texture::Drink,
            category: Some("Energy".to_string()),
        };
        assert!(drink.is_high_carb_drink());
        assert!(!drink.is_solid());
        assert!(!drink.is_gel());
        assert_eq!(drink.caffeine_dose_mg(), Decimal::ZERO);

        let bar = Product {
            name: "Oat Bar".to_string(),
            product_type: ProductType::Bar,
            carbs_g: dec!(40),
            sodium_mg: dec!(150),
            volume_ml: Decimal::ZERO,
            has_caffeine: false,
            caffeine_mg: Decimal::ZERO,
            texture: Texture::Bake,
            category: None,
        };
        assert!(bar.is_solid());
        assert!(!bar.is_high_carb_drink());
    }

    #[test]
    fn test_caffeine_dose() {
        let gel = Product {
            name: "Espresso Gel".to_string(),
            product_type: ProductType::Gel,
            carbs_g: dec!(25),
            sodium_mg: dec!(50),
            volume_ml: dec!(60),
            has_caffeine: true,
            caffeine_mg: dec!(75),
            texture: Texture::Gel,
            category: Some("Energy".to_string()),
        };
        assert_eq!(gel.caffeine_dose_mg(), dec!(75));
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(Texture::Gel.action_label(), "Take gel");
        assert_eq!(Texture::Drink.action_label(), "Drink");
        assert_eq!(Texture::Bake.action_label(), "Eat");
    }

    #[test]
    fn test_event_serialization_uses_wire_names() {
        let event = NutritionEvent {
            time_min: -15,
            phase: Phase::Run,
            phase_description: "Pre-race".to_string(),
            product_name: "Oat Bar".to_string(),
            amount_portions: 1,
            action: "Eat".to_string(),
            total_carbs_so_far: dec!(40),
            total_caffeine_so_far: Decimal::ZERO,
            has_caffeine: false,
            caffeine_mg: None,
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"timeMin\":-15"));
        assert!(json.contains("\"totalCarbsSoFar\""));
        assert!(!json.contains("caffeineMg"));

        let back: NutritionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_plan_result_serialization() {
        let result = PlanResult {
            events: Vec::new(),
            warnings: vec!["low carbs".to_string()],
            errors: Vec::new(),
        };
        let json = serde_json::to_string(&result).unwrap();
        let back: PlanResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.warnings.len(), 1);
        assert!(back.errors.is_empty());
    }
}
