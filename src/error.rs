//! Unified error hierarchy for FuelRS
//!
//! Input validation failures are typed and surfaced before planning
//! starts; everything the planner can recover from travels as warnings
//! and errors inside the plan result instead.

use rust_decimal::Decimal;
use thiserror::Error;

/// Top-level error type for all FuelRS operations
#[derive(Debug, Error)]
pub enum FuelRsError {
    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Catalog loading or parsing errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Broken internal invariant, a programmer error rather than bad input
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Typed input validation failures checked before planning starts
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Athlete weight outside (0, 250] kg
    #[error("Athlete weight {weight_kg} kg is out of range (0, 250]")]
    WeightOutOfRange { weight_kg: Decimal },

    /// Race duration outside (0, 24] hours
    #[error("Race duration {hours} h is out of range (0, 24]")]
    DurationOutOfRange { hours: Decimal },

    /// Product list is empty
    #[error("Product catalog is empty")]
    EmptyCatalog,

    /// Catalog has no gel to fall back on
    #[error("Product catalog contains no gel")]
    MissingGel,

    /// A product carries a negative nutrient value
    #[error("Product '{product}' has a negative {field} value")]
    NegativeNutrient { product: String, field: String },

    /// A drink product with no volume cannot be scheduled
    #[error("Drink '{product}' has zero volume")]
    ZeroVolumeDrink { product: String },

    /// caffeine_mg must be zero exactly when has_caffeine is false
    #[error("Product '{product}' has inconsistent caffeine fields")]
    CaffeineFlagMismatch { product: String },
}

/// Result type alias for FuelRS operations
pub type Result<T> = std::result::Result<T, FuelRsError>;

impl FuelRsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FuelRsError::Validation(_) => ErrorSeverity::Warning,
            FuelRsError::Catalog(_) => ErrorSeverity::Error,
            FuelRsError::Configuration(_) => ErrorSeverity::Error,
            FuelRsError::Io(_) => ErrorSeverity::Error,
            FuelRsError::Internal(_) => ErrorSeverity::Critical,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            FuelRsError::Validation(ValidationError::EmptyCatalog) => {
                "No products to plan with. Load a catalog or use the built-in one.".to_string()
            }
            FuelRsError::Validation(ValidationError::MissingGel) => {
                "The catalog needs at least one gel for the planner to fall back on.".to_string()
            }
            FuelRsError::Catalog(reason) => {
                format!("Could not load the product catalog: {}", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
