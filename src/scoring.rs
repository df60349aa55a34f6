use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{
    Phase, Product, Texture, CAFFEINE_START_PROGRESS, OVERSHOOT_FACTOR,
};

/// Slot-local context the scorer ranks candidates against
#[derive(Debug, Clone)]
pub struct ScoreContext<'a> {
    /// Phase the slot falls into
    pub phase: Phase,

    /// Slot time divided by race duration, in [0, 1]
    pub race_progress: Decimal,

    /// Slot time in minutes from race start
    pub slot_time_min: i32,

    /// Whether caffeine may be scheduled at all
    pub caffeine_enabled: bool,

    /// Earliest minute the next caffeinated intake is allowed at
    pub next_caffeine_min: i32,

    /// Total carbohydrate target in grams
    pub carb_target_g: Decimal,

    /// Carbohydrates already scheduled in grams
    pub carbs_consumed_g: Decimal,

    /// Total caffeine budget in milligrams
    pub caffeine_target_mg: Decimal,

    /// Caffeine already scheduled in milligrams
    pub caffeine_consumed_mg: Decimal,

    /// Sodium still needed in milligrams, zero when the target is met
    pub remaining_sodium_mg: Decimal,

    /// Recently used product names, oldest first
    pub recent_products: &'a [String],

    /// Whether the intake frequency heuristic fired for this slot
    pub rate_exceeded: bool,
}

/// Weighted product scoring and slot eligibility
pub struct ProductScorer;

impl ProductScorer {
    /// Whether a product may be considered for a slot at all
    ///
    /// Solid baked products stay on the bike; caffeine respects the start
    /// gate, the spacing floor and the dose ceiling; and no candidate may
    /// push total carbohydrates past 120% of the target.
    pub fn is_eligible(product: &Product, ctx: &ScoreContext) -> bool {
        if product.texture == Texture::Bake && ctx.phase != Phase::Bike {
            return false;
        }

        if ctx.carbs_consumed_g + product.carbs_g > ctx.carb_target_g * OVERSHOOT_FACTOR {
            return false;
        }

        if product.has_caffeine {
            if !ctx.caffeine_enabled {
                return false;
            }
            if ctx.race_progress < CAFFEINE_START_PROGRESS {
                return false;
            }
            if ctx.slot_time_min < ctx.next_caffeine_min {
                return false;
            }
            if ctx.caffeine_consumed_mg + product.caffeine_mg
                > ctx.caffeine_target_mg * OVERSHOOT_FACTOR
            {
                return false;
            }
        }

        true
    }

    /// Score a candidate for a slot, higher is better
    pub fn score(product: &Product, ctx: &ScoreContext) -> Decimal {
        let mut score = dec!(2.0) * product.carbs_g;

        score += Self::segment_suitability(product, ctx.phase);

        if ctx.remaining_sodium_mg > Decimal::ZERO && product.sodium_mg > Decimal::ZERO {
            let fit = (product.sodium_mg / ctx.remaining_sodium_mg).min(Decimal::ONE);
            score += dec!(15) * fit;
        }

        if product.has_caffeine && ctx.race_progress >= CAFFEINE_START_PROGRESS {
            score += Self::caffeine_window_bonus(ctx.race_progress);

            if product.caffeine_mg >= dec!(50) && product.caffeine_mg <= dec!(100) {
                score += dec!(25);
            }
        }

        let consecutive = Self::consecutive_uses(&product.name, ctx.recent_products);
        if consecutive >= 2 {
            score -= dec!(15) * Decimal::from(consecutive);
        }

        if ctx.rate_exceeded {
            score -= dec!(10);
        }

        score
    }

    /// How well a product shape fits the current race segment
    fn segment_suitability(product: &Product, phase: Phase) -> Decimal {
        match phase {
            Phase::Bike => {
                if product.is_high_carb_drink() {
                    dec!(50)
                } else {
                    match product.texture {
                        Texture::Drink => dec!(30),
                        Texture::Bake => dec!(20),
                        Texture::Chew => dec!(15),
                        Texture::Gel => dec!(10),
                        Texture::LightGel => dec!(5),
                    }
                }
            }
            Phase::Run => match product.texture {
                Texture::Gel => {
                    if Self::is_isotonic(product) {
                        dec!(40)
                    } else {
                        dec!(25)
                    }
                }
                Texture::LightGel => dec!(20),
                Texture::Drink => {
                    if product.volume_ml <= dec!(200) {
                        dec!(15)
                    } else {
                        dec!(5)
                    }
                }
                Texture::Bake => dec!(-30),
                Texture::Chew => dec!(-10),
            },
            Phase::Swim => match product.texture {
                Texture::Gel => {
                    if Self::is_isotonic(product) {
                        dec!(20)
                    } else {
                        dec!(10)
                    }
                }
                Texture::LightGel => dec!(10),
                _ => dec!(-20),
            },
        }
    }

    /// Strategic caffeine bonus by race progress window
    fn caffeine_window_bonus(progress: Decimal) -> Decimal {
        if progress >= dec!(0.40) && progress <= dec!(0.55) {
            dec!(15)
        } else if progress >= dec!(0.65) && progress <= dec!(0.80) {
            dec!(20)
        } else if progress >= dec!(0.85) && progress <= dec!(0.95) {
            dec!(25)
        } else {
            dec!(5)
        }
    }

    /// Isotonic detection: category match or a 6-8% carb concentration
    pub fn is_isotonic(product: &Product) -> bool {
        if let Some(category) = &product.category {
            if category.to_lowercase().contains("isotonic") {
                return true;
            }
        }

        if product.volume_ml <= Decimal::ZERO {
            return false;
        }

        let concentration = product.carbs_g * dec!(100) / product.volume_ml;
        concentration >= dec!(6) && concentration <= dec!(8)
    }

    /// How many times a product was used consecutively, counted from the
    /// newest end of the diversity window
    fn consecutive_uses(name: &str, recent: &[String]) -> u32 {
        recent.iter().rev().take_while(|used| used.as_str() == name).count() as u32
    }
}
