use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use crate::models::{
    MultiNutrientTargets, NutritionEvent, Phase, Product, CLUSTER_WINDOW_MIN, OVERSHOOT_FACTOR,
};
use crate::scoring::ProductScorer;

/// Minimum spacing in minutes when either event of a pair is caffeinated
const CAFFEINE_PAIR_SPACING_MIN: i32 = 45;

/// Minimum spacing for pairs involving a solid product, bike and run
const SOLID_SPACING_BIKE_MIN: i32 = 25;
const SOLID_SPACING_RUN_MIN: i32 = 30;

/// Minimum spacing for pairs involving a gel, bike and run
const GEL_SPACING_BIKE_MIN: i32 = 15;
const GEL_SPACING_RUN_MIN: i32 = 20;

/// Minimum spacing for any other pair
const DEFAULT_SPACING_MIN: i32 = 12;

/// Carb delivery tolerance around the target before a warning fires
const CARB_TOLERANCE: Decimal = dec!(0.10);

/// Share of events one product may cover before the diversity warning
const DIVERSITY_SHARE: Decimal = dec!(0.60);

/// Carb total above which unused high-carb drinks are flagged
const DRINK_USE_CARB_FLOOR_G: Decimal = dec!(200);

/// Hydration coupling window around a gel, and the minimum drink size
const HYDRATION_WINDOW_MIN: i32 = 10;
const HYDRATION_MIN_VOLUME_ML: Decimal = dec!(100);

/// Post-placement plan validation
///
/// Produces warnings and errors in fixed check order: targets, spacing,
/// clustering, caffeine, diversity, drink use, hydration coupling. The
/// validator never removes events; violations stay visible in the output.
pub struct PlanValidator;

impl PlanValidator {
    /// Run all checks against a finished plan
    pub fn validate(
        events: &[NutritionEvent],
        targets: &MultiNutrientTargets,
        products: &[Product],
        caffeine_enabled: bool,
    ) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let by_name: HashMap<&str, &Product> =
            products.iter().map(|p| (p.name.as_str(), p)).collect();

        Self::check_carb_target(events, targets, &mut warnings);
        Self::check_spacing(events, &by_name, &mut errors);
        Self::check_clustering(events, &mut errors);
        Self::check_caffeine(events, targets, caffeine_enabled, &mut warnings, &mut errors);
        Self::check_diversity(events, &mut warnings);
        Self::check_drink_use(events, products, &by_name, &mut warnings);
        Self::check_hydration_coupling(events, &by_name, &mut warnings);

        (warnings, errors)
    }

    /// Total carbs within 10% of the target, warning either side
    fn check_carb_target(
        events: &[NutritionEvent],
        targets: &MultiNutrientTargets,
        warnings: &mut Vec<String>,
    ) {
        let total = events
            .last()
            .map(|e| e.total_carbs_so_far)
            .unwrap_or(Decimal::ZERO);

        let lower = targets.carbs_g * (Decimal::ONE - CARB_TOLERANCE);
        let upper = targets.carbs_g * (Decimal::ONE + CARB_TOLERANCE);

        if total < lower {
            warnings.push(format!(
                "Planned carbohydrate intake {} g is below the {} g target",
                total.round_dp(1).normalize(),
                targets.carbs_g.round_dp(1).normalize()
            ));
        } else if total > upper {
            warnings.push(format!(
                "Planned carbohydrate intake {} g exceeds the {} g target",
                total.round_dp(1).normalize(),
                targets.carbs_g.round_dp(1).normalize()
            ));
        }
    }

    /// Per-pair minimum spacing by product class and phase
    fn check_spacing(
        events: &[NutritionEvent],
        by_name: &HashMap<&str, &Product>,
        errors: &mut Vec<String>,
    ) {
        for pair in events.windows(2) {
            let gap = pair[1].time_min - pair[0].time_min;
            let minimum = Self::min_spacing(&pair[0], &pair[1], by_name);
            if gap < minimum {
                errors.push(format!(
                    "Events at {} min and {} min are only {} min apart (minimum {} min)",
                    pair[0].time_min, pair[1].time_min, gap, minimum
                ));
            }
        }
    }

    fn min_spacing(
        first: &NutritionEvent,
        second: &NutritionEvent,
        by_name: &HashMap<&str, &Product>,
    ) -> i32 {
        if first.has_caffeine || second.has_caffeine {
            return CAFFEINE_PAIR_SPACING_MIN;
        }

        let on_bike = second.phase == Phase::Bike;
        let lookup = |event: &NutritionEvent| by_name.get(event.product_name.as_str()).copied();
        let first_product = lookup(first);
        let second_product = lookup(second);
        let either = |pred: fn(&Product) -> bool| {
            first_product.map(pred).unwrap_or(false) || second_product.map(pred).unwrap_or(false)
        };

        if either(Product::is_solid) {
            if on_bike {
                SOLID_SPACING_BIKE_MIN
            } else {
                SOLID_SPACING_RUN_MIN
            }
        } else if either(Product::is_gel) {
            if on_bike {
                GEL_SPACING_BIKE_MIN
            } else {
                GEL_SPACING_RUN_MIN
            }
        } else {
            DEFAULT_SPACING_MIN
        }
    }

    /// Defense-in-depth: the cluster window should hold by construction
    fn check_clustering(events: &[NutritionEvent], errors: &mut Vec<String>) {
        for pair in events.windows(2) {
            let gap = (pair[1].time_min - pair[0].time_min).abs();
            if gap < CLUSTER_WINDOW_MIN {
                errors.push(format!(
                    "Events at {} min and {} min are within the {} min cluster window",
                    pair[0].time_min, pair[1].time_min, CLUSTER_WINDOW_MIN
                ));
            }
        }
    }

    /// Caffeine present when disabled is an error; exceeding 120% of the
    /// budget is a warning
    fn check_caffeine(
        events: &[NutritionEvent],
        targets: &MultiNutrientTargets,
        caffeine_enabled: bool,
        warnings: &mut Vec<String>,
        errors: &mut Vec<String>,
    ) {
        let total = events
            .last()
            .map(|e| e.total_caffeine_so_far)
            .unwrap_or(Decimal::ZERO);

        if !caffeine_enabled {
            if events.iter().any(|e| e.has_caffeine) {
                errors.push(
                    "Caffeinated product scheduled although caffeine support is disabled"
                        .to_string(),
                );
            }
            return;
        }

        if targets.caffeine_mg > Decimal::ZERO && total > targets.caffeine_mg * OVERSHOOT_FACTOR {
            warnings.push(format!(
                "Total caffeine {} mg exceeds 120% of the {} mg budget",
                total.round_dp(1).normalize(),
                targets.caffeine_mg.round_dp(1).normalize()
            ));
        }
    }

    /// One product covering more than 60% of the plan gets flagged
    fn check_diversity(events: &[NutritionEvent], warnings: &mut Vec<String>) {
        if events.is_empty() {
            return;
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for event in events {
            *counts.entry(event.product_name.as_str()).or_insert(0) += 1;
        }

        let total = Decimal::from(events.len() as u64);
        let mut flagged: Vec<(&str, usize)> = counts
            .into_iter()
            .filter(|(_, count)| Decimal::from(*count as u64) / total > DIVERSITY_SHARE)
            .collect();
        flagged.sort();

        for (name, count) in flagged {
            warnings.push(format!(
                "Product '{}' covers {} of {} events; consider more variety",
                name,
                count,
                events.len()
            ));
        }
    }

    /// High-carb drinks available but unused on a carb-heavy plan
    fn check_drink_use(
        events: &[NutritionEvent],
        products: &[Product],
        by_name: &HashMap<&str, &Product>,
        warnings: &mut Vec<String>,
    ) {
        let catalog_has_drink = products.iter().any(|p| p.is_high_carb_drink());
        if !catalog_has_drink {
            return;
        }

        let used_drink = events.iter().any(|e| {
            by_name
                .get(e.product_name.as_str())
                .map(|p| p.is_high_carb_drink())
                .unwrap_or(false)
        });

        let total = events
            .last()
            .map(|e| e.total_carbs_so_far)
            .unwrap_or(Decimal::ZERO);

        if !used_drink && total > DRINK_USE_CARB_FLOOR_G {
            warnings.push(format!(
                "High-carb drinks are available but none is scheduled despite {} g of planned carbohydrates",
                total.round_dp(1).normalize()
            ));
        }
    }

    /// Every non-isotonic gel wants a real drink within ten minutes
    fn check_hydration_coupling(
        events: &[NutritionEvent],
        by_name: &HashMap<&str, &Product>,
        warnings: &mut Vec<String>,
    ) {
        let drink_times: Vec<i32> = events
            .iter()
            .filter(|e| {
                by_name
                    .get(e.product_name.as_str())
                    .map(|p| {
                        p.texture == crate::models::Texture::Drink
                            && p.volume_ml >= HYDRATION_MIN_VOLUME_ML
                    })
                    .unwrap_or(false)
            })
            .map(|e| e.time_min)
            .collect();

        for event in events {
            let Some(product) = by_name.get(event.product_name.as_str()) else {
                continue;
            };
            if !product.is_gel() || ProductScorer::is_isotonic(product) {
                continue;
            }

            let coupled = drink_times
                .iter()
                .any(|t| (t - event.time_min).abs() <= HYDRATION_WINDOW_MIN);
            if !coupled {
                warnings.push(format!(
                    "Gel at {} min has no drink of at least {} ml within {} min",
                    event.time_min, HYDRATION_MIN_VOLUME_ML, HYDRATION_WINDOW_MIN
                ));
            }
        }
    }
}
