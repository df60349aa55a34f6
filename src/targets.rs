use crate::error::{Result, ValidationError};
use crate::models::{
    AthleteProfile, Intensity, MultiNutrientTargets, PhaseTargets, RaceProfile, Sport,
    TemperatureBand, TriathlonTargets, CAFFEINE_TOTAL_CAP_MG, TRI_BIKE_CARB_SHARE,
    TRI_BIKE_SHARE, TRI_RUN_SHARE,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Target computation utilities
///
/// Derives per-hour and total targets for carbohydrates, fluid, sodium and
/// caffeine from the race profile and athlete weight. All values are
/// deterministic functions of the inputs.
pub struct TargetCalculator;

impl TargetCalculator {
    /// Compute the multi-nutrient targets for a race
    ///
    /// Validates the athlete and race profiles first; planning never starts
    /// on out-of-range inputs.
    pub fn compute(
        race: &RaceProfile,
        athlete: &AthleteProfile,
        caffeine_enabled: bool,
    ) -> Result<MultiNutrientTargets> {
        Self::validate_athlete(athlete)?;
        Self::validate_race(race)?;

        let carbs_g_per_hour = Self::carbs_per_hour(race);
        let fluid_ml_per_hour = Self::fluid_per_hour(race, athlete);
        let sodium_mg_per_hour = Self::sodium_per_hour(race, athlete);

        let carbs_g = carbs_g_per_hour * race.duration_hours;
        let fluid_ml = fluid_ml_per_hour * race.duration_hours;
        let sodium_mg = sodium_mg_per_hour * race.duration_hours;

        let caffeine_mg = if caffeine_enabled {
            Self::caffeine_total(athlete, race.intensity)
        } else {
            Decimal::ZERO
        };

        let phase_targets = if race.sport == Sport::Triathlon {
            Some(Self::triathlon_split(carbs_g, fluid_ml, sodium_mg))
        } else {
            None
        };

        Ok(MultiNutrientTargets {
            carbs_g,
            fluid_ml,
            sodium_mg,
            caffeine_mg,
            carbs_g_per_hour,
            fluid_ml_per_hour,
            sodium_mg_per_hour,
            phase_targets,
        })
    }

    /// Check athlete weight is in (0, 250] kg
    pub fn validate_athlete(athlete: &AthleteProfile) -> std::result::Result<(), ValidationError> {
        if athlete.weight_kg <= Decimal::ZERO || athlete.weight_kg > dec!(250) {
            return Err(ValidationError::WeightOutOfRange {
                weight_kg: athlete.weight_kg,
            });
        }
        Ok(())
    }

    /// Check race duration is in (0, 24] hours
    pub fn validate_race(race: &RaceProfile) -> std::result::Result<(), ValidationError> {
        if race.duration_hours <= Decimal::ZERO || race.duration_hours > dec!(24) {
            return Err(ValidationError::DurationOutOfRange {
                hours: race.duration_hours,
            });
        }
        Ok(())
    }

    /// Hourly carbohydrate target in grams
    ///
    /// Easy 50, Moderate 70, Hard 90, plus a long-race bonus of 10 g/h for
    /// races over five hours ridden above easy effort.
    fn carbs_per_hour(race: &RaceProfile) -> Decimal {
        let base = match race.intensity {
            Intensity::Easy => dec!(50),
            Intensity::Moderate => dec!(70),
            Intensity::Hard => dec!(90),
        };

        let long_race_bonus = if race.duration_hours > dec!(5) && race.intensity != Intensity::Easy
        {
            dec!(10)
        } else {
            Decimal::ZERO
        };

        base + long_race_bonus
    }

    /// Hourly fluid target in millilitres, clamped to [300, 900]
    fn fluid_per_hour(race: &RaceProfile, athlete: &AthleteProfile) -> Decimal {
        let mut fluid = dec!(500);

        match race.temperature {
            TemperatureBand::Hot => fluid += dec!(200),
            TemperatureBand::Cold => fluid -= dec!(100),
            TemperatureBand::Moderate => {}
        }

        if athlete.weight_kg > dec!(80) {
            fluid += dec!(50);
        } else if athlete.weight_kg < dec!(60) {
            fluid -= dec!(50);
        }

        fluid.clamp(dec!(300), dec!(900))
    }

    /// Hourly sodium target in milligrams, clamped to [300, 1000]
    fn sodium_per_hour(race: &RaceProfile, athlete: &AthleteProfile) -> Decimal {
        let mut sodium = dec!(400);

        if race.temperature == TemperatureBand::Hot {
            sodium += dec!(200);
        }
        if athlete.weight_kg > dec!(80) {
            sodium += dec!(100);
        }

        sodium.clamp(dec!(300), dec!(1000))
    }

    /// Total caffeine budget in milligrams, weight-scaled and capped at 300
    fn caffeine_total(athlete: &AthleteProfile, intensity: Intensity) -> Decimal {
        let mg_per_kg = match intensity {
            Intensity::Easy => dec!(2),
            Intensity::Moderate => dec!(3),
            Intensity::Hard => dec!(4),
        };

        (athlete.weight_kg * mg_per_kg).min(CAFFEINE_TOTAL_CAP_MG)
    }

    /// Split race totals into triathlon phase sub-targets
    ///
    /// The swim leg carries no nutrition. Carbs split 70/30 between bike and
    /// run; sodium and fluid split proportional to the leg durations.
    fn triathlon_split(carbs_g: Decimal, fluid_ml: Decimal, sodium_mg: Decimal) -> TriathlonTargets {
        let bike_time_share = TRI_BIKE_SHARE / (TRI_BIKE_SHARE + TRI_RUN_SHARE);
        let run_time_share = Decimal::ONE - bike_time_share;
        let run_carb_share = Decimal::ONE - TRI_BIKE_CARB_SHARE;

        TriathlonTargets {
            bike: PhaseTargets {
                carbs_g: carbs_g * TRI_BIKE_CARB_SHARE,
                fluid_ml: fluid_ml * bike_time_share,
                sodium_mg: sodium_mg * bike_time_share,
            },
            run: PhaseTargets {
                carbs_g: carbs_g * run_carb_share,
                fluid_ml: fluid_ml * run_time_share,
                sodium_mg: sodium_mg * run_time_share,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn race(sport: Sport, hours: Decimal, temp: TemperatureBand, intensity: Intensity) -> RaceProfile {
        RaceProfile {
            sport,
            duration_hours: hours,
            temperature: temp,
            intensity,
        }
    }

    #[test]
    fn test_carb_targets_by_intensity() {
        let athlete = AthleteProfile::new(dec!(75));

        let easy = race(Sport::Run, dec!(2), TemperatureBand::Moderate, Intensity::Easy);
        let targets = TargetCalculator::compute(&easy, &athlete, false).unwrap();
        assert_eq!(targets.carbs_g_per_hour, dec!(50));
        assert_eq!(targets.carbs_g, dec!(100));

        let hard = race(Sport::Run, dec!(2), TemperatureBand::Moderate, Intensity::Hard);
        let targets = TargetCalculator::compute(&hard, &athlete, false).unwrap();
        assert_eq!(targets.carbs_g_per_hour, dec!(90));
        assert_eq!(targets.carbs_g, dec!(180));
    }

    #[test]
    fn test_long_race_bonus() {
        let athlete = AthleteProfile::new(dec!(75));

        let long_moderate = race(Sport::Bike, dec!(6), TemperatureBand::Moderate, Intensity::Moderate);
        let targets = TargetCalculator::compute(&long_moderate, &athlete, false).unwrap();
        assert_eq!(targets.carbs_g_per_hour, dec!(80));

        // Easy effort never gets the bonus
        let long_easy = race(Sport::Bike, dec!(6), TemperatureBand::Moderate, Intensity::Easy);
        let targets = TargetCalculator::compute(&long_easy, &athlete, false).unwrap();
        assert_eq!(targets.carbs_g_per_hour, dec!(50));

        // Five hours exactly is not a long race
        let five_hours = race(Sport::Bike, dec!(5), TemperatureBand::Moderate, Intensity::Hard);
        let targets = TargetCalculator::compute(&five_hours, &athlete, false).unwrap();
        assert_eq!(targets.carbs_g_per_hour, dec!(90));
    }

    #[test]
    fn test_fluid_modifiers() {
        let base = race(Sport::Run, dec!(1), TemperatureBand::Moderate, Intensity::Moderate);
        let targets = TargetCalculator::compute(&base, &AthleteProfile::new(dec!(75)), false).unwrap();
        assert_eq!(targets.fluid_ml_per_hour, dec!(500));

        let hot = race(Sport::Run, dec!(1), TemperatureBand::Hot, Intensity::Moderate);
        let targets = TargetCalculator::compute(&hot, &AthleteProfile::new(dec!(90)), false).unwrap();
        assert_eq!(targets.fluid_ml_per_hour, dec!(750));

        let cold = race(Sport::Run, dec!(1), TemperatureBand::Cold, Intensity::Moderate);
        let targets = TargetCalculator::compute(&cold, &AthleteProfile::new(dec!(55)), false).unwrap();
        assert_eq!(targets.fluid_ml_per_hour, dec!(350));
    }

    #[test]
    fn test_sodium_modifiers() {
        let hot_heavy = race(Sport::Bike, dec!(3), TemperatureBand::Hot, Intensity::Moderate);
        let targets =
            TargetCalculator::compute(&hot_heavy, &AthleteProfile::new(dec!(85)), false).unwrap();
        assert_eq!(targets.sodium_mg_per_hour, dec!(700));
        assert_eq!(targets.sodium_mg, dec!(2100));

        let moderate = race(Sport::Bike, dec!(3), TemperatureBand::Moderate, Intensity::Moderate);
        let targets =
            TargetCalculator::compute(&moderate, &AthleteProfile::new(dec!(70)), false).unwrap();
        assert_eq!(targets.sodium_mg_per_hour, dec!(400));
    }

    #[test]
    fn test_caffeine_budget() {
        let hard = race(Sport::Run, dec!(3), TemperatureBand::Moderate, Intensity::Hard);

        let targets = TargetCalculator::compute(&hard, &AthleteProfile::new(dec!(75)), true).unwrap();
        assert_eq!(targets.caffeine_mg, dec!(300));

        // Heavier athletes are capped at 300 mg
        let targets = TargetCalculator::compute(&hard, &AthleteProfile::new(dec!(95)), true).unwrap();
        assert_eq!(targets.caffeine_mg, dec!(300));

        let easy = race(Sport::Run, dec!(3), TemperatureBand::Moderate, Intensity::Easy);
        let targets = TargetCalculator::compute(&easy, &AthleteProfile::new(dec!(75)), true).unwrap();
        assert_eq!(targets.caffeine_mg, dec!(150));
    }

    #[test]
    fn test_caffeine_disabled() {
        let hard = race(Sport::Run, dec!(3), TemperatureBand::Moderate, Intensity::Hard);
        let targets = TargetCalculator::compute(&hard, &AthleteProfile::new(dec!(75)), false).unwrap();
        assert_eq!(targets.caffeine_mg, Decimal::ZERO);
    }

    #[test]
    fn test_triathlon_phase_split() {
        let tri = race(Sport::Triathlon, dec!(4), TemperatureBand::Moderate, Intensity::Hard);
        let targets = TargetCalculator::compute(&tri, &AthleteProfile::new(dec!(75)), false).unwrap();

        assert_eq!(targets.carbs_g, dec!(360));
        let phases = targets.phase_targets.expect("triathlon has phase targets");
        assert_eq!(phases.bike.carbs_g, dec!(252));
        assert_eq!(phases.run.carbs_g, dec!(108));

        // Fluid and sodium split proportional to leg durations (5/8 vs 3/8)
        assert_eq!(phases.bike.fluid_ml, dec!(1250));
        assert_eq!(phases.run.fluid_ml, dec!(750));
        assert_eq!(phases.bike.sodium_mg + phases.run.sodium_mg, targets.sodium_mg);
    }

    #[test]
    fn test_single_sport_has_no_phase_targets() {
        let run = race(Sport::Run, dec!(2), TemperatureBand::Moderate, Intensity::Hard);
        let targets = TargetCalculator::compute(&run, &AthleteProfile::new(dec!(75)), false).unwrap();
        assert!(targets.phase_targets.is_none());
    }

    #[test]
    fn test_input_validation() {
        let athlete = AthleteProfile::new(dec!(75));

        let too_long = race(Sport::Run, dec!(25), TemperatureBand::Moderate, Intensity::Easy);
        assert!(TargetCalculator::compute(&too_long, &athlete, false).is_err());

        let zero_duration = race(Sport::Run, Decimal::ZERO, TemperatureBand::Moderate, Intensity::Easy);
        assert!(TargetCalculator::compute(&zero_duration, &athlete, false).is_err());

        let ok_race = race(Sport::Run, dec!(2), TemperatureBand::Moderate, Intensity::Easy);
        assert!(TargetCalculator::compute(&ok_race, &AthleteProfile::new(dec!(260)), false).is_err());
        assert!(TargetCalculator::compute(&ok_race, &AthleteProfile::new(Decimal::ZERO), false).is_err());
    }
}
