use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::debug;

use crate::catalog;
use crate::error::{FuelRsError, Result};
use crate::models::{
    AthleteProfile, MultiNutrientTargets, NutritionEvent, Phase, PlanResult, Product,
    ProductType, RaceProfile, Sport, BACKBONE_CARB_SHARE, BIKE_TOPUP_SPACING_MIN,
    CAFFEINE_SPACING_MIN, CARB_TOPUP_BUFFER_G, CLUSTER_WINDOW_MIN, DIVERSITY_WINDOW,
    MAX_INTAKES_PER_HOUR, OVERSHOOT_FACTOR, PLANNER_SEED, PRE_RACE_TIME_MIN,
    PRE_RACE_TRIGGER_SHARE, RUN_TOPUP_SPACING_MIN, TAIL_MARGIN_MIN, TRANSITION_MARGIN_MIN,
    TRI_BIKE_DEFICIT_SHARE,
};
use crate::scoring::{ProductScorer, ScoreContext};
use crate::targets::TargetCalculator;
use crate::timeline::{PhaseTimeline, Slot, SlotEnumerator};
use crate::validation::PlanValidator;

/// Transient accounting for a single planning call
///
/// Lives only inside `NutritionPlanner::generate`; every call builds a fresh
/// state with its own seeded tie-breaking source, so identical inputs yield
/// identical plans.
struct PlannerState {
    carbs_g: Decimal,
    sodium_mg: Decimal,
    fluid_ml: Decimal,
    caffeine_mg: Decimal,
    recent_products: VecDeque<String>,
    intake_count: u32,
    next_caffeine_min: i32,
    occupied: BTreeSet<i32>,
    rng: ChaCha8Rng,
}

impl PlannerState {
    fn new() -> Self {
        Self {
            carbs_g: Decimal::ZERO,
            sodium_mg: Decimal::ZERO,
            fluid_ml: Decimal::ZERO,
            caffeine_mg: Decimal::ZERO,
            recent_products: VecDeque::with_capacity(DIVERSITY_WINDOW),
            intake_count: 0,
            next_caffeine_min: 0,
            occupied: BTreeSet::new(),
            rng: ChaCha8Rng::seed_from_u64(PLANNER_SEED),
        }
    }

    /// Fold a placed product into the running totals and the diversity FIFO
    fn record(&mut self, product: &Product, time_min: i32) {
        self.carbs_g += product.carbs_g;
        self.sodium_mg += product.sodium_mg;
        self.fluid_ml += product.volume_ml;

        if product.has_caffeine {
            self.caffeine_mg += product.caffeine_mg;
            self.next_caffeine_min = time_min + CAFFEINE_SPACING_MIN;
        }

        if self.recent_products.len() == DIVERSITY_WINDOW {
            self.recent_products.pop_front();
        }
        self.recent_products.push_back(product.name.clone());

        self.intake_count += 1;
        self.occupied.insert(time_min);
    }

    /// True when any placed event sits strictly closer than `within` minutes
    fn is_near_occupied(&self, time_min: i32, within: i32) -> bool {
        self.occupied
            .range((time_min - within + 1)..=(time_min + within - 1))
            .next()
            .is_some()
    }
}

/// The race-day nutrition planner
///
/// A pipeline over an in-memory plan: drink backbone, pre-race entry,
/// scored slot fill, tail top-up, then one sort-and-accumulate pass before
/// validation. Pure per call; catalogs are shared read-only.
pub struct NutritionPlanner;

impl NutritionPlanner {
    /// Generate a complete nutrition plan for a race
    pub fn generate(
        race: &RaceProfile,
        athlete: &AthleteProfile,
        products: &[Product],
        caffeine_enabled: bool,
    ) -> Result<PlanResult> {
        catalog::validate_catalog(products)?;
        let targets = TargetCalculator::compute(race, athlete, caffeine_enabled)?;
        let timeline = PhaseTimeline::build(race);
        let slots = SlotEnumerator::enumerate(&timeline);

        let mut state = PlannerState::new();
        let mut events: Vec<NutritionEvent> = Vec::new();

        Self::place_backbone(&mut events, &mut state, &targets, &timeline, products);
        Self::place_pre_race(&mut events, &mut state, &targets, &timeline, products);
        Self::fill_slots(
            &mut events,
            &mut state,
            &targets,
            &timeline,
            &slots,
            products,
            caffeine_enabled,
            race.duration_hours,
        );
        Self::top_up(&mut events, &mut state, &targets, &timeline, products);

        let by_name: HashMap<&str, &Product> =
            products.iter().map(|p| (p.name.as_str(), p)).collect();
        Self::sort_and_accumulate(&mut events, &by_name)?;

        // Last-resort single event when the top-up could not reach the target
        if state.carbs_g < targets.carbs_g - CARB_TOPUP_BUFFER_G
            && Self::append_remedial_event(&mut events, &mut state, &targets, &timeline, products)
        {
            Self::sort_and_accumulate(&mut events, &by_name)?;
        }

        debug!(
            events = events.len(),
            carbs_g = %state.carbs_g,
            caffeine_mg = %state.caffeine_mg,
            "plan assembled"
        );

        let (warnings, errors) =
            PlanValidator::validate(&events, &targets, products, caffeine_enabled);

        Ok(PlanResult {
            events,
            warnings,
            errors,
        })
    }

    /// Pre-place high-carb drink events covering roughly 45% of the carb
    /// target, anchored to the bike phase when the race has one
    fn place_backbone(
        events: &mut Vec<NutritionEvent>,
        state: &mut PlannerState,
        targets: &MultiNutrientTargets,
        timeline: &PhaseTimeline,
        products: &[Product],
    ) {
        let budget = targets.carbs_g * BACKBONE_CARB_SHARE;

        let mut drinks: Vec<&Product> = products
            .iter()
            .filter(|p| p.is_high_carb_drink() && !p.has_caffeine)
            .collect();
        drinks.sort_by(|a, b| b.carbs_g.cmp(&a.carbs_g));
        let Some(drink) = drinks.first().copied() else {
            return;
        };

        if let Some(bike) = timeline.segment(Phase::Bike) {
            let mut t = bike.start_min + 15;
            while t <= bike.end_min - TRANSITION_MARGIN_MIN && state.carbs_g < budget {
                events.push(Self::make_event(drink, t, timeline));
                state.record(drink, t);
                t += 35;
            }
        } else {
            let mut t = 20;
            while t <= timeline.duration_min - 10 && state.carbs_g < budget {
                events.push(Self::make_event(drink, t, timeline));
                state.record(drink, t);
                t += 40;
            }
        }

        debug!(backbone_events = events.len(), "drink backbone placed");
    }

    /// Insert a single pre-race intake when the backbone covers less than
    /// 10% of the carb target; bars are preferred over gels, caffeine never
    fn place_pre_race(
        events: &mut Vec<NutritionEvent>,
        state: &mut PlannerState,
        targets: &MultiNutrientTargets,
        timeline: &PhaseTimeline,
        products: &[Product],
    ) {
        if state.carbs_g >= targets.carbs_g * PRE_RACE_TRIGGER_SHARE {
            return;
        }

        let pick = Self::best_by_carbs(products, |p| {
            p.product_type == ProductType::Bar && !p.has_caffeine
        })
        .or_else(|| {
            Self::best_by_carbs(products, |p| p.product_type == ProductType::Gel && !p.has_caffeine)
        });

        if let Some(product) = pick {
            events.push(Self::make_event(product, PRE_RACE_TIME_MIN, timeline));
            state.record(product, PRE_RACE_TIME_MIN);
        }
    }

    /// Fill free slots with the top-scored eligible product
    #[allow(clippy::too_many_arguments)]
    fn fill_slots(
        events: &mut Vec<NutritionEvent>,
        state: &mut PlannerState,
        targets: &MultiNutrientTargets,
        timeline: &PhaseTimeline,
        slots: &[Slot],
        products: &[Product],
        caffeine_enabled: bool,
        duration_hours: Decimal,
    ) {
        let duration = Decimal::from(timeline.duration_min);

        for slot in slots {
            if slot.phase == Phase::Swim {
                continue;
            }
            if state.is_near_occupied(slot.time_min, CLUSTER_WINDOW_MIN) {
                continue;
            }

            let remaining_carbs = targets.carbs_g - state.carbs_g;
            if remaining_carbs <= Decimal::ZERO {
                continue;
            }
            let remaining_sodium = (targets.sodium_mg - state.sodium_mg).max(Decimal::ZERO);

            let progress = Decimal::from(slot.time_min) / duration;
            let projected_rate =
                Decimal::from(state.intake_count) / ((progress + dec!(0.1)) * duration_hours);

            let recent: Vec<String> = state.recent_products.iter().cloned().collect();
            let ctx = ScoreContext {
                phase: slot.phase,
                race_progress: progress,
                slot_time_min: slot.time_min,
                caffeine_enabled,
                next_caffeine_min: state.next_caffeine_min,
                carb_target_g: targets.carbs_g,
                carbs_consumed_g: state.carbs_g,
                caffeine_target_mg: targets.caffeine_mg,
                caffeine_consumed_mg: state.caffeine_mg,
                remaining_sodium_mg: remaining_sodium,
                recent_products: &recent,
                rate_exceeded: projected_rate > MAX_INTAKES_PER_HOUR,
            };

            let mut best_score = Decimal::MIN;
            let mut best: Vec<&Product> = Vec::new();
            for product in products {
                if !ProductScorer::is_eligible(product, &ctx) {
                    continue;
                }
                let score = ProductScorer::score(product, &ctx);
                if score > best_score {
                    best_score = score;
                    best.clear();
                    best.push(product);
                } else if score == best_score {
                    best.push(product);
                }
            }

            if best.is_empty() || best_score <= Decimal::ZERO {
                continue;
            }

            let pick = if best.len() == 1 {
                best[0]
            } else {
                best[state.rng.gen_range(0..best.len())]
            };

            events.push(Self::make_event(pick, slot.time_min, timeline));
            state.record(pick, slot.time_min);
        }
    }

    /// Inject additional caffeine-free events while carbohydrates are short
    /// of the target
    ///
    /// One routine, three sub-strategies selected by phase topology:
    /// triathlon bike-first-then-run fill, single-phase countdown from the
    /// tail, and (separately) the final single-event append.
    fn top_up(
        events: &mut Vec<NutritionEvent>,
        state: &mut PlannerState,
        targets: &MultiNutrientTargets,
        timeline: &PhaseTimeline,
        products: &[Product],
    ) {
        let goal = targets.carbs_g - CARB_TOPUP_BUFFER_G;
        if state.carbs_g >= goal {
            return;
        }

        let mut candidates: Vec<&Product> =
            products.iter().filter(|p| !p.has_caffeine).collect();
        candidates.sort_by(|a, b| b.carbs_g.cmp(&a.carbs_g));
        if candidates.is_empty() {
            return;
        }
        let cap = targets.carbs_g * OVERSHOOT_FACTOR;

        let bike = timeline.segment(Phase::Bike).cloned();
        let run = timeline.segment(Phase::Run).cloned();

        match (timeline.sport, bike, run) {
            (Sport::Triathlon, Some(bike), Some(run)) => {
                let deficit = targets.carbs_g - state.carbs_g;
                let bike_goal = (state.carbs_g + deficit * TRI_BIKE_DEFICIT_SHARE).min(goal);

                Self::fill_window(
                    events,
                    state,
                    timeline,
                    &candidates,
                    bike.start_min + 15,
                    bike.end_min - TRANSITION_MARGIN_MIN,
                    BIKE_TOPUP_SPACING_MIN,
                    bike_goal,
                    cap,
                );
                Self::fill_window(
                    events,
                    state,
                    timeline,
                    &candidates,
                    run.start_min + TRANSITION_MARGIN_MIN,
                    timeline.duration_min - TAIL_MARGIN_MIN,
                    RUN_TOPUP_SPACING_MIN,
                    goal,
                    cap,
                );
            }
            _ => {
                let spacing = if timeline.sport == Sport::Bike {
                    BIKE_TOPUP_SPACING_MIN
                } else {
                    RUN_TOPUP_SPACING_MIN
                };

                let mut t = timeline.duration_min - TAIL_MARGIN_MIN;
                while t > 0 && state.carbs_g < goal {
                    if !state.is_near_occupied(t, spacing) {
                        let Some(product) = Self::pick_topup(&candidates, state.carbs_g, cap)
                        else {
                            break;
                        };
                        events.push(Self::make_event(product, t, timeline));
                        state.record(product, t);
                    }
                    t -= 10;
                }
            }
        }
    }

    /// Scan a window forward in five-minute steps, placing top-up events on
    /// free minutes until the carb goal is met
    #[allow(clippy::too_many_arguments)]
    fn fill_window(
        events: &mut Vec<NutritionEvent>,
        state: &mut PlannerState,
        timeline: &PhaseTimeline,
        candidates: &[&Product],
        start_min: i32,
        end_min: i32,
        spacing_min: i32,
        carb_goal: Decimal,
        carb_cap: Decimal,
    ) {
        let mut t = start_min;
        while t <= end_min && state.carbs_g < carb_goal {
            if !state.is_near_occupied(t, spacing_min) {
                let Some(product) = Self::pick_topup(candidates, state.carbs_g, carb_cap) else {
                    return;
                };
                events.push(Self::make_event(product, t, timeline));
                state.record(product, t);
            }
            t += 5;
        }
    }

    /// Largest caffeine-free candidate that stays under the carb ceiling
    fn pick_topup<'a>(
        candidates: &[&'a Product],
        consumed_g: Decimal,
        cap_g: Decimal,
    ) -> Option<&'a Product> {
        candidates
            .iter()
            .copied()
            .find(|p| consumed_g + p.carbs_g <= cap_g)
    }

    /// Append one final event near the tail when the plan is still short;
    /// scans backwards for the latest minute that keeps the per-phase
    /// top-up spacing and gives up when none exists
    fn append_remedial_event(
        events: &mut Vec<NutritionEvent>,
        state: &mut PlannerState,
        targets: &MultiNutrientTargets,
        timeline: &PhaseTimeline,
        products: &[Product],
    ) -> bool {
        let mut candidates: Vec<&Product> =
            products.iter().filter(|p| !p.has_caffeine).collect();
        candidates.sort_by(|a, b| b.carbs_g.cmp(&a.carbs_g));
        let cap = targets.carbs_g * OVERSHOOT_FACTOR;

        let mut t = timeline.duration_min - TAIL_MARGIN_MIN;
        while t > 0 {
            let phase = timeline.phase_at(t);
            if phase == Phase::Swim {
                // Scanning backwards, everything earlier is swim too
                return false;
            }
            let spacing = match phase {
                Phase::Bike => BIKE_TOPUP_SPACING_MIN,
                _ => RUN_TOPUP_SPACING_MIN,
            };
            if !state.is_near_occupied(t, spacing) {
                let Some(product) = Self::pick_topup(&candidates, state.carbs_g, cap) else {
                    return false;
                };
                events.push(Self::make_event(product, t, timeline));
                state.record(product, t);
                return true;
            }
            t -= 1;
        }
        false
    }

    /// Stable sort by time, then recompute both cumulative columns from the
    /// catalog in one walk
    ///
    /// Placement leaves the cumulative fields zeroed; this pass is the only
    /// writer. An event naming an unknown product is a programmer error.
    fn sort_and_accumulate(
        events: &mut Vec<NutritionEvent>,
        by_name: &HashMap<&str, &Product>,
    ) -> Result<()> {
        events.sort_by_key(|e| e.time_min);

        let mut carbs = Decimal::ZERO;
        let mut caffeine = Decimal::ZERO;
        for event in events.iter_mut() {
            let product = by_name.get(event.product_name.as_str()).ok_or_else(|| {
                FuelRsError::Internal(format!(
                    "event references unknown product '{}'",
                    event.product_name
                ))
            })?;

            carbs += product.carbs_g;
            event.total_carbs_so_far = carbs;
            if event.has_caffeine {
                caffeine += product.caffeine_mg;
            }
            event.total_caffeine_so_far = caffeine;
        }

        Ok(())
    }

    fn best_by_carbs<'a>(
        products: &'a [Product],
        pred: impl Fn(&Product) -> bool,
    ) -> Option<&'a Product> {
        products
            .iter()
            .filter(|p| pred(p))
            .max_by(|a, b| a.carbs_g.cmp(&b.carbs_g))
    }

    fn make_event(product: &Product, time_min: i32, timeline: &PhaseTimeline) -> NutritionEvent {
        let phase = timeline.phase_at(time_min);
        let phase_description = if time_min < 0 {
            "Pre-race".to_string()
        } else {
            timeline.phase_description(phase)
        };
        NutritionEvent {
            time_min,
            phase,
            phase_description,
            product_name: product.name.clone(),
            amount_portions: 1,
            action: product.texture.action_label().to_string(),
            total_carbs_so_far: Decimal::ZERO,
            total_caffeine_so_far: Decimal::ZERO,
            has_caffeine: product.has_caffeine,
            caffeine_mg: product.has_caffeine.then_some(product.caffeine_mg),
        }
    }
}
