use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{
    Phase, RaceProfile, Sport, BIKE_CADENCE_MIN, RUN_CADENCE_MIN, TAIL_MARGIN_MIN,
    TRANSITION_MARGIN_MIN, TRI_BIKE_SHARE, TRI_RUN_CADENCE_MIN, TRI_SWIM_SHARE,
};

/// One contiguous race segment with time bounds in minutes
///
/// Segments are left-closed and right-open except the last, which is closed
/// at the race duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSegment {
    pub phase: Phase,
    pub start_min: i32,
    pub end_min: i32,
}

/// Ordered partition of the race duration into phases
///
/// Single-sport races get one segment covering the whole race; triathlon
/// races get swim, bike and run segments on the 20/50/30 split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTimeline {
    pub sport: Sport,
    pub duration_min: i32,
    pub segments: Vec<PhaseSegment>,
}

impl PhaseTimeline {
    /// Build the phase timeline for a race, keyed on its sport type
    pub fn build(race: &RaceProfile) -> Self {
        let duration_min = race.duration_min();

        let segments = match race.sport {
            Sport::Run => vec![PhaseSegment {
                phase: Phase::Run,
                start_min: 0,
                end_min: duration_min,
            }],
            Sport::Bike => vec![PhaseSegment {
                phase: Phase::Bike,
                start_min: 0,
                end_min: duration_min,
            }],
            Sport::Triathlon => {
                let duration = Decimal::from(duration_min);
                let swim_end = (duration * TRI_SWIM_SHARE).round().to_i32().unwrap_or(0);
                let bike_end = (duration * (TRI_SWIM_SHARE + TRI_BIKE_SHARE))
                    .round()
                    .to_i32()
                    .unwrap_or(duration_min);

                vec![
                    PhaseSegment {
                        phase: Phase::Swim,
                        start_min: 0,
                        end_min: swim_end,
                    },
                    PhaseSegment {
                        phase: Phase::Bike,
                        start_min: swim_end,
                        end_min: bike_end,
                    },
                    PhaseSegment {
                        phase: Phase::Run,
                        start_min: bike_end,
                        end_min: duration_min,
                    },
                ]
            }
        };

        Self {
            sport: race.sport,
            duration_min,
            segments,
        }
    }

    /// Phase containing a point in time
    ///
    /// Negative times are pre-race and carry the opening segment's phase.
    pub fn phase_at(&self, time_min: i32) -> Phase {
        if time_min < 0 {
            return self
                .segments
                .first()
                .map(|s| s.phase)
                .unwrap_or(Phase::Run);
        }

        for (index, segment) in self.segments.iter().enumerate() {
            let is_last = index == self.segments.len() - 1;
            if time_min >= segment.start_min
                && (time_min < segment.end_min || (is_last && time_min <= segment.end_min))
            {
                return segment.phase;
            }
        }

        // Past the race end, attribute to the final segment
        self.segments
            .last()
            .map(|s| s.phase)
            .unwrap_or(Phase::Run)
    }

    /// Look up the segment for a phase, if the race has one
    pub fn segment(&self, phase: Phase) -> Option<&PhaseSegment> {
        self.segments.iter().find(|s| s.phase == phase)
    }

    /// Human-readable phase label for plan events
    pub fn phase_description(&self, phase: Phase) -> String {
        let label = match (self.sport, phase) {
            (Sport::Triathlon, Phase::Swim) => "Swim leg",
            (Sport::Triathlon, Phase::Bike) => "Bike leg",
            (Sport::Triathlon, Phase::Run) => "Run leg",
            (_, Phase::Swim) => "Swim",
            (_, Phase::Bike) => "Bike",
            (_, Phase::Run) => "Run",
        };
        label.to_string()
    }
}

/// A candidate intake timestamp produced by the enumerator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub time_min: i32,
    pub phase: Phase,
}

/// Cadence-driven slot enumeration over a phase timeline
pub struct SlotEnumerator;

impl SlotEnumerator {
    /// Enumerate candidate intake timestamps for a race
    ///
    /// Slots advance by the cadence of the phase the cursor is in. The last
    /// five minutes of the race are never schedulable, and on a triathlon
    /// the ten minutes before the bike-to-run transition are excluded.
    /// Swim-segment slots are enumerated but left to the filler to skip.
    pub fn enumerate(timeline: &PhaseTimeline) -> Vec<Slot> {
        let mut slots = Vec::new();
        let tail = timeline.duration_min - TAIL_MARGIN_MIN;
        let bike_cutoff = timeline
            .segment(Phase::Bike)
            .map(|s| s.end_min - TRANSITION_MARGIN_MIN);

        let mut cursor = 0;
        loop {
            let step = Self::cadence_min(timeline.sport, timeline.phase_at(cursor));
            let next = cursor + step;
            if next > tail {
                break;
            }

            let phase = timeline.phase_at(next);
            let in_transition = timeline.sport == Sport::Triathlon
                && phase == Phase::Bike
                && matches!(bike_cutoff, Some(cutoff) if next > cutoff);

            if !in_transition {
                slots.push(Slot {
                    time_min: next,
                    phase,
                });
            }
            cursor = next;
        }

        slots
    }

    /// Intake cadence in minutes for a sport and phase
    fn cadence_min(sport: Sport, phase: Phase) -> i32 {
        match (sport, phase) {
            (Sport::Triathlon, Phase::Run) => TRI_RUN_CADENCE_MIN,
            (Sport::Triathlon, _) => BIKE_CADENCE_MIN,
            (Sport::Bike, _) => BIKE_CADENCE_MIN,
            (Sport::Run, _) => RUN_CADENCE_MIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Intensity, TemperatureBand};
    use rust_decimal_macros::dec;

    fn race(sport: Sport, hours: Decimal) -> RaceProfile {
        RaceProfile {
            sport,
            duration_hours: hours,
            temperature: TemperatureBand::Moderate,
            intensity: Intensity::Hard,
        }
    }

    #[test]
    fn test_single_sport_timeline() {
        let timeline = PhaseTimeline::build(&race(Sport::Run, dec!(2)));
        assert_eq!(timeline.segments.len(), 1);
        assert_eq!(timeline.segments[0].phase, Phase::Run);
        assert_eq!(timeline.segments[0].start_min, 0);
        assert_eq!(timeline.segments[0].end_min, 120);
    }

    #[test]
    fn test_triathlon_timeline_split() {
        let timeline = PhaseTimeline::build(&race(Sport::Triathlon, dec!(4)));
        assert_eq!(timeline.segments.len(), 3);

        assert_eq!(timeline.segments[0].phase, Phase::Swim);
        assert_eq!(timeline.segments[0].end_min, 48);
        assert_eq!(timeline.segments[1].phase, Phase::Bike);
        assert_eq!(timeline.segments[1].start_min, 48);
        assert_eq!(timeline.segments[1].end_min, 168);
        assert_eq!(timeline.segments[2].phase, Phase::Run);
        assert_eq!(timeline.segments[2].end_min, 240);
    }

    #[test]
    fn test_phase_at_boundaries() {
        let timeline = PhaseTimeline::build(&race(Sport::Triathlon, dec!(4)));

        // Pre-race times carry the opening segment's phase
        assert_eq!(timeline.phase_at(-15), Phase::Swim);
        assert_eq!(timeline.phase_at(0), Phase::Swim);
        assert_eq!(timeline.phase_at(47), Phase::Swim);
        assert_eq!(timeline.phase_at(48), Phase::Bike);
        assert_eq!(timeline.phase_at(167), Phase::Bike);
        assert_eq!(timeline.phase_at(168), Phase::Run);
        // The last segment is closed at the race end
        assert_eq!(timeline.phase_at(240), Phase::Run);
    }

    #[test]
    fn test_run_slots_use_run_cadence() {
        let timeline = PhaseTimeline::build(&race(Sport::Run, dec!(2)));
        let slots = SlotEnumerator::enumerate(&timeline);

        let times: Vec<i32> = slots.iter().map(|s| s.time_min).collect();
        assert_eq!(times, vec![22, 44, 66, 88, 110]);
        assert!(slots.iter().all(|s| s.phase == Phase::Run));
    }

    #[test]
    fn test_tail_margin_is_respected() {
        let timeline = PhaseTimeline::build(&race(Sport::Bike, dec!(1)));
        let slots = SlotEnumerator::enumerate(&timeline);

        // Tail margin keeps every slot at or before duration - 5
        assert!(slots.iter().all(|s| s.time_min <= 55));
        assert_eq!(slots.last().map(|s| s.time_min), Some(54));
    }

    #[test]
    fn test_triathlon_slot_cadence_and_transition() {
        let timeline = PhaseTimeline::build(&race(Sport::Triathlon, dec!(4)));
        let slots = SlotEnumerator::enumerate(&timeline);

        let times: Vec<i32> = slots.iter().map(|s| s.time_min).collect();
        assert_eq!(times, vec![18, 36, 54, 72, 90, 108, 126, 144, 180, 205, 230]);

        // No slot inside the transition margin before the bike-leg end
        assert!(!times.contains(&162));

        // Swim slots are enumerated, the filler skips them later
        assert_eq!(slots[0].phase, Phase::Swim);
        assert_eq!(slots[1].phase, Phase::Swim);
        assert!(slots.iter().filter(|s| s.phase == Phase::Run).count() >= 2);
    }

    #[test]
    fn test_phase_descriptions() {
        let tri = PhaseTimeline::build(&race(Sport::Triathlon, dec!(4)));
        assert_eq!(tri.phase_description(Phase::Bike), "Bike leg");

        let solo = PhaseTimeline::build(&race(Sport::Bike, dec!(2)));
        assert_eq!(solo.phase_description(Phase::Bike), "Bike");
        assert_eq!(solo.phase_at(-15), Phase::Bike);
    }
}
