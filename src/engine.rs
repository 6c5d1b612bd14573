//! Lock-driven constraint solving for the Period / Pulse Width / Interval ranges.
//!
//! The three ranges always satisfy `period = pulse_width + interval`,
//! boundary by boundary. Editing one range moves exactly one other range; which
//! one is decided by the locked parameter:
//!
//! | edited        | locked        | derived                          |
//! |---------------|---------------|----------------------------------|
//! | pulse width   | period        | interval = period - pulse width  |
//! | interval      | period        | pulse width = period - interval  |
//! | pulse width   | other         | period = pulse width + interval  |
//! | interval      | other         | period = pulse width + interval  |
//! | period        | pulse width   | interval = period - pulse width  |
//! | period        | interval      | pulse width = period - interval  |
//! | period        | period        | interval = period - pulse width  |

use log::debug;
use serde::Serialize;

use crate::{defaults, input, Boundary, Parameter, Range, RejectedEdit};

/// One requested change to a range boundary, already parsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeEdit {
    pub parameter: Parameter,
    pub boundary: Boundary,
    pub value: f64,
}

/// The three linked ranges and the lock. Only constructible in a consistent
/// state, and only changed through [`PulseTiming::apply`] and
/// [`PulseTiming::with_lock`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PulseTiming {
    period: Range,
    pulse_width: Range,
    interval: Range,
    locked: Parameter,
}

impl Default for PulseTiming {
    fn default() -> Self {
        let (pw_min, pw_max) = defaults::PULSE_WIDTH_MS;
        let (int_min, int_max) = defaults::INTERVAL_MS;
        let pulse_width = Range::new(pw_min, pw_max);
        let interval = Range::new(int_min, int_max);
        Self {
            period: pulse_width + interval,
            pulse_width,
            interval,
            locked: Parameter::Period,
        }
    }
}

impl PulseTiming {
    /// Build a timing from its two independent ranges; the period is their sum.
    pub fn new(pulse_width: Range, interval: Range, locked: Parameter) -> Result<Self, RejectedEdit> {
        pulse_width.validate(Parameter::PulseWidth)?;
        interval.validate(Parameter::Interval)?;
        let period = pulse_width + interval;
        period.validate(Parameter::Period)?;
        Ok(Self {
            period,
            pulse_width,
            interval,
            locked,
        })
    }

    pub fn period(&self) -> Range {
        self.period
    }

    pub fn pulse_width(&self) -> Range {
        self.pulse_width
    }

    pub fn interval(&self) -> Range {
        self.interval
    }

    pub fn locked(&self) -> Parameter {
        self.locked
    }

    pub fn range(&self, parameter: Parameter) -> Range {
        match parameter {
            Parameter::Period => self.period,
            Parameter::PulseWidth => self.pulse_width,
            Parameter::Interval => self.interval,
        }
    }

    fn range_mut(&mut self, parameter: Parameter) -> &mut Range {
        match parameter {
            Parameter::Period => &mut self.period,
            Parameter::PulseWidth => &mut self.pulse_width,
            Parameter::Interval => &mut self.interval,
        }
    }

    pub fn with_lock(self, locked: Parameter) -> Self {
        Self { locked, ..self }
    }

    /// `true` when `period == pulse_width + interval` within `tolerance` and
    /// every range is non-negative and ordered.
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        Parameter::ALL
            .into_iter()
            .all(|p| self.range(p).validate(p).is_ok())
            && self
                .period
                .approx_eq(&(self.pulse_width + self.interval), tolerance)
    }

    /// The parameter an edit of `edited` recomputes under the current lock.
    pub fn derived_parameter(&self, edited: Parameter) -> Parameter {
        match (edited, self.locked) {
            (Parameter::PulseWidth, Parameter::Period) => Parameter::Interval,
            (Parameter::Interval, Parameter::Period) => Parameter::PulseWidth,
            (Parameter::PulseWidth, _) | (Parameter::Interval, _) => Parameter::Period,
            (Parameter::Period, Parameter::Interval) => Parameter::PulseWidth,
            (Parameter::Period, _) => Parameter::Interval,
        }
    }

    fn solve(&self, target: Parameter) -> Range {
        match target {
            Parameter::Period => self.pulse_width + self.interval,
            Parameter::PulseWidth => self.period - self.interval,
            Parameter::Interval => self.period - self.pulse_width,
        }
    }

    /// Apply one edit as a transaction.
    ///
    /// Returns the new timing with the edited range committed and the
    /// dependent range recomputed, or the reason the edit was refused. `self`
    /// is never modified.
    pub fn apply(&self, edit: RangeEdit) -> Result<Self, RejectedEdit> {
        if !edit.value.is_finite() || edit.value < 0.0 {
            return Err(RejectedEdit::Parse {
                input: edit.value.to_string(),
            });
        }

        let candidate = self.range(edit.parameter).with(edit.boundary, edit.value);
        if !candidate.is_ordered() {
            return Err(RejectedEdit::Ordering {
                parameter: edit.parameter,
                min: candidate.min,
                max: candidate.max,
            });
        }

        let mut next = *self;
        *next.range_mut(edit.parameter) = candidate;

        let derived = self.derived_parameter(edit.parameter);
        let solved = next.solve(derived);
        solved.validate(derived)?;
        *next.range_mut(derived) = solved;

        Ok(next)
    }
}

/// Owner of the authoritative [`PulseTiming`].
#[derive(Debug, Clone, Default)]
pub struct ConstraintEngine {
    timing: PulseTiming,
}

impl ConstraintEngine {
    pub fn new(timing: PulseTiming) -> Self {
        Self { timing }
    }

    pub fn timing(&self) -> &PulseTiming {
        &self.timing
    }

    pub fn locked(&self) -> Parameter {
        self.timing.locked
    }

    pub fn set_lock(&mut self, parameter: Parameter) {
        debug!("Lock moved from {} to {}", self.timing.locked, parameter);
        self.timing = self.timing.with_lock(parameter);
    }

    /// Parse `raw` and apply it to one boundary of `parameter`.
    pub fn edit(
        &mut self,
        parameter: Parameter,
        boundary: Boundary,
        raw: &str,
    ) -> Result<(), RejectedEdit> {
        let value = input::parse_non_negative(raw).map_err(|e| {
            debug!("Rejected {} {} edit '{}': {}", parameter, boundary, raw, e);
            e
        })?;
        self.apply(RangeEdit {
            parameter,
            boundary,
            value,
        })
    }

    /// Commit an already-parsed edit, or leave everything as it was.
    pub fn apply(&mut self, edit: RangeEdit) -> Result<(), RejectedEdit> {
        match self.timing.apply(edit) {
            Ok(next) => {
                let derived = self.timing.derived_parameter(edit.parameter);
                self.timing = next;
                debug!(
                    "{} {} set to {}; {} is now {}",
                    edit.parameter,
                    edit.boundary,
                    edit.value,
                    derived,
                    self.timing.range(derived)
                );
                Ok(())
            }
            Err(e) => {
                debug!(
                    "Rejected {} {} = {} under {} lock: {}",
                    edit.parameter, edit.boundary, edit.value, self.timing.locked, e
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn engine_locked(locked: Parameter) -> ConstraintEngine {
        let mut engine = ConstraintEngine::default();
        engine.set_lock(locked);
        engine
    }

    #[test]
    fn default_state_matches_panel_defaults() {
        let timing = PulseTiming::default();
        assert_eq!(timing.period(), Range::new(40.0, 200.0));
        assert_eq!(timing.pulse_width(), Range::new(20.0, 60.0));
        assert_eq!(timing.interval(), Range::new(20.0, 140.0));
        assert_eq!(timing.locked(), Parameter::Period);
        assert!(timing.is_consistent(defaults::TOLERANCE));
    }

    #[test]
    fn period_lock_moves_interval_when_pulse_width_changes() {
        let mut engine = engine_locked(Parameter::Period);
        engine
            .edit(Parameter::PulseWidth, Boundary::Min, "30")
            .unwrap();

        let timing = engine.timing();
        assert_eq!(timing.pulse_width(), Range::new(30.0, 60.0));
        assert_eq!(timing.interval(), Range::new(10.0, 140.0));
        assert_eq!(timing.period(), Range::new(40.0, 200.0));
    }

    #[test]
    fn period_lock_moves_pulse_width_when_interval_changes() {
        let mut engine = engine_locked(Parameter::Period);
        engine.edit(Parameter::Interval, Boundary::Max, "100").unwrap();

        let timing = engine.timing();
        assert_eq!(timing.interval(), Range::new(20.0, 100.0));
        assert_eq!(timing.pulse_width(), Range::new(20.0, 100.0));
        assert_eq!(timing.period(), Range::new(40.0, 200.0));
    }

    #[test]
    fn pulse_width_lock_moves_period_when_interval_changes() {
        let mut engine = engine_locked(Parameter::PulseWidth);
        engine.edit(Parameter::Interval, Boundary::Max, "150").unwrap();

        let timing = engine.timing();
        assert_eq!(timing.interval(), Range::new(20.0, 150.0));
        assert_eq!(timing.period(), Range::new(40.0, 210.0));
        assert_eq!(timing.pulse_width(), Range::new(20.0, 60.0));
    }

    #[test]
    fn sibling_locks_move_period_when_a_sibling_changes() {
        for locked in [Parameter::PulseWidth, Parameter::Interval] {
            let mut engine = engine_locked(locked);
            engine
                .edit(Parameter::PulseWidth, Boundary::Max, "80")
                .unwrap();
            assert_eq!(engine.timing().period(), Range::new(40.0, 220.0));
            assert_eq!(engine.timing().interval(), Range::new(20.0, 140.0));
        }
    }

    #[test]
    fn period_edits_derive_the_unlocked_sibling() {
        let mut engine = engine_locked(Parameter::PulseWidth);
        engine.edit(Parameter::Period, Boundary::Max, "250").unwrap();
        assert_eq!(engine.timing().interval(), Range::new(20.0, 190.0));
        assert_eq!(engine.timing().pulse_width(), Range::new(20.0, 60.0));

        let mut engine = engine_locked(Parameter::Interval);
        engine.edit(Parameter::Period, Boundary::Max, "250").unwrap();
        assert_eq!(engine.timing().pulse_width(), Range::new(20.0, 110.0));
        assert_eq!(engine.timing().interval(), Range::new(20.0, 140.0));
    }

    #[test]
    fn period_edit_under_period_lock_derives_interval() {
        let mut engine = engine_locked(Parameter::Period);
        engine.edit(Parameter::Period, Boundary::Min, "50").unwrap();

        let timing = engine.timing();
        assert_eq!(timing.period(), Range::new(50.0, 200.0));
        assert_eq!(timing.interval(), Range::new(30.0, 140.0));
        assert_eq!(timing.pulse_width(), Range::new(20.0, 60.0));
        assert_eq!(timing.locked(), Parameter::Period);
    }

    #[test]
    fn negative_derivation_rejects_whole_edit() {
        let mut engine = engine_locked(Parameter::Period);
        let before = *engine.timing();

        let err = engine
            .edit(Parameter::PulseWidth, Boundary::Min, "45")
            .unwrap_err();
        assert_eq!(
            err,
            RejectedEdit::NegativeDerivation {
                parameter: Parameter::Interval,
                boundary: Boundary::Min,
                value: -5.0,
            }
        );
        assert_eq!(*engine.timing(), before);
    }

    #[test]
    fn shrinking_period_below_locked_sibling_is_rejected() {
        let mut engine = engine_locked(Parameter::Interval);
        let before = *engine.timing();
        assert!(matches!(
            engine.edit(Parameter::Period, Boundary::Min, "10"),
            Err(RejectedEdit::NegativeDerivation {
                parameter: Parameter::PulseWidth,
                ..
            })
        ));
        assert_eq!(*engine.timing(), before);
    }

    #[test]
    fn inverted_derived_range_is_rejected() {
        // interval would become [20, 10]
        let mut engine = engine_locked(Parameter::Period);
        let before = *engine.timing();
        assert_eq!(
            engine.edit(Parameter::PulseWidth, Boundary::Max, "190"),
            Err(RejectedEdit::Ordering {
                parameter: Parameter::Interval,
                min: 20.0,
                max: 10.0,
            })
        );
        assert_eq!(*engine.timing(), before);
    }

    #[test]
    fn parse_and_ordering_failures_leave_state_untouched() {
        let mut engine = engine_locked(Parameter::PulseWidth);
        let before = *engine.timing();

        for raw in ["", "abc", "-3", "1e999"] {
            assert!(matches!(
                engine.edit(Parameter::Interval, Boundary::Min, raw),
                Err(RejectedEdit::Parse { .. })
            ));
        }
        assert!(matches!(
            engine.edit(Parameter::Interval, Boundary::Min, "141"),
            Err(RejectedEdit::Ordering {
                parameter: Parameter::Interval,
                ..
            })
        ));
        assert_eq!(*engine.timing(), before);
    }

    #[test]
    fn huge_values_overflow_instead_of_committing() {
        let mut engine = engine_locked(Parameter::Interval);
        engine
            .edit(Parameter::PulseWidth, Boundary::Max, "1.7e308")
            .unwrap();
        engine.set_lock(Parameter::PulseWidth);
        let before = *engine.timing();
        assert_eq!(
            engine.edit(Parameter::Interval, Boundary::Max, "1.7e308"),
            Err(RejectedEdit::Overflow {
                parameter: Parameter::Period
            })
        );
        assert_eq!(*engine.timing(), before);
    }

    #[test]
    fn set_lock_reads_back() {
        let mut engine = ConstraintEngine::default();
        for parameter in Parameter::ALL {
            engine.set_lock(parameter);
            assert_eq!(engine.locked(), parameter);
        }
    }

    #[test]
    fn apply_is_pure() {
        let timing = PulseTiming::default();
        let edit = RangeEdit {
            parameter: Parameter::PulseWidth,
            boundary: Boundary::Min,
            value: 30.0,
        };
        let next = timing.apply(edit).unwrap();
        assert_eq!(timing, PulseTiming::default());
        assert_eq!(next.interval().min, 10.0);
    }

    #[test]
    fn random_edit_walk_keeps_invariants() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut engine = ConstraintEngine::default();

        for _ in 0..20_000 {
            if rng.random_bool(0.1) {
                let lock = Parameter::ALL[rng.random_range(0..3)];
                engine.set_lock(lock);
                assert_eq!(engine.locked(), lock);
                continue;
            }

            let edit = RangeEdit {
                parameter: Parameter::ALL[rng.random_range(0..3)],
                boundary: if rng.random_bool(0.5) {
                    Boundary::Min
                } else {
                    Boundary::Max
                },
                value: (rng.random_range(0.0..300.0_f64) * 10.0).round() / 10.0,
            };
            let before = *engine.timing();
            if engine.apply(edit).is_err() {
                assert_eq!(*engine.timing(), before);
            }
            assert!(
                engine.timing().is_consistent(defaults::TOLERANCE),
                "inconsistent after {:?}: {:?}",
                edit,
                engine.timing()
            );
        }
    }
}
