//! Pulse-train parameter model for a signal / light-source generator.
//!
//! Three linked timing ranges (Period, Pulse Width and Interval) are kept
//! consistent by [`ConstraintEngine`] under a single locked parameter, and
//! [`WaveformBuilder`] samples concrete pulse widths and intervals from them
//! into a fixed 8-row segment table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;
use wasm_bindgen::prelude::*;

pub mod engine;
pub mod input;
pub mod sampler;
pub mod session;
pub mod waveform;

pub use engine::{ConstraintEngine, PulseTiming, RangeEdit};
pub use sampler::{Distribution, RandomSampler, Sampler};
pub use session::{DisplaySnapshot, GeneratorSession, RangeView, WaveformType};
pub use waveform::{Segment, SegmentField, WaveformBuilder, WaveformTable};

/// Default parameter values and domain limits
pub mod defaults {
    /// Rows in a waveform table.
    pub const TABLE_SIZE: usize = 8;
    /// Each pulse contributes an ON row and an OFF row.
    pub const SEGMENTS_PER_PULSE: usize = 2;
    pub const MAX_TABLE_PULSES: usize = TABLE_SIZE / SEGMENTS_PER_PULSE;

    pub const MAX_PULSE_COUNT: u32 = 511;
    pub const MAX_REPEAT_COUNT: u32 = 999;
    pub const MIN_AMPLITUDE: f64 = 0.0;
    pub const MAX_AMPLITUDE: f64 = 100.0;

    pub const AMPLITUDE: f64 = 10.0;
    pub const INITIAL_DELAY_MS: f64 = 0.0;
    pub const PULSE_COUNT: u32 = 1;
    pub const REPEAT_COUNT: u32 = 1;
    pub const PULSE_WIDTH_MS: (f64, f64) = (20.0, 60.0);
    pub const INTERVAL_MS: (f64, f64) = (20.0, 140.0);
    pub const OUTPUT_WAVEFORM: &str = "Advanced Pulse Train";

    /// Tolerance used when checking `period == pulse_width + interval`.
    pub const TOLERANCE: f64 = 1e-9;
}

/// Which of the three linked timing parameters an edit or lock refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Parameter {
    #[default]
    Period,
    PulseWidth,
    Interval,
}

impl Parameter {
    pub const ALL: [Parameter; 3] = [Parameter::Period, Parameter::PulseWidth, Parameter::Interval];

    /// Key used by the input surface (`"period"`, `"pulseWidth"`, `"interval"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Parameter::Period => "period",
            Parameter::PulseWidth => "pulseWidth",
            Parameter::Interval => "interval",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Parameter::Period => "Period",
            Parameter::PulseWidth => "Pulse Width",
            Parameter::Interval => "Interval",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Parameter {
    type Err = RejectedEdit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Parameter::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RejectedEdit::UnknownName {
                input: s.to_string(),
            })
    }
}

/// Lower or upper end of a [`Range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Boundary {
    Min,
    Max,
}

impl Boundary {
    pub fn as_str(self) -> &'static str {
        match self {
            Boundary::Min => "min",
            Boundary::Max => "max",
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Boundary {
    type Err = RejectedEdit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" => Ok(Boundary::Min),
            "max" => Ok(Boundary::Max),
            _ => Err(RejectedEdit::UnknownName {
                input: s.to_string(),
            }),
        }
    }
}

/// A `[min, max]` span of milliseconds.
///
/// Arithmetic is componentwise: min pairs with min and max with max, never
/// crossed. A range held by [`PulseTiming`] is always finite, non-negative and
/// ordered; a bare `Range` may be anything until it is checked.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Build a range, rejecting negative, non-finite or inverted bounds.
    pub fn checked(parameter: Parameter, min: f64, max: f64) -> Result<Self, RejectedEdit> {
        let range = Self::new(min, max);
        range.validate(parameter)?;
        Ok(range)
    }

    /// Midpoint; finite for any finite range.
    pub fn avg(&self) -> f64 {
        self.min / 2.0 + self.max / 2.0
    }

    pub fn get(&self, boundary: Boundary) -> f64 {
        match boundary {
            Boundary::Min => self.min,
            Boundary::Max => self.max,
        }
    }

    /// Copy of this range with one boundary replaced.
    pub fn with(self, boundary: Boundary, value: f64) -> Self {
        match boundary {
            Boundary::Min => Self { min: value, ..self },
            Boundary::Max => Self { max: value, ..self },
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }

    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    pub fn approx_eq(&self, other: &Range, tolerance: f64) -> bool {
        (self.min - other.min).abs() <= tolerance && (self.max - other.max).abs() <= tolerance
    }

    /// Check the range invariant, reporting the first violation found.
    ///
    /// Overflow is checked before sign, and sign before ordering, so a
    /// derived range that went negative is reported as such even when it is
    /// also inverted.
    pub fn validate(&self, parameter: Parameter) -> Result<(), RejectedEdit> {
        if !(self.min.is_finite() && self.max.is_finite()) {
            return Err(RejectedEdit::Overflow { parameter });
        }
        for boundary in [Boundary::Min, Boundary::Max] {
            let value = self.get(boundary);
            if value < 0.0 {
                return Err(RejectedEdit::NegativeDerivation {
                    parameter,
                    boundary,
                    value,
                });
            }
        }
        if !self.is_ordered() {
            return Err(RejectedEdit::Ordering {
                parameter,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl Add for Range {
    type Output = Range;

    fn add(self, rhs: Range) -> Range {
        Range::new(self.min + rhs.min, self.max + rhs.max)
    }
}

impl Sub for Range {
    type Output = Range;

    fn sub(self, rhs: Range) -> Range {
        Range::new(self.min - rhs.min, self.max - rhs.max)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Why an edit was refused. A refused edit never changes any state.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectedEdit {
    /// Raw text is not a non-negative finite number.
    Parse { input: String },
    /// A range would end up with `min > max`.
    Ordering {
        parameter: Parameter,
        min: f64,
        max: f64,
    },
    /// The lock rule would push a derived boundary below zero.
    NegativeDerivation {
        parameter: Parameter,
        boundary: Boundary,
        value: f64,
    },
    /// A derived range is no longer finite.
    Overflow { parameter: Parameter },
    /// A scalar setting is outside its allowed interval.
    OutOfBounds {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    NoSuchSegment { index: usize },
    UnknownName { input: String },
}

impl fmt::Display for RejectedEdit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectedEdit::Parse { input } => {
                write!(f, "'{}' is not a valid non-negative number", input)
            }
            RejectedEdit::Ordering { parameter, min, max } => write!(
                f,
                "{} minimum {} would exceed its maximum {}",
                parameter, min, max
            ),
            RejectedEdit::NegativeDerivation {
                parameter,
                boundary,
                value,
            } => write!(
                f,
                "{} {} would become negative ({})",
                parameter, boundary, value
            ),
            RejectedEdit::Overflow { parameter } => {
                write!(f, "{} would no longer be a finite number", parameter)
            }
            RejectedEdit::OutOfBounds {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "{} {} is outside the allowed range [{} to {}]",
                field, value, min, max
            ),
            RejectedEdit::NoSuchSegment { index } => write!(
                f,
                "Segment {} does not exist (table has {} rows)",
                index,
                defaults::TABLE_SIZE
            ),
            RejectedEdit::UnknownName { input } => write!(f, "Unknown name '{}'", input),
        }
    }
}

impl std::error::Error for RejectedEdit {}

/// Build a waveform table from plain numbers for JavaScript callers.
///
/// # Arguments
/// * `pulse_width_min`, `pulse_width_max` - Pulse width range in ms
/// * `interval_min`, `interval_max` - Interval range in ms
/// * `amplitude` - Output level of every ON segment (0-100)
/// * `pulse_count` - Requested pulses; at most four fit the table
/// * `seed` - Sampler seed, so the same call yields the same table
///
/// # Returns
/// The serialized 8-row table, or an error message if a range is invalid
#[wasm_bindgen]
pub fn build_waveform_table(
    pulse_width_min: f64,
    pulse_width_max: f64,
    interval_min: f64,
    interval_max: f64,
    amplitude: f64,
    pulse_count: u32,
    seed: u32,
) -> JsValue {
    let ranges = Range::checked(Parameter::PulseWidth, pulse_width_min, pulse_width_max).and_then(
        |pulse_width| {
            Range::checked(Parameter::Interval, interval_min, interval_max)
                .map(|interval| (pulse_width, interval))
        },
    );

    match ranges {
        Ok((pulse_width, interval)) => {
            let amplitude = amplitude.clamp(defaults::MIN_AMPLITUDE, defaults::MAX_AMPLITUDE);
            let mut builder = WaveformBuilder::new(RandomSampler::seeded(u64::from(seed)));
            let table = builder.build(&pulse_width, &interval, amplitude, pulse_count);
            serde_wasm_bindgen::to_value(&table).unwrap_or(JsValue::NULL)
        }
        Err(e) => serde_wasm_bindgen::to_value(&format!("Invalid waveform parameters: {}", e))
            .unwrap_or(JsValue::NULL),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_arithmetic_is_componentwise() {
        let pulse_width = Range::new(20.0, 60.0);
        let interval = Range::new(20.0, 140.0);
        let period = pulse_width + interval;
        assert_eq!(period, Range::new(40.0, 200.0));
        assert_eq!(period - pulse_width, interval);
        assert_eq!(period.avg(), 120.0);
    }

    #[test]
    fn avg_of_huge_range_is_finite() {
        assert_eq!(Range::new(1e308, 1e308).avg(), 1e308);
        assert_eq!(Range::new(f64::MAX, f64::MAX).avg(), f64::MAX);
    }

    #[test]
    fn validate_reports_sign_before_ordering() {
        let derived = Range::new(-5.0, -10.0);
        assert_eq!(
            derived.validate(Parameter::Interval),
            Err(RejectedEdit::NegativeDerivation {
                parameter: Parameter::Interval,
                boundary: Boundary::Min,
                value: -5.0,
            })
        );
        assert!(matches!(
            Range::new(30.0, 10.0).validate(Parameter::Period),
            Err(RejectedEdit::Ordering { .. })
        ));
        assert!(matches!(
            Range::new(0.0, f64::INFINITY).validate(Parameter::Period),
            Err(RejectedEdit::Overflow { .. })
        ));
    }

    #[test]
    fn names_round_trip_through_from_str() {
        for parameter in Parameter::ALL {
            assert_eq!(parameter.as_str().parse::<Parameter>(), Ok(parameter));
        }
        assert_eq!("MAX".parse::<Boundary>(), Ok(Boundary::Max));
        assert!("avg".parse::<Boundary>().is_err());
        assert!("duty".parse::<Parameter>().is_err());
    }
}
