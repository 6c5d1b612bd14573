//! Waveform segment table and the builder that fills it from sampled ranges.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::defaults::{MAX_AMPLITUDE, MAX_TABLE_PULSES, MIN_AMPLITUDE, SEGMENTS_PER_PULSE, TABLE_SIZE};
use crate::sampler::{RandomSampler, Sampler};
use crate::{input, Range, RejectedEdit};

/// One row of the table: an output level (percent) held for a duration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub output_level: f64,
    pub duration_ms: f64,
}

impl Segment {
    /// Padding row.
    pub const OFF: Segment = Segment {
        output_level: 0.0,
        duration_ms: 0.0,
    };

    pub const fn new(output_level: f64, duration_ms: f64) -> Self {
        Self {
            output_level,
            duration_ms,
        }
    }

    pub fn is_padding(&self) -> bool {
        *self == Segment::OFF
    }

    pub fn is_on(&self) -> bool {
        self.output_level > 0.0
    }
}

/// Editable column of a [`Segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentField {
    OutputLevel,
    Duration,
}

/// Exactly eight segments, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaveformTable {
    segments: [Segment; TABLE_SIZE],
    /// Rows written by the builder, padding excluded.
    #[serde(skip)]
    generated: usize,
}

impl Default for WaveformTable {
    fn default() -> Self {
        Self {
            segments: [Segment::OFF; TABLE_SIZE],
            generated: 0,
        }
    }
}

impl WaveformTable {
    pub fn segments(&self) -> &[Segment; TABLE_SIZE] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    /// Rows up to and including the last generated or non-padding one.
    ///
    /// A generated pulse of `{0, 0}` still counts as used.
    pub fn used_len(&self) -> usize {
        let filled = self
            .segments
            .iter()
            .rposition(|s| !s.is_padding())
            .map_or(0, |i| i + 1);
        filled.max(self.generated)
    }

    pub fn total_duration_ms(&self) -> f64 {
        self.segments.iter().map(|s| s.duration_ms).sum()
    }

    pub fn on_time_ms(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.is_on())
            .map(|s| s.duration_ms)
            .sum()
    }

    /// Fraction of the total duration spent above zero output (0.0 when empty).
    ///
    /// When the plain sum overflows, durations are scaled by the longest one
    /// first so the ratio stays finite.
    pub fn duty_cycle(&self) -> f64 {
        let total = self.total_duration_ms();
        if total.is_finite() {
            return if total > 0.0 { self.on_time_ms() / total } else { 0.0 };
        }
        let longest = self
            .segments
            .iter()
            .map(|s| s.duration_ms)
            .fold(0.0, f64::max);
        if !longest.is_finite() {
            return 0.0;
        }
        let (on, total) = self.segments.iter().fold((0.0, 0.0), |(on, total), s| {
            let share = s.duration_ms / longest;
            (if s.is_on() { on + share } else { on }, total + share)
        });
        on / total
    }

    /// Hand-edit one cell. Levels must be within 0-100, durations `>= 0`.
    pub fn edit(&mut self, index: usize, field: SegmentField, raw: &str) -> Result<(), RejectedEdit> {
        let segment = self
            .segments
            .get_mut(index)
            .ok_or(RejectedEdit::NoSuchSegment { index })?;

        match field {
            SegmentField::OutputLevel => {
                segment.output_level =
                    input::parse_bounded(raw, "Output level", MIN_AMPLITUDE, MAX_AMPLITUDE)?;
            }
            SegmentField::Duration => {
                segment.duration_ms = input::parse_non_negative(raw)?;
            }
        }
        Ok(())
    }
}

/// Magnitude from which an `f64` has no fractional digits left to round.
const WHOLE_NUMBERS_ONLY: f64 = 1e15;

/// Round to one decimal place, the resolution of the table's duration column.
///
/// Finite input always gives finite output.
pub(crate) fn round_tenths(value: f64) -> f64 {
    if value.abs() >= WHOLE_NUMBERS_ONLY {
        return value;
    }
    (value * 10.0).round() / 10.0
}

/// Fills [`WaveformTable`]s by sampling pulse widths and intervals.
#[derive(Debug, Clone)]
pub struct WaveformBuilder<S = RandomSampler> {
    sampler: S,
}

impl<S: Sampler> WaveformBuilder<S> {
    pub fn new(sampler: S) -> Self {
        Self { sampler }
    }

    pub fn sampler(&self) -> &S {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut S {
        &mut self.sampler
    }

    /// Build a fresh table.
    ///
    /// Each of the first `min(pulse_count, 4)` pulses becomes an ON row at
    /// `amplitude` for a sampled pulse width, then an OFF row for a sampled
    /// interval; durations are rounded to 0.1 ms. Remaining rows are padding.
    /// Ranges are expected to be valid already.
    pub fn build(
        &mut self,
        pulse_width: &Range,
        interval: &Range,
        amplitude: f64,
        pulse_count: u32,
    ) -> WaveformTable {
        let pulses = usize::try_from(pulse_count)
            .unwrap_or(usize::MAX)
            .min(MAX_TABLE_PULSES);
        let mut table = WaveformTable::default();

        for (pulse, rows) in table
            .segments
            .chunks_exact_mut(SEGMENTS_PER_PULSE)
            .take(pulses)
            .enumerate()
        {
            let width = self.sampler.sample(pulse_width.min, pulse_width.max);
            let gap = self.sampler.sample(interval.min, interval.max);
            rows[0] = Segment::new(amplitude, round_tenths(width));
            rows[1] = Segment::new(0.0, round_tenths(gap));
            debug!("Pulse {}: on {:.1} ms, off {:.1} ms", pulse + 1, width, gap);
        }
        table.generated = pulses * SEGMENTS_PER_PULSE;

        info!(
            "Built waveform table: {} of {} requested pulse(s), {:.1} ms total",
            pulses,
            pulse_count,
            table.total_duration_ms()
        );
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays fixed fractions of each requested range, in order.
    struct FixedSequence {
        fractions: VecDeque<f64>,
        calls: Vec<(f64, f64)>,
    }

    impl FixedSequence {
        fn new(fractions: &[f64]) -> Self {
            Self {
                fractions: fractions.iter().copied().collect(),
                calls: Vec::new(),
            }
        }
    }

    impl Sampler for FixedSequence {
        fn sample(&mut self, min: f64, max: f64) -> f64 {
            self.calls.push((min, max));
            let t = self.fractions.pop_front().unwrap_or(0.0);
            min + t * (max - min)
        }
    }

    #[test]
    fn degenerate_ranges_build_deterministic_table() {
        let mut builder = WaveformBuilder::new(RandomSampler::seeded(99));
        let table = builder.build(&Range::new(20.0, 20.0), &Range::new(10.0, 10.0), 10.0, 1);

        let mut expected = [Segment::OFF; TABLE_SIZE];
        expected[0] = Segment::new(10.0, 20.0);
        expected[1] = Segment::new(0.0, 10.0);
        assert_eq!(table.segments(), &expected);
    }

    #[test]
    fn samples_width_then_interval_per_pulse() {
        let sampler = FixedSequence::new(&[0.5, 0.25, 0.0, 1.0]);
        let mut builder = WaveformBuilder::new(sampler);
        let table = builder.build(&Range::new(20.0, 60.0), &Range::new(20.0, 140.0), 42.0, 2);

        assert_eq!(table.segments()[0], Segment::new(42.0, 40.0));
        assert_eq!(table.segments()[1], Segment::new(0.0, 50.0));
        assert_eq!(table.segments()[2], Segment::new(42.0, 20.0));
        assert_eq!(table.segments()[3], Segment::new(0.0, 140.0));
        assert!(table.segments()[4..].iter().all(Segment::is_padding));
        assert_eq!(
            builder.sampler().calls,
            vec![(20.0, 60.0), (20.0, 140.0), (20.0, 60.0), (20.0, 140.0)]
        );
    }

    #[test]
    fn large_pulse_counts_stop_at_four_pulses() {
        let mut builder = WaveformBuilder::new(FixedSequence::new(&[]));
        let table = builder.build(&Range::new(1.0, 2.0), &Range::new(3.0, 4.0), 5.0, 511);

        assert_eq!(table.segments().len(), TABLE_SIZE);
        assert_eq!(builder.sampler().calls.len(), 2 * MAX_TABLE_PULSES);
        for rows in table.segments().chunks_exact(2) {
            assert_eq!(rows[0], Segment::new(5.0, 1.0));
            assert_eq!(rows[1], Segment::new(0.0, 3.0));
        }
    }

    #[test]
    fn zero_pulses_is_all_padding() {
        let mut builder = WaveformBuilder::new(FixedSequence::new(&[]));
        let table = builder.build(&Range::new(1.0, 2.0), &Range::new(3.0, 4.0), 5.0, 0);
        assert_eq!(table, WaveformTable::default());
        assert!(builder.sampler().calls.is_empty());
        assert_eq!(table.used_len(), 0);
    }

    #[test]
    fn durations_are_rounded_to_tenths() {
        let mut builder = WaveformBuilder::new(FixedSequence::new(&[0.123_456, 0.987_654]));
        let table = builder.build(&Range::new(0.0, 10.0), &Range::new(0.0, 10.0), 1.0, 1);
        assert_eq!(table.segments()[0].duration_ms, 1.2);
        assert_eq!(table.segments()[1].duration_ms, 9.9);
    }

    #[test]
    fn seeded_builds_stay_inside_ranges() {
        let mut builder = WaveformBuilder::new(RandomSampler::seeded(5));
        for _ in 0..200 {
            let table = builder.build(&Range::new(20.0, 60.0), &Range::new(20.0, 140.0), 10.0, 4);
            for rows in table.segments().chunks_exact(2) {
                assert!((20.0..=60.0).contains(&rows[0].duration_ms));
                assert!((20.0..=140.0).contains(&rows[1].duration_ms));
                assert_eq!(rows[0].output_level, 10.0);
                assert_eq!(rows[1].output_level, 0.0);
            }
        }
    }

    #[test]
    fn summary_figures() {
        let mut builder = WaveformBuilder::new(FixedSequence::new(&[]));
        let table = builder.build(&Range::new(25.0, 25.0), &Range::new(75.0, 75.0), 50.0, 2);
        assert_eq!(table.used_len(), 4);
        assert_eq!(table.total_duration_ms(), 200.0);
        assert_eq!(table.on_time_ms(), 50.0);
        assert_eq!(table.duty_cycle(), 0.25);
        assert_eq!(WaveformTable::default().duty_cycle(), 0.0);
    }

    #[test]
    fn huge_durations_stay_finite() {
        assert_eq!(round_tenths(1e308), 1e308);
        assert_eq!(round_tenths(1e15 + 1.0), 1e15 + 1.0);
        assert_eq!(round_tenths(123_456.789), 123_456.8);

        let mut builder = WaveformBuilder::new(RandomSampler::seeded(3));
        let huge = Range::new(1e308, 1e308);
        let table = builder.build(&huge, &Range::new(20.0, 140.0), 10.0, 4);
        for rows in table.segments().chunks_exact(2) {
            assert_eq!(rows[0].duration_ms, 1e308);
            assert!(rows[1].duration_ms.is_finite());
        }
        // The plain sum overflows; the ratio must not.
        assert!(table.total_duration_ms().is_infinite());
        let duty = table.duty_cycle();
        assert!(duty.is_finite() && duty > 0.99 && duty <= 1.0, "duty {}", duty);

        let json = serde_json::to_string(&table).unwrap();
        assert!(!json.contains("null"), "{}", json);
    }

    #[test]
    fn generated_zero_pulses_are_not_padding() {
        let mut builder = WaveformBuilder::new(FixedSequence::new(&[]));
        let table = builder.build(&Range::new(0.0, 0.0), &Range::new(0.0, 0.0), 0.0, 2);
        assert!(table.segments().iter().all(Segment::is_padding));
        assert_eq!(table.used_len(), 4);
        assert_eq!(WaveformTable::default().used_len(), 0);
    }

    #[test]
    fn cell_edits_validate_and_reject_silently() {
        let mut table = WaveformTable::default();
        table.edit(6, SegmentField::OutputLevel, "80").unwrap();
        table.edit(6, SegmentField::Duration, "12.5").unwrap();
        assert_eq!(table.segments()[6], Segment::new(80.0, 12.5));
        assert_eq!(table.used_len(), 7);

        let before = table;
        assert!(table.edit(6, SegmentField::OutputLevel, "101").is_err());
        assert!(table.edit(6, SegmentField::Duration, "-1").is_err());
        assert_eq!(
            table.edit(8, SegmentField::Duration, "1"),
            Err(RejectedEdit::NoSuchSegment { index: 8 })
        );
        assert_eq!(table, before);
    }
}
