//! The generator panel's authoritative parameter model.
//!
//! A [`GeneratorSession`] accepts raw text edits from the input surface,
//! keeps the timing ranges consistent through a [`ConstraintEngine`], and
//! rebuilds the [`WaveformTable`] after every edit that changes what the table
//! is built from. Display code reads it back through [`DisplaySnapshot`].

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::defaults;
use crate::engine::{ConstraintEngine, PulseTiming};
use crate::input;
use crate::sampler::{Distribution, RandomSampler};
use crate::waveform::{SegmentField, WaveformBuilder, WaveformTable};
use crate::{Boundary, Parameter, Range, RejectedEdit};

/// Output mode of the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WaveformType {
    #[default]
    Analog,
    Digital,
}

impl WaveformType {
    pub const ALL: [WaveformType; 2] = [WaveformType::Analog, WaveformType::Digital];

    pub fn label(self) -> &'static str {
        match self {
            WaveformType::Analog => "Analog",
            WaveformType::Digital => "Digital",
        }
    }
}

impl fmt::Display for WaveformType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WaveformType {
    type Err = RejectedEdit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WaveformType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RejectedEdit::UnknownName {
                input: s.to_string(),
            })
    }
}

/// One range as the display shows it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeView {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
    pub locked: bool,
}

impl RangeView {
    fn new(range: Range, locked: bool) -> Self {
        Self {
            min: range.min,
            avg: range.avg(),
            max: range.max,
            locked,
        }
    }
}

/// Everything the display renders, copied out of the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub period: RangeView,
    pub pulse_width: RangeView,
    pub interval: RangeView,
    pub locked: Parameter,
    pub amplitude: f64,
    pub initial_delay_ms: f64,
    pub pulse_count: u32,
    pub repeat_count: u32,
    pub distribution: Distribution,
    pub waveform_type: WaveformType,
    pub light_source: String,
    pub work_mode: String,
    pub output_waveform: String,
    pub running: bool,
    pub seed: u64,
    pub table: WaveformTable,
}

impl DisplaySnapshot {
    pub fn range(&self, parameter: Parameter) -> &RangeView {
        match parameter {
            Parameter::Period => &self.period,
            Parameter::PulseWidth => &self.pulse_width,
            Parameter::Interval => &self.interval,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Single-owner state of one generator panel.
///
/// Every fallible operation is all-or-nothing: on `Err` no field changes and
/// the table is not rebuilt.
#[derive(Debug, Clone)]
pub struct GeneratorSession {
    engine: ConstraintEngine,
    builder: WaveformBuilder<RandomSampler>,
    table: WaveformTable,
    amplitude: f64,
    initial_delay_ms: f64,
    pulse_count: u32,
    repeat_count: u32,
    waveform_type: WaveformType,
    light_source: String,
    work_mode: String,
    output_waveform: String,
    running: bool,
}

impl GeneratorSession {
    /// Start from the panel defaults with the given sampler and build the
    /// first table.
    pub fn new(sampler: RandomSampler) -> Self {
        let mut session = Self {
            engine: ConstraintEngine::default(),
            builder: WaveformBuilder::new(sampler),
            table: WaveformTable::default(),
            amplitude: defaults::AMPLITUDE,
            initial_delay_ms: defaults::INITIAL_DELAY_MS,
            pulse_count: defaults::PULSE_COUNT,
            repeat_count: defaults::REPEAT_COUNT,
            waveform_type: WaveformType::default(),
            light_source: String::new(),
            work_mode: String::new(),
            output_waveform: defaults::OUTPUT_WAVEFORM.to_string(),
            running: false,
        };
        session.rebuild();
        session
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(RandomSampler::seeded(seed))
    }

    /// Replace the timing ranges wholesale and rebuild.
    pub fn with_timing(mut self, timing: PulseTiming) -> Self {
        self.engine = ConstraintEngine::new(timing);
        self.rebuild();
        self
    }

    pub fn timing(&self) -> &PulseTiming {
        self.engine.timing()
    }

    pub fn table(&self) -> &WaveformTable {
        &self.table
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn initial_delay_ms(&self) -> f64 {
        self.initial_delay_ms
    }

    pub fn pulse_count(&self) -> u32 {
        self.pulse_count
    }

    pub fn repeat_count(&self) -> u32 {
        self.repeat_count
    }

    pub fn distribution(&self) -> Distribution {
        self.builder.sampler().distribution()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Resample the table from the current parameters.
    pub fn regenerate(&mut self) {
        self.rebuild();
    }

    fn rebuild(&mut self) {
        let timing = *self.engine.timing();
        self.table = self.builder.build(
            &timing.pulse_width(),
            &timing.interval(),
            self.amplitude,
            self.pulse_count,
        );
    }

    pub fn edit_range(
        &mut self,
        parameter: Parameter,
        boundary: Boundary,
        raw: &str,
    ) -> Result<(), RejectedEdit> {
        self.engine.edit(parameter, boundary, raw)?;
        self.rebuild();
        Ok(())
    }

    /// Ranges don't change, so the table is kept.
    pub fn set_lock(&mut self, parameter: Parameter) {
        self.engine.set_lock(parameter);
    }

    pub fn set_amplitude(&mut self, raw: &str) -> Result<(), RejectedEdit> {
        self.amplitude = input::parse_bounded(
            raw,
            "Amplitude",
            defaults::MIN_AMPLITUDE,
            defaults::MAX_AMPLITUDE,
        )?;
        debug!("Amplitude set to {}", self.amplitude);
        self.rebuild();
        Ok(())
    }

    pub fn set_pulse_count(&mut self, raw: &str) -> Result<(), RejectedEdit> {
        let count = input::parse_count(raw, "Pulse count", 1, defaults::MAX_PULSE_COUNT)?;
        self.apply_pulse_count(count);
        Ok(())
    }

    pub fn max_pulse_count(&mut self) {
        self.apply_pulse_count(defaults::MAX_PULSE_COUNT);
    }

    fn apply_pulse_count(&mut self, count: u32) {
        debug!("Pulse count set to {}", count);
        self.pulse_count = count;
        self.rebuild();
    }

    pub fn set_initial_delay(&mut self, raw: &str) -> Result<(), RejectedEdit> {
        self.initial_delay_ms = input::parse_non_negative(raw)?;
        debug!("Initial delay set to {} ms", self.initial_delay_ms);
        Ok(())
    }

    pub fn set_repeat_count(&mut self, raw: &str) -> Result<(), RejectedEdit> {
        self.repeat_count =
            input::parse_count(raw, "Repeat count", 1, defaults::MAX_REPEAT_COUNT)?;
        debug!("Repeat count set to {}", self.repeat_count);
        Ok(())
    }

    pub fn max_repeat_count(&mut self) {
        self.repeat_count = defaults::MAX_REPEAT_COUNT;
    }

    pub fn set_distribution(&mut self, distribution: Distribution) {
        info!("Sampling distribution set to {}", distribution);
        self.builder.sampler_mut().set_distribution(distribution);
        self.rebuild();
    }

    pub fn set_waveform_type(&mut self, waveform_type: WaveformType) {
        self.waveform_type = waveform_type;
    }

    pub fn set_light_source(&mut self, text: &str) {
        self.light_source = text.to_string();
    }

    pub fn set_work_mode(&mut self, text: &str) {
        self.work_mode = text.to_string();
    }

    pub fn set_output_waveform(&mut self, text: &str) {
        self.output_waveform = text.to_string();
    }

    /// Flip the Start/Stop state and return the new one.
    pub fn toggle_running(&mut self) -> bool {
        self.running = !self.running;
        info!("Generator {}", if self.running { "started" } else { "stopped" });
        self.running
    }

    /// Hand-edit one table cell. The table is not rebuilt afterwards.
    pub fn edit_segment(
        &mut self,
        index: usize,
        field: SegmentField,
        raw: &str,
    ) -> Result<(), RejectedEdit> {
        self.table.edit(index, field, raw)
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        let timing = self.engine.timing();
        let view = |p: Parameter| RangeView::new(timing.range(p), timing.locked() == p);
        DisplaySnapshot {
            period: view(Parameter::Period),
            pulse_width: view(Parameter::PulseWidth),
            interval: view(Parameter::Interval),
            locked: timing.locked(),
            amplitude: self.amplitude,
            initial_delay_ms: self.initial_delay_ms,
            pulse_count: self.pulse_count,
            repeat_count: self.repeat_count,
            distribution: self.distribution(),
            waveform_type: self.waveform_type,
            light_source: self.light_source.clone(),
            work_mode: self.work_mode.clone(),
            output_waveform: self.output_waveform.clone(),
            running: self.running,
            seed: self.builder.sampler().seed(),
            table: self.table,
        }
    }
}

impl Default for GeneratorSession {
    fn default() -> Self {
        Self::new(RandomSampler::from_entropy())
    }
}
