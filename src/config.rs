//! Front-end configuration constants.

// Waveform preview (SVG user units)
pub const CHART_WIDTH: f64 = 800.0;
pub const CHART_HEIGHT: f64 = 200.0;
pub const CHART_PADDING: f64 = 12.0;
/// Cap on drawn repetitions; the repeat count itself may go to 999.
pub const CHART_MAX_REPEATS: u32 = 16;

// Selector options
pub const OUTPUT_WAVEFORMS: [&str; 1] = [pulse_train::defaults::OUTPUT_WAVEFORM];

// Labels
pub const APP_TITLE: &str = "Advanced Pulse GUI";
pub const DURATION_UNIT: &str = "ms";
