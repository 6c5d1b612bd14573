use crate::config::{CHART_HEIGHT, CHART_MAX_REPEATS, CHART_PADDING, CHART_WIDTH};
use pulse_train::defaults::{MAX_AMPLITUDE, TABLE_SIZE};
use pulse_train::WaveformTable;

/// Decimals kept when showing a committed value.
const DISPLAY_DECIMALS: usize = 6;

/// Committed value as shown in an input field ("40", "12.5").
///
/// Subtraction noise such as `19.900000000000002` is trimmed away; the
/// session keeps full precision.
pub fn format_value(value: f64) -> String {
    let fixed = format!("{:.*}", DISPLAY_DECIMALS, value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" => "0".to_string(),
        _ => trimmed.to_string(),
    }
}

/// Averages and durations are shown with one decimal.
pub fn format_tenths(value: f64) -> String {
    format!("{:.1}", value)
}

/// Rows the table shows: all eight, or only up to the last used one.
pub fn visible_rows(table: &WaveformTable, show_all: bool) -> usize {
    if show_all {
        TABLE_SIZE
    } else {
        table.used_len()
    }
}

/// Step-plot vertices for an SVG `<polyline>`.
///
/// Time runs left to right over the initial delay followed by `repeats`
/// copies of the table; output level maps 0-100 to bottom-top. Repeats are
/// capped at [`CHART_MAX_REPEATS`] to keep the plot readable.
pub fn waveform_points(table: &WaveformTable, initial_delay_ms: f64, repeats: u32) -> String {
    let repeats = repeats.clamp(1, CHART_MAX_REPEATS);
    // Times are plotted in units of the longest span so sums stay finite.
    let unit = table
        .iter()
        .map(|s| s.duration_ms)
        .fold(initial_delay_ms, f64::max);
    let unit = if unit > 0.0 && unit.is_finite() { unit } else { 1.0 };
    let cycle_ms: f64 = table.iter().map(|s| s.duration_ms / unit).sum();
    let total_ms = initial_delay_ms / unit + cycle_ms * f64::from(repeats);

    let plot_width = CHART_WIDTH - 2.0 * CHART_PADDING;
    let plot_height = CHART_HEIGHT - 2.0 * CHART_PADDING;
    let x_at = |t: f64| {
        if total_ms > 0.0 {
            CHART_PADDING + t / total_ms * plot_width
        } else {
            CHART_PADDING
        }
    };
    let y_at = |level: f64| CHART_PADDING + (1.0 - level.clamp(0.0, MAX_AMPLITUDE) / MAX_AMPLITUDE) * plot_height;

    let mut points = vec![(x_at(0.0), y_at(0.0))];
    let mut t = initial_delay_ms / unit;
    let mut level = 0.0;
    points.push((x_at(t), y_at(level)));

    if cycle_ms > 0.0 {
        for _ in 0..repeats {
            for segment in table.iter().filter(|s| s.duration_ms > 0.0) {
                if segment.output_level != level {
                    level = segment.output_level;
                    points.push((x_at(t), y_at(level)));
                }
                t += segment.duration_ms / unit;
                points.push((x_at(t), y_at(level)));
            }
        }
    }
    if level != 0.0 {
        points.push((x_at(t), y_at(0.0)));
    }
    if total_ms <= 0.0 {
        points.push((CHART_WIDTH - CHART_PADDING, y_at(0.0)));
    }

    points
        .iter()
        .map(|(x, y)| format!("{:.1},{:.1}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}
