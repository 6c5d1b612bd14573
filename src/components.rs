//! Yew view components for the pulse generator panel.
//!
//! Components only hold draft text; every value they show comes from the
//! session snapshot passed in through props.

use crate::config::{CHART_HEIGHT, CHART_WIDTH, DURATION_UNIT};
use crate::hooks::use_draft_input;
use crate::utils::{format_tenths, format_value, visible_rows, waveform_points};
use pulse_train::{Boundary, Parameter, RangeView, SegmentField, WaveformTable};
use yew::prelude::*;

/// One linked range: min / avg / max fields plus its lock toggle.
#[derive(Properties, PartialEq)]
pub struct RangeRowProps {
    pub parameter: Parameter,
    pub view: RangeView,
    pub on_commit: Callback<(Parameter, Boundary, String), bool>,
    pub on_lock: Callback<Parameter>,
}

#[function_component(RangeRow)]
pub fn range_row(props: &RangeRowProps) -> Html {
    let boundary_commit = |boundary: Boundary| {
        let on_commit = props.on_commit.clone();
        let parameter = props.parameter;
        Callback::from(move |text: String| on_commit.emit((parameter, boundary, text)))
    };
    let min = use_draft_input(format_value(props.view.min), boundary_commit(Boundary::Min));
    let max = use_draft_input(format_value(props.view.max), boundary_commit(Boundary::Max));

    let locked = props.view.locked;
    let on_lock = {
        let on_lock = props.on_lock.clone();
        let parameter = props.parameter;
        Callback::from(move |_: MouseEvent| on_lock.emit(parameter))
    };
    let id = props.parameter.as_str();

    html! {
        <div class={classes!("range-row", locked.then_some("locked"))}>
            <label for={format!("{}-min", id)}>{ format!("{}:", props.parameter.label()) }</label>
            <input
                type="text"
                id={format!("{}-min", id)}
                placeholder="Min"
                readonly={locked}
                value={min.text.clone()}
                oninput={min.on_text_input.clone()}
                onblur={min.on_commit.reform(|_: FocusEvent| ())}
                onkeydown={min.on_keydown.clone()}
            />
            <input
                type="text"
                class="range-avg"
                readonly=true
                value={format_tenths(props.view.avg)}
            />
            <input
                type="text"
                id={format!("{}-max", id)}
                placeholder="Max"
                readonly={locked}
                value={max.text.clone()}
                oninput={max.on_text_input.clone()}
                onblur={max.on_commit.reform(|_: FocusEvent| ())}
                onkeydown={max.on_keydown.clone()}
            />
            <span class="unit">{ DURATION_UNIT }</span>
            <button
                class={classes!("lock-toggle", locked.then_some("active"))}
                title={if locked { "Locked" } else { "Lock this parameter" }}
                onclick={on_lock}
            >
                { if locked { "🔒" } else { "🔓" } }
            </button>
        </div>
    }
}

/// A single scalar setting with an optional "Max" button.
#[derive(Properties, PartialEq)]
pub struct ScalarFieldProps {
    pub id: &'static str,
    pub label: &'static str,
    pub committed: String,
    pub on_commit: Callback<String, bool>,
    #[prop_or_default]
    pub unit: Option<&'static str>,
    #[prop_or_default]
    pub on_max: Option<Callback<()>>,
}

#[function_component(ScalarField)]
pub fn scalar_field(props: &ScalarFieldProps) -> Html {
    let draft = use_draft_input(props.committed.clone(), props.on_commit.clone());

    html! {
        <div class="form-group">
            <label for={props.id}>{ props.label }</label>
            <input
                type="text"
                id={props.id}
                value={draft.text.clone()}
                oninput={draft.on_text_input.clone()}
                onblur={draft.on_commit.reform(|_: FocusEvent| ())}
                onkeydown={draft.on_keydown.clone()}
            />
            if let Some(unit) = props.unit {
                <span class="unit">{ unit }</span>
            }
            if let Some(on_max) = &props.on_max {
                <button class="btn-secondary small" onclick={on_max.reform(|_: MouseEvent| ())}>
                    { "Max" }
                </button>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SegmentCellProps {
    pub index: usize,
    pub field: SegmentField,
    pub committed: String,
    pub on_edit: Callback<(usize, SegmentField, String), bool>,
}

#[function_component(SegmentCell)]
fn segment_cell(props: &SegmentCellProps) -> Html {
    let commit = {
        let on_edit = props.on_edit.clone();
        let (index, field) = (props.index, props.field);
        Callback::from(move |text: String| on_edit.emit((index, field, text)))
    };
    let draft = use_draft_input(props.committed.clone(), commit);

    html! {
        <td>
            <input
                type="text"
                value={draft.text.clone()}
                oninput={draft.on_text_input.clone()}
                onblur={draft.on_commit.reform(|_: FocusEvent| ())}
                onkeydown={draft.on_keydown.clone()}
            />
        </td>
    }
}

/// The eight-row waveform definition table.
#[derive(Properties, PartialEq)]
pub struct WaveformTableViewProps {
    pub table: WaveformTable,
    pub show_all: bool,
    pub on_edit: Callback<(usize, SegmentField, String), bool>,
}

#[function_component(WaveformTableView)]
pub fn waveform_table_view(props: &WaveformTableViewProps) -> Html {
    let rows = visible_rows(&props.table, props.show_all);

    if rows == 0 {
        return html! {
            <div class="waveform-table">
                <p class="no-results-message">{ "No segments to display" }</p>
            </div>
        };
    }

    html! {
        <div class="waveform-table">
            <table>
                <thead>
                    <tr>
                        <th>{ "#" }</th>
                        <th>{ "Output (%)" }</th>
                        <th>{ format!("Time Span ({})", DURATION_UNIT) }</th>
                    </tr>
                </thead>
                <tbody>
                    { props.table.iter().take(rows).enumerate().map(|(index, segment)| html! {
                        <tr key={index}>
                            <td>{ index + 1 }</td>
                            <SegmentCell
                                index={index}
                                field={SegmentField::OutputLevel}
                                committed={format_value(segment.output_level)}
                                on_edit={props.on_edit.clone()}
                            />
                            <SegmentCell
                                index={index}
                                field={SegmentField::Duration}
                                committed={format_tenths(segment.duration_ms)}
                                on_edit={props.on_edit.clone()}
                            />
                        </tr>
                    }).collect::<Html>() }
                </tbody>
            </table>
            <div class="table-summary">
                { format!(
                    "Cycle: {} {}, duty cycle {:.1}%",
                    format_tenths(props.table.total_duration_ms()),
                    DURATION_UNIT,
                    props.table.duty_cycle() * 100.0
                ) }
            </div>
        </div>
    }
}

/// Step plot of the table, repeated after the initial delay.
#[derive(Properties, PartialEq)]
pub struct WaveformChartProps {
    pub table: WaveformTable,
    pub initial_delay_ms: f64,
    pub repeat_count: u32,
}

#[function_component(WaveformChart)]
pub fn waveform_chart(props: &WaveformChartProps) -> Html {
    let points = waveform_points(&props.table, props.initial_delay_ms, props.repeat_count);

    html! {
        <div class="chart-section">
            <svg
                viewBox={format!("0 0 {} {}", CHART_WIDTH, CHART_HEIGHT)}
                preserveAspectRatio="none"
                class="waveform-chart"
            >
                <polyline points={points} fill="none" stroke="currentColor" stroke-width="2" />
            </svg>
        </div>
    }
}
