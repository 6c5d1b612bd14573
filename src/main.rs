//! Front-end for the pulse generator panel using Yew.
//! Holds the single session, wires input callbacks to it and renders snapshots.

use log::{debug, info};
use pulse_train::{
    Boundary, Distribution, GeneratorSession, Parameter, RejectedEdit, SegmentField, WaveformType,
};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

mod components;
mod config;
mod hooks;
mod utils;

use components::{RangeRow, ScalarField, WaveformChart, WaveformTableView};
use config::*;
use utils::format_value;

type SharedSession = Rc<RefCell<GeneratorSession>>;

// ──────────────────────────────────────────────────────────────────────────────
// Helper functions

/// Bump the snapshot version so the panel re-renders.
fn update_version(version: &UseStateHandle<usize>) {
    version.set(version.wrapping_add(1));
}

/// Report whether an edit was accepted, refreshing the panel if it was.
fn commit_outcome(result: Result<(), RejectedEdit>, version: &UseStateHandle<usize>) -> bool {
    match result {
        Ok(()) => {
            update_version(version);
            true
        }
        Err(e) => {
            debug!("Edit refused: {}", e);
            false
        }
    }
}

/// Callback for a raw-text setting: runs `apply` against the session.
fn text_commit<F>(session: &SharedSession, version: &UseStateHandle<usize>, apply: F) -> Callback<String, bool>
where
    F: Fn(&mut GeneratorSession, &str) -> Result<(), RejectedEdit> + 'static,
{
    let session = session.clone();
    let version = version.clone();
    Callback::from(move |text: String| {
        let result = apply(&mut session.borrow_mut(), &text);
        commit_outcome(result, &version)
    })
}

/// Callback for an infallible session action.
fn action<IN, F>(session: &SharedSession, version: &UseStateHandle<usize>, apply: F) -> Callback<IN>
where
    IN: 'static,
    F: Fn(&mut GeneratorSession, IN) + 'static,
{
    let session = session.clone();
    let version = version.clone();
    Callback::from(move |input: IN| {
        apply(&mut session.borrow_mut(), input);
        update_version(&version);
    })
}

// ──────────────────────────────────────────────────────────────────────────────

/// Primary application component wiring session state and UI elements.
#[function_component(App)]
fn app() -> Html {
    let session: SharedSession = use_mut_ref(|| {
        let seed = js_sys::Date::now() as u64;
        info!("Starting generator session with seed {}", seed);
        GeneratorSession::seeded(seed)
    });
    let version = use_state(|| 0usize);
    let show_all = use_state(|| false);

    let snapshot = session.borrow().snapshot();

    {
        let session = session.clone();
        use_effect_with(*version, move |_| {
            debug!("Panel state: {}", session.borrow().snapshot().to_json());
            || ()
        });
    }

    let on_range_commit = {
        let session = session.clone();
        let version = version.clone();
        Callback::from(move |(parameter, boundary, text): (Parameter, Boundary, String)| {
            let result = session.borrow_mut().edit_range(parameter, boundary, &text);
            commit_outcome(result, &version)
        })
    };
    let on_segment_edit = {
        let session = session.clone();
        let version = version.clone();
        Callback::from(move |(index, field, text): (usize, SegmentField, String)| {
            let result = session.borrow_mut().edit_segment(index, field, &text);
            commit_outcome(result, &version)
        })
    };

    let on_lock = action(&session, &version, |s, parameter: Parameter| s.set_lock(parameter));
    let on_toggle_running = action(&session, &version, |s, _: MouseEvent| {
        s.toggle_running();
    });
    let on_regenerate = action(&session, &version, |s, _: MouseEvent| s.regenerate());
    let on_max_pulse_count = action(&session, &version, |s, _: ()| s.max_pulse_count());
    let on_max_repeat_count = action(&session, &version, |s, _: ()| s.max_repeat_count());

    let on_light_source = action(&session, &version, |s, e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        s.set_light_source(&input.value());
    });
    let on_work_mode = action(&session, &version, |s, e: InputEvent| {
        let input: HtmlInputElement = e.target_unchecked_into();
        s.set_work_mode(&input.value());
    });
    let on_waveform_type = action(&session, &version, |s, e: Event| {
        let select: HtmlSelectElement = e.target_unchecked_into();
        if let Ok(waveform_type) = select.value().parse::<WaveformType>() {
            s.set_waveform_type(waveform_type);
        }
    });
    let on_output_waveform = action(&session, &version, |s, e: Event| {
        let select: HtmlSelectElement = e.target_unchecked_into();
        s.set_output_waveform(&select.value());
    });
    let on_distribution = action(&session, &version, |s, e: Event| {
        let select: HtmlSelectElement = e.target_unchecked_into();
        if let Ok(distribution) = select.value().parse::<Distribution>() {
            s.set_distribution(distribution);
        }
    });
    let on_show_all = {
        let show_all = show_all.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            show_all.set(input.checked());
        })
    };

    html! {
        <div class="container">
            <h1>{ APP_TITLE }</h1>

            // Top Control Bar section - light source, work mode, run state
            <div class="top-controls">
                <div class="form-group">
                    <label for="light_source">{ "Light Source:" }</label>
                    <input
                        type="text"
                        id="light_source"
                        placeholder="Enter light source"
                        value={snapshot.light_source.clone()}
                        oninput={on_light_source}
                    />
                </div>
                <div class="form-group">
                    <label for="work_mode">{ "Work Mode:" }</label>
                    <input
                        type="text"
                        id="work_mode"
                        placeholder="Enter work mode"
                        value={snapshot.work_mode.clone()}
                        oninput={on_work_mode}
                    />
                </div>
                <button
                    class={classes!("btn-primary", snapshot.running.then_some("running"))}
                    onclick={on_toggle_running}
                >
                    { if snapshot.running { "Stop" } else { "Start" } }
                </button>
                <span class={classes!("run-status", snapshot.running.then_some("on"))}>
                    { if snapshot.running { "On" } else { "Off" } }
                </span>
            </div>

            // Waveform selection
            <div class="waveform-settings">
                <div class="form-group">
                    <label for="waveform_type">{ "Waveform Type:" }</label>
                    <select id="waveform_type" onchange={on_waveform_type}>
                        { for WaveformType::ALL.iter().map(|t| html! {
                            <option value={t.label()} selected={*t == snapshot.waveform_type}>{ t.label() }</option>
                        }) }
                    </select>
                </div>
                <div class="form-group">
                    <label for="output_waveform">{ "Output Waveform:" }</label>
                    <select id="output_waveform" onchange={on_output_waveform}>
                        { for OUTPUT_WAVEFORMS.iter().map(|name| html! {
                            <option value={*name} selected={*name == snapshot.output_waveform}>{ *name }</option>
                        }) }
                    </select>
                </div>
                <div class="form-group">
                    <label for="distribution">{ "Distribution:" }</label>
                    <select id="distribution" onchange={on_distribution}>
                        { for Distribution::ALL.iter().map(|d| html! {
                            <option value={d.label()} selected={*d == snapshot.distribution}>{ d.label() }</option>
                        }) }
                    </select>
                </div>
            </div>

            // Pulse parameters
            <div class="pulse-parameters">
                <ScalarField
                    id="amplitude"
                    label="Amplitude:"
                    committed={format_value(snapshot.amplitude)}
                    on_commit={text_commit(&session, &version, |s, raw| s.set_amplitude(raw))}
                    unit={Some("%")}
                />
                <ScalarField
                    id="initial_delay"
                    label="Initial Delay:"
                    committed={format_value(snapshot.initial_delay_ms)}
                    on_commit={text_commit(&session, &version, |s, raw| s.set_initial_delay(raw))}
                    unit={Some(DURATION_UNIT)}
                />
                { for Parameter::ALL.iter().map(|&parameter| html! {
                    <RangeRow
                        key={parameter.as_str()}
                        parameter={parameter}
                        view={*snapshot.range(parameter)}
                        on_commit={on_range_commit.clone()}
                        on_lock={on_lock.clone()}
                    />
                }) }
                <ScalarField
                    id="pulse_count"
                    label="Pulse Count:"
                    committed={snapshot.pulse_count.to_string()}
                    on_commit={text_commit(&session, &version, |s, raw| s.set_pulse_count(raw))}
                    on_max={Some(on_max_pulse_count)}
                />
            </div>

            // Display area
            <WaveformChart
                table={snapshot.table}
                initial_delay_ms={snapshot.initial_delay_ms}
                repeat_count={snapshot.repeat_count}
            />

            // Repeat count & show all
            <div class="table-controls">
                <ScalarField
                    id="repeat_count"
                    label="Waveform Repeat Count:"
                    committed={snapshot.repeat_count.to_string()}
                    on_commit={text_commit(&session, &version, |s, raw| s.set_repeat_count(raw))}
                    on_max={Some(on_max_repeat_count)}
                />
                <label class="checkbox">
                    <input type="checkbox" checked={*show_all} onchange={on_show_all} />
                    { "Show All" }
                </label>
                <button class="btn-secondary" onclick={on_regenerate}>{ "Update" }</button>
            </div>

            <WaveformTableView
                table={snapshot.table}
                show_all={*show_all}
                on_edit={on_segment_edit}
            />

            <div class="session-info">{ format!("Seed: {}", snapshot.seed) }</div>
        </div>
    }
}

/// Entry point: installs logging and renders the App component.
fn main() {
    console_error_panic_hook::set_once();
    // Fails only if a logger is already installed.
    let _ = console_log::init_with_level(log::Level::Debug);
    yew::Renderer::<App>::new().render();
}
