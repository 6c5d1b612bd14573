use log::debug;
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// Draft text of one input field, kept apart from the committed value.
#[derive(Clone)]
pub struct DraftInput {
    /// What the field currently shows.
    pub text: String,
    /// Callback for the field's `oninput`. Only touches the draft.
    pub on_text_input: Callback<InputEvent>,
    /// Offer the draft to the session; reverts the draft if it is refused.
    pub on_commit: Callback<()>,
    /// `onkeydown` handler that commits on Enter.
    pub on_keydown: Callback<KeyboardEvent>,
}

/// Custom hook for a field whose value lives in the session.
///
/// `committed` is the session's current value, formatted for display.
/// `commit` receives the draft text and returns whether it was accepted.
/// After every commit the draft snaps back to canonical text: the old
/// `committed` on refusal, the new one on acceptance.
#[hook]
pub fn use_draft_input(committed: String, commit: Callback<String, bool>) -> DraftInput {
    let text_handle = use_state(|| committed.clone());

    let on_text_input = {
        let text_setter = text_handle.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            text_setter.set(input.value());
        })
    };

    let on_commit = {
        let text_handle = text_handle.clone();
        let committed = committed.clone();
        Callback::from(move |_| {
            let draft = (*text_handle).clone();
            if !commit.emit(draft.clone()) {
                debug!("Reverting draft {:?} to {:?}", draft, committed);
            }
            // An accepted draft whose value did not change ("40ms" for 40)
            // settles here; a changed value arrives through the effect below.
            text_handle.set(committed.clone());
        })
    };

    let on_keydown = {
        let commit_handler = on_commit.clone();
        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Enter" {
                commit_handler.emit(());
            }
        })
    };

    // Follow the committed value when it changes, including derived updates
    // caused by edits to other fields.
    {
        let text_setter = text_handle.clone();
        use_effect_with(committed, move |current| {
            text_setter.set(current.clone());
            || ()
        });
    }

    DraftInput {
        text: (*text_handle).clone(),
        on_text_input,
        on_commit,
        on_keydown,
    }
}
