use super::preview_area::render_slot;
use super::utils::debounce;
use crate::{Model, Msg};
use shared::{FlowPhase, SLOT_COUNT};
use yew::prelude::*;

pub fn render_upload_section(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link().clone();
    let classifying = model.form.phase() == FlowPhase::Classifying;
    let can_submit = model.form.uploads_enabled() && !classifying;

    html! {
        <div class="upload-section">
            <div class="slot-grid">
                { for (0..SLOT_COUNT).map(|index| render_slot(model, ctx, index)) }
            </div>
            <div class="button-container">
                <button
                    class="clear-btn"
                    disabled={!model.form.has_images() || classifying}
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::ResetForm)
                    })}
                >
                    <i class="fa-solid fa-trash"></i>{" Clear"}
                </button>
                <button
                    class="submit-btn"
                    disabled={!can_submit}
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::Classify)
                    })}
                >
                    {
                        if classifying {
                            html! { <><i class="fa-solid fa-spinner fa-spin"></i>{" Analyzing..."}</> }
                        } else {
                            html! { <>{"Submit"}</> }
                        }
                    }
                </button>
            </div>
        </div>
    }
}
