use crate::{Model, Msg};
use shared::FlowPhase;
use yew::prelude::*;

pub fn render_scanner_overlay(model: &Model, ctx: &Context<Model>) -> Html {
    if model.form.phase() != FlowPhase::Scanning {
        return html! {};
    }

    html! {
        <div class="scanner-overlay">
            <div class="scanner-dialog">
                <button
                    class="close-btn"
                    title="Close scanner"
                    onclick={ctx.link().callback(|_| Msg::CloseScanner)}
                >
                    <i class="fa-solid fa-xmark"></i>
                </button>
                <video ref={model.video_ref.clone()} class="scanner-video"></video>
            </div>
        </div>
    }
}
