use crate::{Model, Msg};
use yew::prelude::*;

/// Fixed bar with the scanned household id and the camera button.
pub fn render_top_bar(model: &Model, ctx: &Context<Model>) -> Html {
    let house_id = model
        .form
        .session()
        .map(|session| session.house_id().to_string())
        .unwrap_or_default();

    html! {
        <header class="top-bar">
            <input
                type="text"
                class="qr-field"
                placeholder="QR Code Data"
                value={house_id}
                readonly=true
            />
            <button
                class="scan-btn"
                title="Scan household QR code"
                disabled={model.form.is_submitting()}
                onclick={ctx.link().callback(|_| Msg::OpenScanner)}
            >
                <i class="fa-solid fa-camera"></i>
            </button>
        </header>
    }
}
