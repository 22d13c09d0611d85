use super::utils::first_image_file;
use crate::{Model, Msg};
use web_sys::HtmlInputElement;
use yew::prelude::*;

/// One capture slot: the photo preview and its upload control.
pub fn render_slot(model: &Model, ctx: &Context<Model>, index: usize) -> Html {
    let enabled = model.form.uploads_enabled();
    let slot = &model.form.slots()[index];

    let handle_change = ctx.link().callback(move |e: Event| {
        let input: HtmlInputElement = e.target_unchecked_into();
        let file = input.files().as_ref().and_then(first_image_file);
        input.set_value("");

        match file {
            Some(file) => Msg::ImageSelected(index, file),
            None => Msg::SetError(Some("No valid image file selected.".into())),
        }
    });

    html! {
        <div class="capture-slot" key={index.to_string()}>
            <div class="slot-preview">
                {
                    match &slot.image {
                        Some(image) => html! {
                            <img
                                src={image.preview_url.to_string()}
                                alt={format!("Uploaded {}", index + 1)}
                            />
                        },
                        None => html! { <i class="fa-solid fa-upload placeholder-icon"></i> },
                    }
                }
            </div>
            <label class={classes!("slot-upload", (!enabled).then_some("disabled"))}>
                <input
                    type="file"
                    class="hidden-input"
                    accept="image/*"
                    capture="environment"
                    disabled={!enabled}
                    onchange={handle_change}
                />
                <span class="upload-btn">{"Upload"}</span>
            </label>
        </div>
    }
}
