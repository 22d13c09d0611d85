use super::utils::debounce;
use crate::{Model, Msg, SlotImage};
use shared::{CaptureSlot, SlotStatus};
use yew::prelude::*;

pub fn render_results(model: &Model, ctx: &Context<Model>) -> Html {
    let link = ctx.link().clone();

    html! {
        <div class="results-container">
            {
                for model.form.slots().iter().enumerate()
                    .filter(|(_, slot)| slot.image.is_some())
                    .map(|(index, slot)| render_result_item(ctx, index, slot))
            }
            <div class="button-container">
                <button
                    class="clear-btn"
                    disabled={model.form.is_submitting()}
                    onclick={link.callback(|_| Msg::ResetForm)}
                >
                    <i class="fa-solid fa-rotate-left"></i>{" Retake"}
                </button>
                <button
                    class="submit-btn"
                    disabled={model.form.is_submitting()}
                    onclick={debounce(300, {
                        let link = link.clone();
                        move || link.send_message(Msg::SubmitResults)
                    })}
                >
                    {
                        if model.form.is_submitting() {
                            html! { <><i class="fa-solid fa-spinner fa-spin"></i>{" Submitting..."}</> }
                        } else {
                            html! { <>{"Submit Results"}</> }
                        }
                    }
                </button>
            </div>
        </div>
    }
}

fn render_result_item(ctx: &Context<Model>, index: usize, slot: &CaptureSlot<SlotImage>) -> Html {
    let link = ctx.link();
    let heading = match slot.status {
        Some(status) => format!("Status: {}", status),
        None => "No Prediction".to_string(),
    };

    html! {
        <div class="result-item" key={index.to_string()}>
            {
                if let Some(image) = &slot.image {
                    html! {
                        <img
                            src={image.preview_url.to_string()}
                            alt={format!("Result {}", index + 1)}
                        />
                    }
                } else {
                    html! {}
                }
            }
            <div class="result-body">
                <h3 class={classes!(slot.status.map(|s| s.as_ref().to_lowercase()))}>{ heading }</h3>
                {
                    if slot.needs_manual_choice() {
                        html! {
                            <div class="manual-choice">
                                <button
                                    class="segregated-btn"
                                    onclick={link.callback(move |_| Msg::ManualStatus(index, SlotStatus::Segregated))}
                                >
                                    <i class="fa-solid fa-check"></i>{" Segregated"}
                                </button>
                                <button
                                    class="mixed-btn"
                                    onclick={link.callback(move |_| Msg::ManualStatus(index, SlotStatus::Mixed))}
                                >
                                    <i class="fa-solid fa-xmark"></i>{" Mixed"}
                                </button>
                            </div>
                        }
                    } else {
                        html! {}
                    }
                }
            </div>
        </div>
    }
}
