mod api;
mod components;
mod scanner;

use components::handlers;
use components::header::render_top_bar;
use components::results::render_results;
use components::scanner_overlay::render_scanner_overlay;
use components::upload_section::render_upload_section;
use components::utils::{render_error_message, render_notice};
use gloo_file::{File as GlooFile, ObjectUrl};
use scanner::Scanner;
use shared::{ClassifierConfig, Prediction, ReportForm, SlotStatus, SubmitResultsResponse};
use web_sys::HtmlVideoElement;
use yew::prelude::*;

/// A photo chosen for one slot.
#[derive(Clone)]
pub struct SlotImage {
    pub file: GlooFile,
    pub preview_url: ObjectUrl,
}

pub enum Msg {
    ClassifierConfigLoaded(ClassifierConfig),

    // Scanner
    OpenScanner,
    CloseScanner,
    QrDecoded(String),
    QrDecodeError(String),

    // Capture
    ImageSelected(usize, GlooFile),
    ResetForm,
    Classify,
    ClassificationDone(Vec<Option<Vec<Prediction>>>),
    ClassificationFailed(String),

    // Review
    ManualStatus(usize, SlotStatus),
    SubmitResults,
    SubmissionDone(SubmitResultsResponse),
    SubmissionFailed(String),

    SetError(Option<String>),
}

pub struct Model {
    pub form: ReportForm<SlotImage>,
    pub classifier: Option<ClassifierConfig>,
    pub scanner: Option<Scanner>,
    pub video_ref: NodeRef,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl Component for Model {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        handlers::load_classifier_config(ctx);

        Self {
            form: handlers::restore_form(),
            classifier: None,
            scanner: None,
            video_ref: NodeRef::default(),
            error: None,
            notice: None,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::ClassifierConfigLoaded(config) => {
                self.classifier = Some(config);
                false
            }

            Msg::OpenScanner => handlers::handle_open_scanner(self),
            Msg::CloseScanner => handlers::handle_close_scanner(self),
            Msg::QrDecoded(payload) => handlers::handle_qr_decoded(self, &payload),
            Msg::QrDecodeError(error) => handlers::handle_qr_decode_error(self, &error),

            Msg::ImageSelected(index, file) => handlers::handle_image_selected(self, index, file),
            Msg::ResetForm => handlers::handle_reset(self),
            Msg::Classify => handlers::handle_classify(self, ctx),
            Msg::ClassificationDone(outputs) => handlers::handle_classification_done(self, outputs),
            Msg::ClassificationFailed(error) => {
                handlers::handle_classification_failed(self, &error)
            }

            Msg::ManualStatus(index, status) => {
                handlers::handle_manual_status(self, index, status)
            }
            Msg::SubmitResults => handlers::handle_submit_results(self, ctx),
            Msg::SubmissionDone(response) => handlers::handle_submission_done(self, response),
            Msg::SubmissionFailed(error) => handlers::handle_submission_failed(self, &error),

            Msg::SetError(error) => {
                self.error = error;
                true
            }
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, _first_render: bool) {
        if !handlers::scanner_requested(self) {
            self.scanner = None;
            return;
        }
        if self.scanner.is_some() {
            return;
        }
        let Some(video) = self.video_ref.cast::<HtmlVideoElement>() else {
            return;
        };

        let link = ctx.link();
        match Scanner::start(
            &video,
            link.callback(Msg::QrDecoded),
            link.callback(Msg::QrDecodeError),
        ) {
            Ok(scanner) => self.scanner = Some(scanner),
            Err(e) => {
                log::error!("Failed to start QR scanner: {:?}", e);
                link.send_message(Msg::CloseScanner);
                link.send_message(Msg::SetError(Some("Camera scanner is unavailable.".into())));
            }
        }
    }

    fn destroy(&mut self, _ctx: &Context<Self>) {
        self.scanner = None;
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="container">
                { render_top_bar(self, ctx) }
                { render_scanner_overlay(self, ctx) }

                <main class="main-content">
                    { render_notice(self) }
                    { render_error_message(self) }
                    {
                        if self.form.is_reviewing() {
                            render_results(self, ctx)
                        } else {
                            render_upload_section(self, ctx)
                        }
                    }
                </main>
            </div>
        }
    }
}

fn main() {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("App starting...");
    yew::Renderer::<Model>::new().render();
}
