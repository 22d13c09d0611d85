use crate::api::{self, ApiError};
use crate::{Model, Msg, SlotImage};
use gloo_file::{File as GlooFile, ObjectUrl};
use gloo_storage::{LocalStorage, Storage};
use shared::{
    DecodeFailure, FlowPhase, FormError, Prediction, QrSession, ReportForm, ScanAction,
    SlotStatus, SubmitResultsResponse,
};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

const QR_STORAGE_KEY: &str = "qr_session";

/// Replaces the form on success, surfaces the error otherwise.
fn apply(model: &mut Model, next: Result<ReportForm<SlotImage>, FormError>) -> bool {
    match next {
        Ok(form) => {
            model.form = form;
            true
        }
        Err(e) => {
            log::warn!("Rejected action: {}", e);
            model.error = Some(e.to_string());
            true
        }
    }
}

fn slot_files(form: &ReportForm<SlotImage>) -> Vec<Option<GlooFile>> {
    form.slots()
        .iter()
        .map(|slot| slot.image.as_ref().map(|image| image.file.clone()))
        .collect()
}

/// Form for the household remembered from a previous page load, if any.
pub fn restore_form() -> ReportForm<SlotImage> {
    match LocalStorage::get::<String>(QR_STORAGE_KEY) {
        Ok(stored) => match QrSession::accept(&stored) {
            Some(session) => {
                log::info!("Resuming report for {}", session);
                ReportForm::resume(session)
            }
            None => {
                LocalStorage::delete(QR_STORAGE_KEY);
                ReportForm::new()
            }
        },
        Err(_) => ReportForm::new(),
    }
}

pub fn load_classifier_config(ctx: &Context<Model>) {
    let link = ctx.link().clone();
    spawn_local(async move {
        match api::fetch_classifier_config().await {
            Ok(config) => link.send_message(Msg::ClassifierConfigLoaded(config)),
            Err(e) => {
                log::error!("Failed to load classifier config: {}", e);
                link.send_message(Msg::SetError(Some(
                    "Classification service is not configured.".into(),
                )));
            }
        }
    });
}

pub fn scanner_requested(model: &Model) -> bool {
    model.form.phase() == FlowPhase::Scanning
}

pub fn handle_open_scanner(model: &mut Model) -> bool {
    model.notice = None;
    let next = model.form.open_scanner();
    apply(model, next)
}

pub fn handle_close_scanner(model: &mut Model) -> bool {
    model.scanner = None;
    model.form = model.form.close_scanner();
    true
}

pub fn handle_qr_decoded(model: &mut Model, payload: &str) -> bool {
    match model.form.accept_qr(payload) {
        Ok(form) => {
            log::info!("Valid QR code found: {}", payload);
            model.scanner = None;
            model.form = form;
            model.error = None;
            if let Err(e) = LocalStorage::set(QR_STORAGE_KEY, payload) {
                log::warn!("Could not remember QR session: {:?}", e);
            }
            true
        }
        Err(FormError::InvalidQr { .. }) => {
            log::info!("Invalid QR Code. Must start with 'HS'. Continuing to scan...");
            false
        }
        Err(e) => {
            log::warn!("Ignoring decoded QR code: {}", e);
            false
        }
    }
}

pub fn handle_qr_decode_error(model: &mut Model, error: &str) -> bool {
    match DecodeFailure::classify(error).action() {
        ScanAction::Ignore => {}
        ScanAction::Restart => {
            log::error!("QR Code Error: {}", error);
            log::info!("Unexpected error. Restarting scanner...");
            if let Some(scanner) = &model.scanner {
                scanner.restart();
            }
        }
    }
    false
}

pub fn handle_image_selected(model: &mut Model, index: usize, file: GlooFile) -> bool {
    let image = SlotImage {
        preview_url: ObjectUrl::from(file.clone()),
        file,
    };
    model.error = None;
    let next = model.form.with_image(index, image);
    apply(model, next)
}

pub fn handle_reset(model: &mut Model) -> bool {
    model.form = model.form.reset();
    model.error = None;
    true
}

pub fn handle_classify(model: &mut Model, ctx: &Context<Model>) -> bool {
    let Some(config) = model.classifier.clone() else {
        model.error = Some("Classification service is not configured.".into());
        return true;
    };
    let form = match model.form.begin_classification() {
        Ok(form) => form,
        Err(e) => {
            model.error = Some(e.to_string());
            return true;
        }
    };

    let files = slot_files(&form);
    model.form = form;
    model.error = None;
    model.notice = None;

    let link = ctx.link().clone();
    spawn_local(async move {
        match api::classify_slots(&config, files).await {
            Ok(outputs) => link.send_message(Msg::ClassificationDone(outputs)),
            Err(e) => link.send_message(Msg::ClassificationFailed(e.to_string())),
        }
    });
    true
}

pub fn handle_classification_done(
    model: &mut Model,
    outputs: Vec<Option<Vec<Prediction>>>,
) -> bool {
    let next = model.form.with_classification(outputs);
    apply(model, next)
}

pub fn handle_classification_failed(model: &mut Model, error: &str) -> bool {
    gloo_console::error!("Error:", error);
    let next = model.form.classification_failed();
    apply(model, next)
}

pub fn handle_manual_status(model: &mut Model, index: usize, status: SlotStatus) -> bool {
    let next = model.form.with_manual_status(index, status);
    apply(model, next)
}

pub fn handle_submit_results(model: &mut Model, ctx: &Context<Model>) -> bool {
    let form = match model.form.begin_submission() {
        Ok(form) => form,
        Err(e) => {
            log::warn!("Ignoring submit: {}", e);
            return false;
        }
    };
    model.form = form.clone();
    model.error = None;

    let link = ctx.link().clone();
    spawn_local(async move {
        let result: Result<SubmitResultsResponse, ApiError> = async {
            let encoded = api::encode_slots(slot_files(&form)).await?;
            let request = form.submission(encoded)?;
            if let Ok(payload) = serde_json::to_string(&request) {
                gloo_console::log!("Submitting results:", payload);
            }
            api::submit_results(&request).await
        }
        .await;

        match result {
            Ok(response) => link.send_message(Msg::SubmissionDone(response)),
            Err(e) => link.send_message(Msg::SubmissionFailed(e.to_string())),
        }
    });
    true
}

pub fn handle_submission_done(model: &mut Model, response: SubmitResultsResponse) -> bool {
    log::info!(
        "Results submitted successfully: {} (record {})",
        response.message,
        response.house_id
    );
    LocalStorage::delete(QR_STORAGE_KEY);
    model.scanner = None;
    model.form = model.form.finish_submission();
    model.notice = Some("Results submitted successfully!".into());
    true
}

pub fn handle_submission_failed(model: &mut Model, error: &str) -> bool {
    log::error!("Error submitting results: {}", error);
    model.error = Some("Error submitting results. Please try again.".into());
    let next = model.form.submission_failed();
    apply(model, next)
}
