use actix_files::Files;
use actix_web::http::StatusCode;
use actix_web::{error, web, HttpResponse, ResponseError};
use log::{debug, error, info, warn};
use shared::{
    ClassifierConfig, ErrorResponse, SubmitResultsRequest, SubmitResultsResponse, SLOT_COUNT,
};

use crate::db::submission_repository::{NewSubmission, RepositoryError, SubmissionRepository};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("qrCodeData and overallStatus are required")]
    MissingFields,
    #[error("Failed to save house data")]
    Storage(#[from] RepositoryError),
}

impl ResponseError for SubmitError {
    fn status_code(&self) -> StatusCode {
        match self {
            SubmitError::MissingFields => StatusCode::BAD_REQUEST,
            SubmitError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse::new(self.to_string()))
    }
}

pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/server/submitResults").route(web::post().to(submit_results)))
        .service(
            web::resource("/server/classifierConfig").route(web::get().to(classifier_config)),
        );
}

pub fn configure_routes(cfg: &mut web::ServiceConfig, frontend_dir: String) {
    configure_api(cfg);
    cfg.service(Files::new("/", frontend_dir).index_file("index.html"));
}

/// JSON extractor settings: room for three base64 photos, and malformed
/// bodies answered with the usual `{ error }` shape.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            let message = format!("Invalid request body: {}", err);
            warn!("{}", message);
            error::InternalError::from_response(
                err,
                HttpResponse::BadRequest().json(ErrorResponse::new(message)),
            )
            .into()
        })
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn validate(request: SubmitResultsRequest) -> Result<NewSubmission, SubmitError> {
    let (Some(house_id), Some(status)) = (
        present(request.qr_code_data),
        present(request.overall_status),
    ) else {
        return Err(SubmitError::MissingFields);
    };

    let mut images = request.images.into_iter();
    let images: [Option<String>; SLOT_COUNT] =
        std::array::from_fn(|_| present(images.next().flatten()));

    Ok(NewSubmission {
        house_id,
        images,
        status,
    })
}

async fn submit_results(
    repository: web::Data<SubmissionRepository>,
    payload: web::Json<SubmitResultsRequest>,
) -> Result<HttpResponse, SubmitError> {
    let request = payload.into_inner();
    debug!(
        "Submission for {:?}: slot labels {:?}, overall {:?}",
        request.qr_code_data, request.predictions, request.overall_status
    );

    let submission = validate(request).inspect_err(|_| {
        info!("Rejected submission without qrCodeData or overallStatus");
    })?;

    let id = repository.insert(&submission).await.inspect_err(|e| {
        error!("Database error while saving {}: {:?}", submission.house_id, e);
    })?;

    info!(
        "Stored report {} for house {} ({})",
        id, submission.house_id, submission.status
    );
    Ok(HttpResponse::Created().json(SubmitResultsResponse {
        message: "House data added successfully".to_string(),
        house_id: id,
    }))
}

async fn classifier_config(config: web::Data<ClassifierConfig>) -> HttpResponse {
    HttpResponse::Ok().json(config.get_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::submission_repository::tests::{
        memory_repository, reject_house, row_count, stored_row,
    };
    use actix_web::{test, App};
    use serde_json::json;

    macro_rules! test_app {
        ($repo:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($repo.clone()))
                    .app_data(web::Data::new(ClassifierConfig {
                        endpoint: "https://detect.example.com/waste/1".into(),
                        api_key: "secret".into(),
                    }))
                    .app_data(json_config(1024 * 1024))
                    .configure(configure_api),
            )
            .await
        };
    }

    fn submit(body: serde_json::Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/server/submitResults")
            .set_json(body)
    }

    #[actix_web::test]
    async fn test_submit_stores_record() {
        let repo = memory_repository().await;
        let app = test_app!(repo);

        let resp = test::call_service(
            &app,
            submit(json!({
                "qrCodeData": "HS12345",
                "predictions": ["Mixed", "Segregated", null],
                "images": ["aW1hZ2Ux", "aW1hZ2Uy", null],
                "overallStatus": "Mixed"
            })).to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: SubmitResultsResponse = test::read_body_json(resp).await;
        assert_eq!(body.message, "House data added successfully");

        let (house_id, image1, image2, image3, status) = stored_row(&repo, body.house_id).await;
        assert_eq!(house_id, "HS12345");
        assert_eq!(image1.as_deref(), Some("aW1hZ2Ux"));
        assert_eq!(image2.as_deref(), Some("aW1hZ2Uy"));
        assert_eq!(image3, None);
        assert_eq!(status, "Mixed");
    }

    #[actix_web::test]
    async fn test_short_image_list_is_null_padded() {
        let repo = memory_repository().await;
        let app = test_app!(repo);

        let resp = test::call_service(
            &app,
            submit(json!({
                "qrCodeData": "HS7",
                "images": ["", "aW1n"],
                "overallStatus": "Unknown"
            })).to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: SubmitResultsResponse = test::read_body_json(resp).await;
        let (_, image1, image2, image3, status) = stored_row(&repo, body.house_id).await;
        assert_eq!(image1, None);
        assert_eq!(image2.as_deref(), Some("aW1n"));
        assert_eq!(image3, None);
        assert_eq!(status, "Unknown");
    }

    #[actix_web::test]
    async fn test_null_lists_are_accepted() {
        let repo = memory_repository().await;
        let app = test_app!(repo);

        let resp = test::call_service(
            &app,
            submit(json!({
                "qrCodeData": "HS8",
                "predictions": null,
                "images": null,
                "overallStatus": "Segregated"
            })).to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: SubmitResultsResponse = test::read_body_json(resp).await;
        let (house_id, image1, image2, image3, _) = stored_row(&repo, body.house_id).await;
        assert_eq!(house_id, "HS8");
        assert_eq!((image1, image2, image3), (None, None, None));
    }

    #[actix_web::test]
    async fn test_empty_qr_code_is_rejected() {
        let repo = memory_repository().await;
        let app = test_app!(repo);

        let resp = test::call_service(
            &app,
            submit(json!({
                "qrCodeData": "",
                "predictions": ["Segregated"],
                "images": ["aW1n"],
                "overallStatus": "Segregated"
            })).to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "qrCodeData and overallStatus are required");
        assert_eq!(row_count(&repo).await, 0);
    }

    #[actix_web::test]
    async fn test_missing_overall_status_is_rejected() {
        let repo = memory_repository().await;
        let app = test_app!(repo);

        let resp = test::call_service(&app, submit(json!({ "qrCodeData": "HS1" })).to_request()).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(row_count(&repo).await, 0);
    }

    #[actix_web::test]
    async fn test_malformed_body_is_bad_request() {
        let repo = memory_repository().await;
        let app = test_app!(repo);

        let req = test::TestRequest::post()
            .uri("/server/submitResults")
            .insert_header(("content-type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.starts_with("Invalid request body"));
    }

    #[actix_web::test]
    async fn test_storage_failure_rolls_back() {
        let repo = memory_repository().await;
        let app = test_app!(repo);

        let ok = test::call_service(
            &app,
            submit(json!({ "qrCodeData": "HS1", "overallStatus": "Segregated" })).to_request(),
        )
        .await;
        assert_eq!(ok.status(), StatusCode::CREATED);

        reject_house(&repo, "HSFAIL").await;
        let resp = test::call_service(
            &app,
            submit(json!({
                "qrCodeData": "HSFAIL",
                "images": ["aW1n", null, null],
                "overallStatus": "Mixed"
            })).to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Failed to save house data");
        assert_eq!(row_count(&repo).await, 1);
    }

    #[actix_web::test]
    async fn test_classifier_config_is_served() {
        let repo = memory_repository().await;
        let app = test_app!(repo);

        let req = test::TestRequest::get()
            .uri("/server/classifierConfig")
            .to_request();
        let body: ClassifierConfig = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.endpoint, "https://detect.example.com/waste/1");
        assert_eq!(body.api_key, "secret");
    }

    #[::core::prelude::v1::test]
    fn test_validate_ignores_extra_images() {
        let submission = validate(SubmitResultsRequest {
            qr_code_data: Some("HS1".into()),
            predictions: vec![],
            images: vec![
                Some("a".into()),
                Some("b".into()),
                Some("c".into()),
                Some("d".into()),
            ],
            overall_status: Some("Mixed".into()),
        })
        .unwrap();
        assert_eq!(
            submission.images,
            [Some("a".into()), Some("b".into()), Some("c".into())]
        );
    }
}
