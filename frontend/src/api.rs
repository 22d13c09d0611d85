use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gloo_file::File as GlooFile;
use gloo_net::http::{Request, Response};
use shared::{
    classify_batch, ClassificationResponse, ClassifierConfig, ErrorResponse, FormError, Prediction,
    SubmitResultsRequest, SubmitResultsResponse, SLOT_COUNT,
};
use url::Url;

const SUBMIT_RESULTS_URL: &str = "/server/submitResults";
const CLASSIFIER_CONFIG_URL: &str = "/server/classifierConfig";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] gloo_net::Error),
    #[error("Server error: {status} - {body}")]
    Status { status: u16, body: String },
    #[error("Failed to read image: {0}")]
    FileRead(#[from] gloo_file::FileReadError),
    #[error("Invalid classifier endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("{0}")]
    Form(#[from] FormError),
}

async fn error_for(response: Response) -> ApiError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body = serde_json::from_str::<ErrorResponse>(&text)
        .map(|e| e.error)
        .unwrap_or(text);
    ApiError::Status { status, body }
}

/// Base64 body of a photo, without the data-URL prefix.
pub async fn encode_file(file: &GlooFile) -> Result<String, ApiError> {
    let bytes = gloo_file::futures::read_as_bytes(file).await?;
    Ok(STANDARD.encode(bytes))
}

pub async fn encode_slots(
    images: Vec<Option<GlooFile>>,
) -> Result<[Option<String>; SLOT_COUNT], ApiError> {
    let mut encoded: [Option<String>; SLOT_COUNT] = Default::default();
    for (index, image) in images.into_iter().enumerate().take(SLOT_COUNT) {
        if let Some(file) = image {
            encoded[index] = Some(encode_file(&file).await?);
        }
    }
    Ok(encoded)
}

async fn classify_image(url: &Url, file: &GlooFile) -> Result<Vec<Prediction>, ApiError> {
    let body = encode_file(file).await?;
    let response = Request::post(url.as_str())
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body(body)?
        .send()
        .await?;

    if !response.ok() {
        return Err(error_for(response).await);
    }
    let parsed = response.json::<ClassificationResponse>().await?;
    Ok(parsed.predictions)
}

/// Classifies every photo concurrently; one failed call fails the batch.
pub async fn classify_slots(
    config: &ClassifierConfig,
    images: Vec<Option<GlooFile>>,
) -> Result<Vec<Option<Vec<Prediction>>>, ApiError> {
    let url = config.request_url()?;
    classify_batch(images, |file| {
        let url = url.clone();
        async move { classify_image(&url, &file).await }
    })
    .await
}

pub async fn submit_results(
    request: &SubmitResultsRequest,
) -> Result<SubmitResultsResponse, ApiError> {
    let response = Request::post(SUBMIT_RESULTS_URL)
        .json(request)?
        .send()
        .await?;

    if !response.ok() {
        return Err(error_for(response).await);
    }
    Ok(response.json::<SubmitResultsResponse>().await?)
}

pub async fn fetch_classifier_config() -> Result<ClassifierConfig, ApiError> {
    let response = Request::get(CLASSIFIER_CONFIG_URL).send().await?;
    if !response.ok() {
        return Err(error_for(response).await);
    }
    Ok(response.json::<ClassifierConfig>().await?)
}
