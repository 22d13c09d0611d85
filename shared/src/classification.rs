use std::future::Future;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::report::SlotStatus;

pub const DRY_WASTE_CLASS: &str = "dry waste";
pub const WET_WASTE_CLASS: &str = "wet waste";

/// One detected object returned by the hosted detection model.
///
/// Only `class` drives the status; the box geometry is kept for display and
/// debugging.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Prediction {
    pub class: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_id: Option<String>,
}

impl Prediction {
    pub fn new(class: impl Into<String>, confidence: f32) -> Self {
        Self {
            class: class.into(),
            confidence,
            x: None,
            y: None,
            width: None,
            height: None,
            class_id: None,
            detection_id: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ClassificationResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

/// Where the browser sends photos for classification.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl ClassifierConfig {
    /// Endpoint with the API key attached as the `api_key` query parameter.
    pub fn request_url(&self) -> Result<Url, url::ParseError> {
        Url::parse_with_params(&self.endpoint, &[("api_key", self.api_key.as_str())])
    }
}

/// Runs `classify` on every filled slot concurrently.
///
/// All or nothing: the first failed call fails the whole batch. Entry `i` of
/// the result belongs to slot `i` and is `None` for an empty slot.
pub async fn classify_batch<T, R, E, F, Fut>(
    slots: Vec<Option<T>>,
    classify: F,
) -> Result<Vec<Option<R>>, E>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<R, E>>,
{
    let calls = slots.into_iter().map(|slot| {
        let call = slot.map(&classify);
        async move {
            match call {
                Some(call) => call.await.map(Some),
                None => Ok(None),
            }
        }
    });
    try_join_all(calls).await
}

/// Reduces a classifier output to a slot status.
///
/// Returns `None` when nothing was detected; the slot then needs a manual
/// choice.
pub fn derive_slot_status(predictions: &[Prediction]) -> Option<SlotStatus> {
    if predictions.is_empty() {
        return None;
    }

    let has_class = |name: &str| predictions.iter().any(|p| p.class == name);
    if has_class(DRY_WASTE_CLASS) && has_class(WET_WASTE_CLASS) {
        Some(SlotStatus::Mixed)
    } else {
        Some(SlotStatus::Segregated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    fn preds(classes: &[&str]) -> Vec<Prediction> {
        classes.iter().map(|c| Prediction::new(*c, 0.8)).collect()
    }

    #[test]
    fn dry_and_wet_together_is_mixed() {
        assert_eq!(
            derive_slot_status(&preds(&["dry waste", "wet waste"])),
            Some(SlotStatus::Mixed)
        );
        assert_eq!(
            derive_slot_status(&preds(&["wet waste", "plastic", "dry waste", "dry waste"])),
            Some(SlotStatus::Mixed)
        );
    }

    #[test]
    fn single_kind_is_segregated() {
        assert_eq!(derive_slot_status(&preds(&["dry waste"])), Some(SlotStatus::Segregated));
        assert_eq!(
            derive_slot_status(&preds(&["wet waste", "wet waste"])),
            Some(SlotStatus::Segregated)
        );
        assert_eq!(derive_slot_status(&preds(&["glass"])), Some(SlotStatus::Segregated));
    }

    #[test]
    fn class_match_is_exact() {
        assert_eq!(
            derive_slot_status(&preds(&["Dry Waste", "wet waste"])),
            Some(SlotStatus::Segregated)
        );
    }

    #[test]
    fn no_predictions_needs_manual_choice() {
        assert_eq!(derive_slot_status(&[]), None);
    }

    #[test]
    fn parses_detection_api_response() {
        let body = r#"{
            "time": 0.12,
            "image": {"width": 640, "height": 480},
            "predictions": [
                {"x": 10.0, "y": 20.5, "width": 30, "height": 40, "confidence": 0.91,
                 "class": "dry waste", "class_id": 0, "detection_id": "a1"},
                {"confidence": 0.55, "class": "wet waste"}
            ]
        }"#;
        let response: ClassificationResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.predictions.len(), 2);
        assert_eq!(response.predictions[0].class, "dry waste");
        assert_eq!(response.predictions[0].class_id, Some(0));
        assert_eq!(response.predictions[1].x, None);
        assert_eq!(derive_slot_status(&response.predictions), Some(SlotStatus::Mixed));
    }

    #[test]
    fn missing_prediction_list_is_empty() {
        let response: ClassificationResponse = serde_json::from_str("{}").unwrap();
        assert!(response.predictions.is_empty());
    }

    #[test]
    fn request_url_carries_api_key() {
        let config = ClassifierConfig {
            endpoint: "https://detect.example.com/waste-segregation/1".into(),
            api_key: "k e&y".into(),
        };
        let url = config.request_url().unwrap();
        assert_eq!(url.path(), "/waste-segregation/1");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("api_key".to_string(), "k e&y".to_string())]);
    }

    #[test]
    fn batch_keeps_slot_positions() {
        let outputs = block_on(classify_batch(vec![Some(2), None, Some(5)], |n| async move {
            Ok::<_, String>(n * 10)
        }))
        .unwrap();
        assert_eq!(outputs, vec![Some(20), None, Some(50)]);
    }

    #[test]
    fn one_failed_call_fails_the_batch() {
        let result = block_on(classify_batch(vec![Some("a"), Some("bad"), None], |name| async move {
            if name == "bad" {
                Err(format!("classifier rejected {}", name))
            } else {
                Ok(vec![Prediction::new("dry waste", 0.9)])
            }
        }));
        assert_eq!(result.unwrap_err(), "classifier rejected bad");
    }

    #[test]
    fn request_url_rejects_relative_endpoint() {
        let config = ClassifierConfig { endpoint: "detect/1".into(), api_key: "k".into() };
        assert!(config.request_url().is_err());
    }
}
