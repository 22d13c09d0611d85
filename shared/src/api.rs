use serde::{Deserialize, Deserializer, Serialize};

/// Body of `POST /server/submitResults`.
///
/// Every field is optional on the wire; the endpoint reports missing
/// required fields itself.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultsRequest {
    #[serde(default)]
    pub qr_code_data: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub predictions: Vec<Option<String>>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<Option<String>>,
    #[serde(default)]
    pub overall_status: Option<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResultsResponse {
    pub message: String,
    pub house_id: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
