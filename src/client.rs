use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{LprError, LprErrorKind};
use crate::payload::RecognitionRequest;

pub const DEFAULT_ENDPOINT: &str = "http://192.168.134.248:8001/anpr";

/// One attempt at recognising the plate in a request.
///
/// Callers treat any `Err` as "no result" for that image.
pub trait RecognitionClient {
    fn submit(&self, request: &RecognitionRequest) -> Result<RecognitionResponse, LprError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResponse {
    pub result: RecognitionResult,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub license_plate_number: String,
    /// whatever else the server sends back
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecognitionResponse {

    /// parse a 200 body
    pub fn from_body(body: &str) -> Result<Self, LprError> {
        let value: Value = serde_json::from_str(body)?;
        debug!("response from recognition service:\n{}", serde_json::to_string_pretty(&value)?);
        let has_plate = value.get("result")
            .and_then(|result| result.get("license_plate_number"))
            .map_or(false, Value::is_string);
        if !has_plate {
            return Err(LprErrorKind::MissingPlate.into());
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn plate(&self) -> &str {
        &self.result.license_plate_number
    }
}

/// POSTs JSON to a single fixed endpoint, no retries.
pub struct HttpRecognitionClient {
    client: Client,
    endpoint: String,
}

impl HttpRecognitionClient {

    pub fn new(endpoint: impl Into<String>) -> Self {
        HttpRecognitionClient { client: Client::new(), endpoint: endpoint.into() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpRecognitionClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl RecognitionClient for HttpRecognitionClient {

    fn submit(&self, request: &RecognitionRequest) -> Result<RecognitionResponse, LprError> {
        let response = self.client.post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| {
                warn!("an error occurred while sending the request: {}", e);
                LprError::from(e)
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("failed to send image, status code: {}", status.as_u16());
            return Err(LprErrorKind::Status(status.as_u16()).into());
        }
        let body = response.text().map_err(|e| {
            warn!("could not read response body: {}", e);
            LprError::from(e)
        })?;
        RecognitionResponse::from_body(&body).map_err(|e| {
            warn!("{}", e);
            e
        })
    }
}
