use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use super::BiometricError;

const VISION_ANNOTATE_URL: &str = "https://vision.googleapis.com/v1/images:annotate";

pub const MIN_DETECTION_CONFIDENCE: f64 = 0.90;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateResponse {
    #[serde(default)]
    pub face_annotations: Vec<FaceAnnotation>,
    pub error: Option<VisionStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAnnotation {
    #[serde(default)]
    pub detection_confidence: f64,
}

#[derive(Debug, Deserialize)]
pub struct VisionStatus {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    responses: Vec<AnnotateResponse>,
}

/// Accepts the first detected face when its confidence clears the minimum.
pub fn evaluate_detection(response: &AnnotateResponse) -> Result<f64, BiometricError> {
    if let Some(status) = &response.error {
        if !status.message.is_empty() {
            return Err(BiometricError::Vision(status.message.clone()));
        }
    }

    let face = response
        .face_annotations
        .first()
        .ok_or_else(|| BiometricError::NoFaceDetected("no face found in the image".into()))?;

    if face.detection_confidence < MIN_DETECTION_CONFIDENCE {
        return Err(BiometricError::LowConfidence);
    }
    Ok(face.detection_confidence)
}

/// Google Cloud Vision face detection over the REST API.
pub struct VisionClient {
    api_key: String,
    http: Client,
}

impl VisionClient {
    pub fn new(api_key: String, http: Client) -> Self {
        Self { api_key, http }
    }

    pub async fn detect_face(&self, image: &[u8]) -> Result<f64, BiometricError> {
        let body = json!({
            "requests": [{
                "image": { "content": STANDARD.encode(image) },
                "features": [{ "type": "FACE_DETECTION", "maxResults": 1 }]
            }]
        });

        let response = self
            .http
            .post(VISION_ANNOTATE_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Vision API unreachable");
                BiometricError::Vision(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), %detail, "Vision API rejected the request");
            return Err(BiometricError::Vision(format!("status {}", status)));
        }

        let batch = response
            .json::<BatchResponse>()
            .await
            .map_err(|e| BiometricError::Vision(e.to_string()))?;
        let first = batch.responses.into_iter().next().unwrap_or_default();

        let confidence = evaluate_detection(&first)?;
        info!(confidence, "Face detected");
        Ok(confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> AnnotateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn confident_face_is_accepted() {
        let response = parse(json!({ "faceAnnotations": [{ "detectionConfidence": 0.97 }] }));
        assert_eq!(evaluate_detection(&response).unwrap(), 0.97);
    }

    #[test]
    fn low_confidence_is_rejected() {
        let response = parse(json!({ "faceAnnotations": [{ "detectionConfidence": 0.89 }] }));
        assert!(matches!(evaluate_detection(&response), Err(BiometricError::LowConfidence)));
    }

    #[test]
    fn no_face_is_rejected() {
        let response = parse(json!({}));
        assert!(matches!(
            evaluate_detection(&response),
            Err(BiometricError::NoFaceDetected(_))
        ));
    }

    #[test]
    fn api_error_wins() {
        let response = parse(json!({
            "error": { "message": "Bad image data." },
            "faceAnnotations": [{ "detectionConfidence": 0.99 }]
        }));
        assert!(matches!(evaluate_detection(&response), Err(BiometricError::Vision(m)) if m == "Bad image data."));
    }
}
