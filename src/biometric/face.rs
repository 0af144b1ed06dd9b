use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info};

use super::BiometricError;
use super::image::decode_base64_image;

pub const FACE_MODEL: &str = "VGG-Face";

/// Cosine distance at or below which two VGG-Face embeddings are the same person.
pub const MATCH_THRESHOLD: f64 = 0.68;

/// Produces a face embedding for an image.
#[async_trait]
pub trait FaceEmbedder: Send + Sync {
    async fn embed(&self, image: &[u8]) -> Result<Vec<f64>, BiometricError>;
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f64>,
}

/// Client for an embedding service that answers `{"embedding": [...]}`.
pub struct HttpFaceEmbedder {
    url: String,
    http: Client,
}

impl HttpFaceEmbedder {
    pub fn new(url: String, http: Client) -> Self {
        Self { url, http }
    }
}

#[async_trait]
impl FaceEmbedder for HttpFaceEmbedder {
    async fn embed(&self, image: &[u8]) -> Result<Vec<f64>, BiometricError> {
        let response = self
            .http
            .post(&self.url)
            .json(&json!({
                "image_base64": STANDARD.encode(image),
                "model": FACE_MODEL,
            }))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Face embedding service unreachable");
                BiometricError::Embedding(e.to_string())
            })?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNPROCESSABLE_ENTITY {
            let detail = response.text().await.unwrap_or_default();
            return Err(BiometricError::NoFaceDetected(detail));
        }
        if !status.is_success() {
            error!(status = status.as_u16(), "Face embedding service error");
            return Err(BiometricError::Embedding(format!("status {}", status)));
        }

        let body = response
            .json::<EmbeddingResponse>()
            .await
            .map_err(|e| BiometricError::Embedding(e.to_string()))?;

        if body.embedding.is_empty() {
            return Err(BiometricError::NoFaceDetected("empty embedding".into()));
        }
        debug!(dimensions = body.embedding.len(), "Face embedding generated");
        Ok(body.embedding)
    }
}

/// Embeds an uploaded image and returns the JSON text stored as the template.
pub async fn generate_template(
    embedder: &dyn FaceEmbedder,
    image_base64: &str,
) -> Result<String, BiometricError> {
    let image = decode_base64_image(image_base64)?;
    let embedding = embedder.embed(&image).await?;
    serde_json::to_string(&embedding).map_err(|e| BiometricError::Embedding(e.to_string()))
}

/// `None` when the vectors cannot be compared.
pub fn cosine_distance(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }
    Some(1.0 - dot / (norm_a * norm_b))
}

pub fn faces_match(candidate: &[f64], stored: &[f64]) -> bool {
    cosine_distance(candidate, stored).is_some_and(|d| d <= MATCH_THRESHOLD)
}

/// Compares a fresh capture against the employee's stored template.
pub async fn verify_face(
    embedder: &dyn FaceEmbedder,
    image_base64: &str,
    stored_template: Option<&str>,
) -> Result<bool, BiometricError> {
    let stored_template = match stored_template {
        Some(t) if !t.trim().is_empty() => t,
        _ => return Err(BiometricError::NoStoredTemplate("face")),
    };

    let stored: Vec<f64> = serde_json::from_str(stored_template).map_err(|e| {
        error!(error = %e, "Stored face template is not a valid embedding");
        BiometricError::Embedding("stored face template is corrupt".into())
    })?;

    let image = decode_base64_image(image_base64)?;
    let candidate = embedder.embed(&image).await?;

    let distance = cosine_distance(&candidate, &stored);
    let verified = faces_match(&candidate, &stored);
    info!(?distance, verified, "Face verification finished");
    Ok(verified)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder(Vec<f64>);

    #[async_trait]
    impl FaceEmbedder for FixedEmbedder {
        async fn embed(&self, _image: &[u8]) -> Result<Vec<f64>, BiometricError> {
            Ok(self.0.clone())
        }
    }

    const IMAGE: &str = "data:image/png;base64,aGVsbG8=";

    #[test]
    fn identical_vectors_have_zero_distance() {
        let d = cosine_distance(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!(d.abs() < 1e-12);
        assert!(faces_match(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]));
    }

    #[test]
    fn opposite_vectors_do_not_match() {
        assert!(!faces_match(&[1.0, 0.0], &[-1.0, 0.0]));
        assert!(!faces_match(&[1.0, 0.0], &[0.0, 1.0]));
    }

    #[test]
    fn incomparable_vectors_never_match() {
        assert_eq!(cosine_distance(&[1.0], &[1.0, 2.0]), None);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 2.0]), None);
        assert!(!faces_match(&[], &[]));
    }

    #[actix_web::test]
    async fn verify_matches_stored_template() {
        let embedder = FixedEmbedder(vec![0.1, 0.2, 0.3]);
        let stored = serde_json::to_string(&vec![0.1, 0.2, 0.31]).unwrap();
        assert!(verify_face(&embedder, IMAGE, Some(&stored)).await.unwrap());
    }

    #[actix_web::test]
    async fn verify_requires_a_template() {
        let embedder = FixedEmbedder(vec![0.1]);
        assert!(matches!(
            verify_face(&embedder, IMAGE, None).await,
            Err(BiometricError::NoStoredTemplate("face"))
        ));
        assert!(matches!(
            verify_face(&embedder, IMAGE, Some("not json")).await,
            Err(BiometricError::Embedding(_))
        ));
    }

    #[actix_web::test]
    async fn template_is_json_array() {
        let embedder = FixedEmbedder(vec![0.5, -0.25]);
        let template = generate_template(&embedder, IMAGE).await.unwrap();
        assert_eq!(template, "[0.5,-0.25]");
    }
}
