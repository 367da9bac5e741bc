use crate::domain::error::DomainError;
use crate::domain::ports::encoder::Encoder;
use crate::domain::values::rgb_image::RgbImage;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_URL: &str = "http://localhost:8000";

/// Client for a model server hosting the dual encoder.
///
/// Text goes to `POST {base}/vectorize/text` as `{"text": ..}`; images go to
/// `POST {base}/vectorize/image` as `{"image": <base64 PNG>}`. Both answer
/// `{"vector": [..], "dim": n}`.
pub struct HttpEncoder {
    client: Client,
    base_url: String,
    dimension: usize,
}

#[derive(Serialize)]
struct TextRequest<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct ImageRequest {
    image: String,
}

#[derive(Deserialize)]
struct VectorResponse {
    vector: Vec<f32>,
}

impl HttpEncoder {
    pub fn new(base_url: Option<String>, dimension: usize) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            dimension,
        }
    }

    async fn vectorize<B: Serialize + ?Sized>(&self, route: &str, body: &B) -> Result<Vec<f32>, DomainError> {
        let url = format!("{}/vectorize/{route}", self.base_url);

        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::Encoder(format!("Encoder API error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Encoder(format!("Encoder API {status}: {body}")));
        }

        let result: VectorResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Parse(format!("Parse error: {e}")))?;
        Ok(result.vector)
    }
}

#[async_trait::async_trait]
impl Encoder for HttpEncoder {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.vectorize("text", &TextRequest { text }).await
    }

    async fn embed_image(&self, image: &RgbImage) -> Result<Vec<f32>, DomainError> {
        let body = ImageRequest {
            image: STANDARD.encode(image.encode_png()?),
        };
        self.vectorize("image", &body).await
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
