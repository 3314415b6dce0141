//! Text embeddings and cosine similarity.
//!
//! `HashingEmbedder` is a local, deterministic bag-of-words encoder (feature
//! hashing into a fixed number of buckets, keyed on SHA-256 so vectors are
//! stable across builds). `VoyageEmbedder` calls a hosted
//! embeddings endpoint. Neither caches.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_DIMENSION: usize = 384;

pub const VOYAGE_BASE_URL: &str = "https://api.voyageai.com";
const VOYAGE_MODEL: &str = "voyage-3-lite";

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Expected {expected} embeddings, got {actual}")]
    CountMismatch { expected: usize, actual: usize },
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, in input order.
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Cosine similarity. Mismatched lengths or a zero vector give 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

pub fn batch_similarity(query: &[f32], targets: &[Vec<f32>]) -> Vec<f32> {
    targets
        .iter()
        .map(|target| cosine_similarity(query, target))
        .collect()
}

/// Similarity of `query` to each of `candidates`, encoded in one batch.
pub async fn similarities(
    embedder: &dyn Embedder,
    query: &str,
    candidates: &[String],
) -> Result<Vec<f32>, EmbeddingError> {
    let mut texts = Vec::with_capacity(candidates.len() + 1);
    texts.push(query.to_string());
    texts.extend(candidates.iter().cloned());

    let vectors = embedder.encode(&texts).await?;
    if vectors.len() != texts.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: texts.len(),
            actual: vectors.len(),
        });
    }
    Ok(batch_similarity(&vectors[0], &vectors[1..]))
}

// ────────────────────────────────────────────────────────────────────────────
// Local hashing encoder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Each lowercase alphanumeric token adds ±1 to one bucket; the result is
    /// unit length (or all zeros for text without tokens).
    pub fn encode_one(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = token_hash(token);

            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }
        normalize(&embedding)
    }
}

/// First eight bytes of the token's SHA-256 digest, big-endian.
fn token_hash(token: &str) -> u64 {
    let digest = Sha256::digest(token.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}

fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return v.to_vec();
    }
    v.iter().map(|x| x / norm).collect()
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.encode_one(t)).collect())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Hosted encoder
// ────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Clone)]
pub struct VoyageEmbedder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl VoyageEmbedder {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: VOYAGE_BASE_URL.to_string(),
            model: VOYAGE_MODEL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Embedder for VoyageEmbedder {
    async fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Requesting {} embeddings from {}", texts.len(), self.model);

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                input: texts,
                model: &self.model,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut body: EmbeddingResponse = response.json().await?;
        if body.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: body.data.len(),
            });
        }
        body.data.sort_by_key(|d| d.index);
        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn test_orthogonal_vectors_have_zero_similarity() {
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_degenerate_vectors_have_zero_similarity() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_hashing_embedder_is_deterministic_and_unit_length() {
        let embedder = HashingEmbedder::default();
        let a = embedder.encode_one("Senior Rust engineer");
        let b = embedder.encode_one("senior rust ENGINEER");
        assert_eq!(a.len(), DEFAULT_DIMENSION);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_embedder_buckets_are_fixed() {
        let embedder = HashingEmbedder::new(8);
        assert_eq!(
            embedder.encode_one("Rust"),
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );

        let pair = embedder.encode_one("rust engineer");
        let half = std::f32::consts::FRAC_1_SQRT_2;
        assert!((pair[2] - half).abs() < 1e-6);
        assert!((pair[7] - half).abs() < 1e-6);
        assert_eq!(pair.iter().filter(|x| **x != 0.0).count(), 2);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let embedder = HashingEmbedder::default();
        let query = embedder.encode_one("python data engineer");
        let targets = vec![
            embedder.encode_one("data engineer who writes python"),
            embedder.encode_one("florist"),
        ];
        let scores = batch_similarity(&query, &targets);
        assert!(scores[0] > 0.5);
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn test_empty_text_encodes_to_zero_vector() {
        let embedder = HashingEmbedder::new(8);
        assert_eq!(embedder.encode_one("  --  "), vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_similarities_with_local_embedder() {
        let embedder = HashingEmbedder::default();
        let scores = similarities(
            &embedder,
            "kubernetes operator",
            &["kubernetes operator".to_string(), String::new()],
        )
        .await
        .unwrap();
        assert!((scores[0] - 1.0).abs() < 1e-5);
        assert_eq!(scores[1], 0.0);
    }

    #[tokio::test]
    async fn test_voyage_embedder_orders_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer vk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"embedding": [0.0, 1.0], "index": 1},
                    {"embedding": [1.0, 0.0], "index": 0}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let embedder = VoyageEmbedder::new("vk-test".to_string())
            .with_base_url(format!("{}/", server.uri()));
        let vectors = embedder
            .encode(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_voyage_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let embedder = VoyageEmbedder::new("bad".to_string()).with_base_url(server.uri());
        let err = embedder.encode(&["x".to_string()]).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::Api { status: 401, .. }));
    }
}
