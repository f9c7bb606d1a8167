use std::env;

use async_trait::async_trait;
use eyre::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info};
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

// Decoding parameters, fixed for every request.
const TEMPERATURE: f32 = 0.7;
const MAX_NEW_TOKENS: u32 = 2048;
const CONTEXT_LENGTH: u32 = 4096;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// The inference server or the configured model could not be set up.
    /// Reported once as a canned chat message; the next request retries.
    #[error("model initialization failed: {0}")]
    Init(String),

    #[error("request to inference server failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("inference server returned an error: {0}")]
    Api(String),
}

#[derive(Clone, Debug)]
pub struct OllamaConfig {
    pub base_url: Url,
    pub model: String,
}

impl OllamaConfig {
    pub fn from_env() -> Result<Self> {
        let base_url = env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)?;

        let model = env::var("TRAVEL_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Ok(Self { base_url, model })
    }
}

/// Text-generation capability consumed by the chat session.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
    num_ctx: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

pub struct OllamaClient {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Connect to the inference server and verify the configured model is
    /// available. Called once per process, on the first chat request.
    pub async fn connect(config: OllamaConfig) -> Result<Self, GenerateError> {
        let client = reqwest::Client::new();

        let tags_url = config
            .base_url
            .join("api/tags")
            .map_err(|e| GenerateError::Init(e.to_string()))?;

        let response = client
            .get(tags_url)
            .send()
            .await
            .map_err(|e| GenerateError::Init(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GenerateError::Init(format!(
                "inference server answered with status {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Init(e.to_string()))?;

        let tag_prefix = format!("{}:", config.model);
        let available = tags
            .models
            .iter()
            .any(|m| m.name == config.model || m.name.starts_with(&tag_prefix));

        if !available {
            return Err(GenerateError::Init(format!(
                "model {} is not available on the inference server",
                config.model
            )));
        }

        info!("Model {} ready at {}", config.model, config.base_url);

        Ok(Self { config, client })
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let api_url = self
            .config
            .base_url
            .join("api/generate")
            .map_err(|e| GenerateError::Api(e.to_string()))?;

        let request_body = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: TEMPERATURE,
                num_predict: MAX_NEW_TOKENS,
                num_ctx: CONTEXT_LENGTH,
            },
        };

        debug!("Sending generation request for model {}", self.config.model);

        let response = self.client.post(api_url).json(&request_body).send().await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            error!("Generation request failed with response: {}", error_text);
            return Err(GenerateError::Api(error_text));
        }

        let body: GenerateResponse = response.json().await?;

        debug!("Received {} bytes of generated text", body.response.len());

        Ok(body.response)
    }
}

/// Lazily initialized client: the connection is established on the first
/// generation request and cached for the process lifetime. A failed
/// initialization leaves the cell unset, so the next request retries.
pub struct LazyOllama {
    config: OllamaConfig,
    client: OnceCell<OllamaClient>,
}

impl LazyOllama {
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }
}

#[async_trait]
impl TextGenerator for LazyOllama {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let client = self
            .client
            .get_or_try_init(|| OllamaClient::connect(self.config.clone()))
            .await?;

        client.generate(prompt).await
    }
}
