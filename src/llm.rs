use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Local Ollama default; override with OLLAMA_API_URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model tag; override with LLM_MODEL.
pub const DEFAULT_MODEL: &str =
    "hf.co/Vikhrmodels/QVikhr-3-1.7B-Instruction-noreasoning-GGUF:Q4_K_M";

const REQUEST_TIMEOUT_SECS: u64 = 60;
const HEALTH_TIMEOUT_SECS: u64 = 10;

/// Generation parameters shared by both API flavors. Deterministic-leaning:
/// the reply must be a short bracketed list, not prose.
const TEMPERATURE: f64 = 0.0;
const TOP_P: f64 = 0.1;
const MAX_OUTPUT_TOKENS: u32 = 200;
const REPEAT_PENALTY: f64 = 1.0;

/// One capability: submit a prompt, get the raw reply text.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// One-shot reachability probe, polled once at startup.
    async fn health_check(&self) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Client over a remote text-generation endpoint. Which deployed model and
/// which API shape it speaks are construction-time choices, not code.
pub struct LlmClient {
    transport: Box<dyn Transport>,
}

impl LlmClient {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Ollama-style single-shot generate endpoint.
    pub fn generate_api(base_url: &str, model: &str) -> Result<Self> {
        Ok(Self::new(Box::new(GenerateApi::new(base_url, model)?)))
    }

    /// OpenAI-compatible chat-completions endpoint (vLLM and friends).
    pub fn chat_api(base_url: &str, model: &str) -> Result<Self> {
        Ok(Self::new(Box::new(ChatApi::new(base_url, model)?)))
    }

    /// Endpoint base URL from the environment, loopback default.
    pub fn base_url_from_env() -> String {
        dotenv::var("OLLAMA_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
    }

    pub fn model_from_env() -> String {
        dotenv::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string())
    }

    pub async fn complete(&self, prompt: &str) -> Result<String> {
        self.transport.complete(prompt).await
    }

    pub async fn health_check(&self) -> Result<()> {
        self.transport.health_check().await
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }
}

fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .context("Failed to create HTTP client")
}

/// Pull the generated text out of a provider envelope. Providers disagree on
/// where the text lives, so probe the known fields and fall back to the raw
/// body when none match.
fn extract_reply_text(raw: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(raw) else {
        return raw.trim().to_string();
    };

    // Ollama /api/generate
    if let Some(text) = json["response"].as_str() {
        return text.trim().to_string();
    }
    // OpenAI chat completions
    if let Some(text) = json["choices"]
        .get(0)
        .and_then(|c| c["message"]["content"].as_str())
    {
        return text.trim().to_string();
    }
    // OpenAI legacy completions
    if let Some(text) = json["choices"].get(0).and_then(|c| c["text"].as_str()) {
        return text.trim().to_string();
    }

    raw.trim().to_string()
}

/// Ollama `/api/generate` transport. Health check is `GET /api/tags`.
pub struct GenerateApi {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl GenerateApi {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Transport for GenerateApi {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "top_p": TOP_P,
                "num_predict": MAX_OUTPUT_TOKENS,
                "repeat_penalty": REPEAT_PENALTY,
            },
        });

        let url = format!("{}/api/generate", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read LLM response")?;
        if !status.is_success() {
            anyhow::bail!("Ollama API error: {}, {}", status, text);
        }

        Ok(extract_reply_text(&text))
    }

    async fn health_check(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await
            .with_context(|| format!("Cannot connect to Ollama API at {}", self.base_url))?;
        if !resp.status().is_success() {
            anyhow::bail!("Ollama API at {} returned {}", self.base_url, resp.status());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "generate"
    }
}

/// OpenAI-compatible chat-completions transport. Health check is `GET /health`
/// (the vLLM convention).
pub struct ChatApi {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl ChatApi {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        if self.base_url.ends_with("/chat/completions") {
            self.base_url.clone()
        } else if self.base_url.ends_with("/v1") {
            format!("{}/chat/completions", self.base_url)
        } else {
            format!("{}/v1/chat/completions", self.base_url)
        }
    }
}

#[async_trait]
impl Transport for ChatApi {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "stream": false,
            "temperature": TEMPERATURE,
            "top_p": TOP_P,
            "max_tokens": MAX_OUTPUT_TOKENS,
        });

        let resp = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .context("LLM request failed")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read LLM response")?;
        if !status.is_success() {
            anyhow::bail!("chat API error: {}, {}", status, text);
        }

        Ok(extract_reply_text(&text))
    }

    async fn health_check(&self) -> Result<()> {
        let health_base = self
            .base_url
            .trim_end_matches("/chat/completions")
            .trim_end_matches("/v1");
        let url = format!("{}/health", health_base);
        let resp = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECS))
            .send()
            .await
            .with_context(|| format!("Cannot connect to LLM API at {}", health_base))?;
        if !resp.status().is_success() {
            anyhow::bail!("LLM API at {} returned {}", health_base, resp.status());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "chat"
    }
}
