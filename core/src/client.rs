use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::trace;

use autoquest_protocol::ContentItem;
use autoquest_protocol::ResponseItem;
use autoquest_protocol::TokenUsage;

use crate::config::Config;
use crate::error::PlayerErr;
use crate::error::Result;
use crate::openai_tools;

/// Non-streaming client for the OpenAI Responses API. One awaited call per
/// exchange; there is never more than one request in flight.
#[derive(Debug, Clone)]
pub struct ModelClient {
    client: reqwest::Client,
    config: Config,
}

/// A fully parsed model response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelResponse {
    pub output: Vec<ResponseItem>,
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    /// Concatenated text of every message output segment, in order.
    pub fn output_text(&self) -> String {
        let mut collected = String::new();
        for item in &self.output {
            if let ResponseItem::Message { content, .. } = item {
                for piece in content {
                    if let ContentItem::OutputText { text } = piece {
                        collected.push_str(text);
                    }
                }
            }
        }
        collected
    }
}

#[derive(Debug, Serialize)]
struct ResponsesApiRequest<'a> {
    model: &'a str,
    input: &'a [ResponseItem],
    tools: &'a [serde_json::Value],
    tool_choice: &'static str,
    parallel_tool_calls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<Reasoning>,
    store: bool,
    stream: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Reasoning {
    effort: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
struct ResponsesApiResponse {
    #[serde(default)]
    output: Vec<ResponseItem>,
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    #[serde(default)]
    input_tokens: i64,
    input_tokens_details: Option<InputTokensDetails>,
    #[serde(default)]
    output_tokens: i64,
    output_tokens_details: Option<OutputTokensDetails>,
    #[serde(default)]
    total_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct InputTokensDetails {
    #[serde(default)]
    cached_tokens: i64,
}

#[derive(Debug, Deserialize)]
struct OutputTokensDetails {
    #[serde(default)]
    reasoning_tokens: i64,
}

impl From<ResponseUsage> for TokenUsage {
    fn from(usage: ResponseUsage) -> Self {
        TokenUsage {
            input_tokens: usage.input_tokens,
            cached_input_tokens: usage
                .input_tokens_details
                .map(|details| details.cached_tokens)
                .unwrap_or_default(),
            output_tokens: usage.output_tokens,
            reasoning_output_tokens: usage
                .output_tokens_details
                .map(|details| details.reasoning_tokens)
                .unwrap_or_default(),
            total_tokens: usage.total_tokens,
        }
    }
}

impl ModelClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }

    /// One play exchange: memory tools offered, tool choice left to the
    /// model. Exactly one attempt; a transport failure is the caller's to
    /// handle.
    pub async fn play_request(&self, input: &[ResponseItem]) -> Result<ModelResponse> {
        let tools = openai_tools::memory_tools();
        let tools_json = openai_tools::create_tools_json_for_responses_api(&tools)?;
        let payload = ResponsesApiRequest {
            model: &self.config.model,
            input,
            tools: &tools_json,
            tool_choice: "auto",
            parallel_tool_calls: false,
            reasoning: reasoning_param(&self.config.model, true),
            store: true,
            stream: false,
        };
        self.post(&payload, self.config.request_timeout).await
    }

    /// One summarization exchange: no tools, long timeout, nothing stored
    /// server-side.
    pub async fn summary_request(&self, input: &[ResponseItem]) -> Result<ModelResponse> {
        let payload = ResponsesApiRequest {
            model: &self.config.summary_model,
            input,
            tools: &[],
            tool_choice: "none",
            parallel_tool_calls: false,
            reasoning: reasoning_param(&self.config.summary_model, false),
            store: false,
            stream: false,
        };
        self.post(&payload, self.config.summary_timeout).await
    }

    async fn post(
        &self,
        payload: &ResponsesApiRequest<'_>,
        timeout: Duration,
    ) -> Result<ModelResponse> {
        let url = format!("{}/responses", self.config.base_url.trim_end_matches('/'));
        trace!("POST to {url} (model {})", payload.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .timeout(timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlayerErr::UnexpectedStatus { status, body });
        }

        let parsed: ResponsesApiResponse = response.json().await?;
        Ok(ModelResponse {
            output: parsed.output,
            usage: parsed.usage.map(Into::into),
        })
    }
}

/// Reasoning summaries only exist on reasoning-capable model families; other
/// slugs reject the parameter outright.
fn supports_reasoning(model: &str) -> bool {
    model.starts_with('o') || model.starts_with("gpt-5") || model.starts_with("codex")
}

fn reasoning_param(model: &str, want_summary: bool) -> Option<Reasoning> {
    if !supports_reasoning(model) {
        return None;
    }
    Some(Reasoning {
        effort: "medium",
        summary: want_summary.then_some("auto"),
    })
}
