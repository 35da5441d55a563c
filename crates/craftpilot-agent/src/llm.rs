//! Completion client for an OpenAI-compatible local server (LM Studio).
//!
//! The orchestrator only sees the `CompletionClient` trait; tests swap in a
//! canned implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use craftpilot_core::config::LlmConfig;
use craftpilot_core::{PlannerMode, TaskSettings};

use crate::error::AgentError;

/// Opaque text-in/text-out completion request.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        settings: &TaskSettings,
    ) -> Result<String, AgentError>;
}

/// Build the system prompt instructing the model which payload shape to
/// produce for the given planner mode.
pub fn build_system_prompt(mode: PlannerMode) -> String {
    let mut prompt = String::from(
        "You are an AI assistant that controls a Minecraft player. \
         Your goal is to help complete tasks in Minecraft.\n\n\
         Available capabilities:\n\
         - Movement and pathfinding (using Baritone)\n\
         - Mining blocks\n\
         - Placing blocks\n\
         - Crafting items\n\
         - Smelting items\n\
         - Managing inventory\n\
         - Interacting with entities and blocks\n\n",
    );

    match mode {
        PlannerMode::HighLevel => prompt.push_str(
            "Output Format: Provide high-level commands in JSON format.\n\
             Example:\n\
             {\n\
             \x20 \"commands\": [\n\
             \x20   {\"action\": \"mine\", \"target\": \"diamond_ore\", \"quantity\": 5},\n\
             \x20   {\"action\": \"craft\", \"item\": \"diamond_pickaxe\", \"quantity\": 1}\n\
             \x20 ]\n\
             }",
        ),
        PlannerMode::LowLevel => prompt.push_str(
            "Output Format: Provide detailed step-by-step actions in JSON format.\n\
             Example:\n\
             {\n\
             \x20 \"actions\": [\n\
             \x20   {\"type\": \"goto\", \"x\": 100, \"y\": 64, \"z\": 200},\n\
             \x20   {\"type\": \"mine\", \"x\": 100, \"y\": 64, \"z\": 200},\n\
             \x20   {\"type\": \"open_inventory\"},\n\
             \x20   {\"type\": \"craft\", \"recipe\": \"diamond_pickaxe\"}\n\
             \x20 ]\n\
             }",
        ),
        PlannerMode::Hybrid => prompt.push_str(
            "Output Format: Provide a mix of high-level goals and specific actions \
             as needed in JSON format.\n\
             Example:\n\
             {\n\
             \x20 \"plan\": [\n\
             \x20   {\"type\": \"goal\", \"description\": \"Find and mine 5 diamond ore\", \"actions\": [\n\
             \x20     {\"type\": \"goto\", \"target\": \"diamond_ore\"},\n\
             \x20     {\"type\": \"mine\", \"target\": \"diamond_ore\", \"quantity\": 5}\n\
             \x20   ]},\n\
             \x20   {\"type\": \"goal\", \"description\": \"Craft diamond pickaxe\", \"actions\": [\n\
             \x20     {\"type\": \"craft\", \"recipe\": \"diamond_pickaxe\"}\n\
             \x20   ]}\n\
             \x20 ]\n\
             }",
        ),
    }

    prompt
}

// =============================================================================
// LM Studio client
// =============================================================================

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// HTTP client for LM Studio's OpenAI-compatible chat completions endpoint.
pub struct LmStudioClient {
    http: reqwest::Client,
    base_url: String,
    default_model: String,
}

impl LmStudioClient {
    /// Build a client from the `[llm]` config section.
    pub fn new(config: &LlmConfig) -> Result<Self, AgentError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_model: config.default_model.clone(),
        })
    }
}

#[async_trait]
impl CompletionClient for LmStudioClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        settings: &TaskSettings,
    ) -> Result<String, AgentError> {
        // Submissions that leave the model blank use the configured default.
        let model = if settings.model.is_empty() {
            &self.default_model
        } else {
            &settings.model
        };
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(%url, model, "Requesting completion");

        let response = self.http.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(AgentError::Completion(format!(
                "completion endpoint returned {}",
                response.status()
            )));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AgentError::Completion("response contained no choices".into()))?;
        Ok(content)
    }
}
