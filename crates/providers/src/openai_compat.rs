//! OpenAI-compatible reasoning capability.
//!
//! Works with OpenAI, OpenRouter, Ollama, vLLM, and any endpoint exposing
//! `/chat/completions` with function calling.
//!
//! Ledger messages are rendered as chat messages:
//! - human messages become `user` turns prefixed with the speaker id
//! - mediator messages and tool results become `assistant` turns, so the
//!   model sees the formatted text of what it already sent

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use weaver_core::capability::{
    Reply, ReasoningCapability, ReasoningRequest, ReasoningResponse, ToolSpec, Usage,
};
use weaver_core::error::ReasoningError;
use weaver_core::message::{Message, MessageKind};
use weaver_core::tool::ToolCall;

/// A reasoning capability backed by an OpenAI-compatible endpoint.
pub struct OpenAiCompatCapability {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl OpenAiCompatCapability {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            client,
        }
    }

    /// OpenAI convenience constructor.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new("openai", "https://api.openai.com/v1", api_key, model)
    }

    /// Ollama convenience constructor.
    pub fn ollama(base_url: Option<&str>, model: impl Into<String>) -> Self {
        Self::new(
            "ollama",
            base_url.unwrap_or("http://localhost:11434/v1"),
            "ollama", // Ollama doesn't need a real key
            model,
        )
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Render the system instruction and ledger view into chat messages.
    fn to_api_messages(system_instruction: &str, messages: &[Message]) -> Vec<ApiMessage> {
        let mut api = Vec::with_capacity(messages.len() + 1);
        api.push(ApiMessage {
            role: "system".into(),
            content: Some(system_instruction.to_string()),
            tool_calls: None,
        });
        api.extend(messages.iter().map(|m| match m.kind {
            MessageKind::Human => ApiMessage {
                role: "user".into(),
                content: Some(format!("{}: {}", m.speaker, m.content)),
                tool_calls: None,
            },
            MessageKind::Mediator | MessageKind::ToolResult => ApiMessage {
                role: "assistant".into(),
                content: Some(m.content.clone()),
                tool_calls: None,
            },
        }));
        api
    }

    /// Convert tool specs to OpenAI function definitions.
    fn to_api_tools(tools: &[ToolSpec]) -> Vec<ApiToolDefinition> {
        tools
            .iter()
            .map(|t| ApiToolDefinition {
                r#type: "function".into(),
                function: ApiToolFunction {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }

    /// Map a completion choice to a terminal text or ordered tool requests.
    fn to_reply(message: ApiMessage) -> Reply {
        let content = message.content.unwrap_or_default();
        let calls: Vec<ToolCall> = message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                // Unparseable arguments reach the tool as a raw string and fail validation there
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments)),
            })
            .collect();

        if calls.is_empty() {
            Reply::Text {
                content,
                visibility: None,
            }
        } else {
            Reply::ToolCalls { content, calls }
        }
    }
}

#[async_trait]
impl ReasoningCapability for OpenAiCompatCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn reason(
        &self,
        request: ReasoningRequest,
    ) -> std::result::Result<ReasoningResponse, ReasoningError> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(&request.system_instruction, &request.messages),
            "temperature": self.temperature,
            "stream": false,
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        debug!(capability = %self.name, model = %self.model, messages = request.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout(e.to_string())
                } else {
                    ReasoningError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ReasoningError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(ReasoningError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Backend returned error");
            return Err(ReasoningError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ReasoningError::InvalidResponse("No choices in response".into()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ReasoningResponse {
            reply: Self::to_reply(choice.message),
            usage,
            model: api_response.model,
        })
    }

    async fn health_check(&self) -> std::result::Result<bool, ReasoningError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| ReasoningError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ApiToolCall>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    r#type: String,
    function: ApiFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunction {
    name: String,
    arguments: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolDefinition {
    r#type: String,
    function: ApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use weaver_core::message::Visibility;

    #[test]
    fn openai_constructor() {
        let capability = OpenAiCompatCapability::openai("sk-test", "gpt-4o-mini");
        assert_eq!(capability.name(), "openai");
        assert!(capability.base_url.contains("api.openai.com"));
    }

    #[test]
    fn ollama_constructor_trims_slash() {
        let capability = OpenAiCompatCapability::ollama(Some("http://box:11434/v1/"), "llama3");
        assert_eq!(capability.name(), "ollama");
        assert_eq!(capability.base_url, "http://box:11434/v1");
    }

    #[test]
    fn message_conversion_prefixes_speakers() {
        let messages = vec![
            Message::human("jane".into(), "Hello"),
            Message::tool_result(
                "send_private",
                "c1",
                "[private -> bob] hi",
                Visibility::PrivateTo("bob".into()),
            ),
            Message::mediator("Welcome"),
        ];
        let api = OpenAiCompatCapability::to_api_messages("SYSTEM", &messages);
        assert_eq!(api.len(), 4);
        assert_eq!(api[0].role, "system");
        assert_eq!(api[0].content.as_deref(), Some("SYSTEM"));
        assert_eq!(api[1].role, "user");
        assert_eq!(api[1].content.as_deref(), Some("jane: Hello"));
        assert_eq!(api[2].role, "assistant");
        assert_eq!(api[2].content.as_deref(), Some("[private -> bob] hi"));
        assert_eq!(api[3].role, "assistant");
    }

    #[test]
    fn tool_spec_conversion() {
        let tools = vec![ToolSpec {
            name: "post_shared".into(),
            description: "Post to everyone".into(),
            parameters: serde_json::json!({"type": "object"}),
        }];
        let api_tools = OpenAiCompatCapability::to_api_tools(&tools);
        assert_eq!(api_tools.len(), 1);
        assert_eq!(api_tools[0].function.name, "post_shared");
        assert_eq!(api_tools[0].r#type, "function");
    }

    #[test]
    fn plain_completion_is_terminal_text() {
        let data = r#"{"model":"gpt-4o-mini","choices":[{"message":{"role":"assistant","content":"Hi Jane"}}],"usage":{"prompt_tokens":10,"completion_tokens":3,"total_tokens":13}}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.usage.as_ref().unwrap().total_tokens, 13);
        let choice = parsed.choices.into_iter().next().unwrap();
        assert_eq!(OpenAiCompatCapability::to_reply(choice.message), Reply::text("Hi Jane"));
    }

    #[test]
    fn tool_call_completion_keeps_order() {
        let data = r#"{"model":"m","choices":[{"message":{"role":"assistant","content":null,"tool_calls":[
            {"id":"call_a","type":"function","function":{"name":"send_private","arguments":"{\"recipient\":\"bob\",\"content\":\"secret\"}"}},
            {"id":"call_b","type":"function","function":{"name":"post_shared","arguments":"{\"content\":\"Let's move on\"}"}}
        ]}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.usage.is_none());
        let choice = parsed.choices.into_iter().next().unwrap();
        match OpenAiCompatCapability::to_reply(choice.message) {
            Reply::ToolCalls { content, calls } => {
                assert!(content.is_empty());
                assert_eq!(calls.len(), 2);
                assert_eq!(calls[0].name, "send_private");
                assert_eq!(calls[0].arguments["recipient"], "bob");
                assert_eq!(calls[1].id, "call_b");
            }
            other => panic!("expected tool calls, got {other:?}"),
        }
    }

    #[test]
    fn malformed_arguments_are_kept_raw() {
        let message = ApiMessage {
            role: "assistant".into(),
            content: None,
            tool_calls: Some(vec![ApiToolCall {
                id: "c1".into(),
                r#type: "function".into(),
                function: ApiFunction {
                    name: "post_shared".into(),
                    arguments: "{not json".into(),
                },
            }]),
        };
        match OpenAiCompatCapability::to_reply(message) {
            Reply::ToolCalls { calls, .. } => {
                assert_eq!(calls[0].arguments, serde_json::Value::String("{not json".into()));
            }
            other => panic!("expected tool calls, got {other:?}"),
        }
    }
}
