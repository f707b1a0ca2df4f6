use crate::llm::client::{build_http_client, ClientOptions, LLMClient, LLMResponse, TokenUsage};
use crate::llm::coordinator::{ConversationMessage, MessageRole};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Client for a local Ollama server's `/api/chat` endpoint.
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, options: &ClientOptions) -> Result<Self> {
        Ok(Self {
            http: build_http_client(options)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature: options.temperature,
        })
    }

    fn to_wire_message(message: &ConversationMessage) -> Value {
        match message.role {
            MessageRole::Assistant if !message.tool_calls.is_empty() => {
                let tool_calls: Vec<Value> = message
                    .tool_calls
                    .iter()
                    .map(|tc| {
                        json!({
                            "function": {
                                "name": tc.name,
                                "arguments": tc.arguments
                            }
                        })
                    })
                    .collect();
                json!({
                    "role": "assistant",
                    "content": message.content,
                    "tool_calls": tool_calls
                })
            }
            role => json!({
                "role": role.as_str(),
                "content": message.content
            }),
        }
    }

    fn parse_response(json: &Value) -> Result<LLMResponse> {
        let message = json
            .get("message")
            .ok_or_else(|| AppError::MalformedResponse("No message in Ollama response".into()))?;

        let content = message
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let mut tool_calls = Vec::new();
        let mut finish_reason = "stop".to_string();

        if let Some(tc_array) = message.get("tool_calls").and_then(|v| v.as_array()) {
            for tc in tc_array {
                let Some(func) = tc.get("function") else {
                    continue;
                };
                let name = func
                    .get("name")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string();
                if name.is_empty() {
                    continue;
                }
                tool_calls.push(ToolCall {
                    id: uuid::Uuid::new_v4().to_string(),
                    name,
                    arguments: parse_arguments(func.get("arguments")),
                });
            }
            if !tool_calls.is_empty() {
                finish_reason = "tool_calls".to_string();
            }
        }

        if tool_calls.is_empty() {
            if let Some(reason) = json.get("done_reason").and_then(|v| v.as_str()) {
                finish_reason = reason.to_string();
            }
        }

        let usage = match (
            json.get("prompt_eval_count").and_then(|v| v.as_u64()),
            json.get("eval_count").and_then(|v| v.as_u64()),
        ) {
            (Some(prompt), Some(completion)) => Some(TokenUsage::new(prompt as u32, completion as u32)),
            _ => None,
        };

        Ok(LLMResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

/// Arguments arrive as an object, or as a JSON-encoded string from some
/// models. Anything else becomes `{}`.
pub(crate) fn parse_arguments(raw: Option<&Value>) -> Value {
    match raw {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => json!({}),
        },
        _ => json!({}),
    }
}

pub(crate) fn tool_schemas(tools: &[ToolDefinition]) -> Vec<Value> {
    tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters
                }
            })
        })
        .collect()
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let wire_messages: Vec<Value> = messages.iter().map(Self::to_wire_message).collect();

        let mut body = json!({
            "model": self.model,
            "messages": wire_messages,
            "stream": false,
            "options": {
                "temperature": self.temperature
            }
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tool_schemas(tools));
        }

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "Ollama request failed ({}): {}",
                status, text
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| {
                AppError::MalformedResponse(format!("Failed to parse Ollama response: {}", e))
            })?;

        Self::parse_response(&json)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_calls() {
        let json = json!({
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [
                    {"function": {"name": "wikipedia", "arguments": {"query": "Nikola Tesla"}}},
                    {"function": {"name": "append_to_state", "arguments": "{\"field\":\"pos_data\",\"response\":\"AC motor\"}"}}
                ]
            },
            "done": true,
            "prompt_eval_count": 120,
            "eval_count": 30
        });

        let response = OllamaClient::parse_response(&json).unwrap();
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].arguments["query"], "Nikola Tesla");
        assert_eq!(response.tool_calls[1].arguments["field"], "pos_data");
        assert_ne!(response.tool_calls[0].id, response.tool_calls[1].id);
        assert_eq!(response.finish_reason, "tool_calls");
        assert_eq!(response.usage, Some(TokenUsage::new(120, 30)));
    }

    #[test]
    fn test_parse_missing_message() {
        let err = OllamaClient::parse_response(&json!({"done": true})).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_arguments_fallbacks() {
        assert_eq!(parse_arguments(None), json!({}));
        assert_eq!(parse_arguments(Some(&json!("not json"))), json!({}));
        assert_eq!(parse_arguments(Some(&json!([1, 2]))), json!({}));
    }

    #[test]
    fn test_wire_message_with_tool_calls() {
        let message = ConversationMessage::assistant(
            "",
            vec![ToolCall {
                id: "1".to_string(),
                name: "exit_loop".to_string(),
                arguments: json!({}),
            }],
        );
        let wire = OllamaClient::to_wire_message(&message);
        assert_eq!(wire["tool_calls"][0]["function"]["name"], "exit_loop");

        let wire = OllamaClient::to_wire_message(&ConversationMessage::user("hi"));
        assert_eq!(wire["role"], "user");
        assert!(wire.get("tool_calls").is_none());
    }
}
