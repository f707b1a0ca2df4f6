use crate::llm::client::{build_http_client, ClientOptions, LLMClient, LLMResponse, TokenUsage};
use crate::llm::coordinator::{ConversationMessage, MessageRole};
use crate::llm::ollama::{parse_arguments, tool_schemas};
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
}

impl OpenAIClient {
    pub fn new(
        api_key: String,
        api_base: String,
        model: String,
        options: &ClientOptions,
    ) -> Result<Self> {
        Ok(Self {
            http: build_http_client(options)?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
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
                            "id": tc.id,
                            "type": "function",
                            "function": {
                                "name": tc.name,
                                "arguments": tc.arguments.to_string()
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
            MessageRole::Tool => json!({
                "role": "tool",
                "tool_call_id": message.tool_call_id,
                "content": message.content
            }),
            role => json!({
                "role": role.as_str(),
                "content": message.content
            }),
        }
    }

    fn parse_response(json: &Value) -> Result<LLMResponse> {
        let choice = json
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| AppError::MalformedResponse("No choices in OpenAI response".to_string()))?;
        let message = choice
            .get("message")
            .ok_or_else(|| AppError::MalformedResponse("No message in OpenAI response".to_string()))?;

        let content = message
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let tool_calls = message
            .get("tool_calls")
            .and_then(|v| v.as_array())
            .map(|calls| {
                calls
                    .iter()
                    .filter_map(|tc| {
                        let func = tc.get("function")?;
                        let name = func.get("name")?.as_str()?.to_string();
                        let id = tc
                            .get("id")
                            .and_then(|v| v.as_str())
                            .map(String::from)
                            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
                        Some(ToolCall {
                            id,
                            name,
                            arguments: parse_arguments(func.get("arguments")),
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let finish_reason = choice
            .get("finish_reason")
            .and_then(|v| v.as_str())
            .unwrap_or("stop")
            .to_string();

        let usage = json.get("usage").map(|u| {
            TokenUsage::new(
                u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
                u.get("completion_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            )
        });

        Ok(LLMResponse {
            content,
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let wire_messages: Vec<Value> = messages.iter().map(Self::to_wire_message).collect();

        let mut body = json!({
            "model": self.model,
            "messages": wire_messages,
            "temperature": self.temperature
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tool_schemas(tools));
            body["tool_choice"] = json!("auto");
        }

        let url = format!("{}/chat/completions", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::LLM(format!("OpenAI API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::LLM(format!(
                "OpenAI API error ({}): {}",
                status, text
            )));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| {
                AppError::MalformedResponse(format!("Failed to parse OpenAI response: {}", e))
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
    fn test_parse_tool_call_response() {
        let json = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "exit_loop", "arguments": "{}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 50, "completion_tokens": 5, "total_tokens": 55}
        });

        let response = OpenAIClient::parse_response(&json).unwrap();
        assert_eq!(response.content, "");
        assert_eq!(response.tool_calls[0].id, "call_abc");
        assert_eq!(response.tool_calls[0].name, "exit_loop");
        assert_eq!(response.finish_reason, "tool_calls");
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(55));
    }

    #[test]
    fn test_parse_empty_choices() {
        let err = OpenAIClient::parse_response(&json!({"choices": []})).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));

        let err = OpenAIClient::parse_response(&json!({"choices": [{"index": 0}]})).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn test_tool_message_carries_call_id() {
        let msg = ConversationMessage::tool_result("call_abc", &json!({"status": "success"}));
        let wire = OpenAIClient::to_wire_message(&msg);
        assert_eq!(wire["tool_call_id"], "call_abc");
        assert_eq!(wire["role"], "tool");
    }
}
