use crate::tools::registry::{Tool, ToolContext};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

/// The `append_to_state` capability: grows an accumulator key.
pub struct AppendToStateTool;

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| AppError::InvalidInput(format!("Missing '{}' parameter", key)))
}

#[async_trait]
impl Tool for AppendToStateTool {
    fn name(&self) -> &str {
        "append_to_state"
    }

    fn description(&self) -> &str {
        "Append a finding to a list field in the shared court record"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "field": {
                    "type": "string",
                    "description": "State field to append to, e.g. pos_data or neg_data"
                },
                "response": {
                    "type": "string",
                    "description": "The finding to record"
                }
            },
            "required": ["field", "response"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let field = required_str(&args, "field")?.trim();
        if field.is_empty() {
            return Err(AppError::InvalidInput("'field' must not be empty".to_string()));
        }
        let response = required_str(&args, "response")?;

        let len = ctx.state().append(field, response)?;
        tracing::info!(agent = ctx.agent(), entries = len, "[Added to {}] {}", field, response);

        Ok(json!({"status": "success", "field": field, "entries": len}))
    }
}
