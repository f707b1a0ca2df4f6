use serde::{Deserialize, Serialize};

// ============= Tool Types =============

/// Capability descriptor sent to the model alongside a request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A capability invocation requested by the model.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    /// The model answered successfully but the body carried no usable reply.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Persist error: {0}")]
    Persist(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    /// An error raised inside a named unit of the pipeline.
    ///
    /// `path` lists the units from the outermost inwards, e.g.
    /// `historical_court_system > trial_review_loop > judge`.
    #[error("{path}: {source}")]
    Agent {
        path: String,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Attribute this error to the unit `name`.
    ///
    /// Errors already attributed to an inner unit get `name` prepended to
    /// their path instead of being wrapped a second time.
    pub fn within(self, name: &str) -> Self {
        match self {
            AppError::Agent { path, source } => AppError::Agent {
                path: format!("{} > {}", name, path),
                source,
            },
            other => AppError::Agent {
                path: name.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The unit path of an attributed error, if any.
    pub fn agent_path(&self) -> Option<&str> {
        match self {
            AppError::Agent { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The innermost, unattributed error.
    pub fn root_cause(&self) -> &AppError {
        match self {
            AppError::Agent { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Tool(format!("HTTP request failed: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_wraps_plain_error() {
        let err = AppError::LLM("connection refused".to_string()).within("judge");
        assert_eq!(err.agent_path(), Some("judge"));
        assert_eq!(err.to_string(), "judge: LLM error: connection refused");
    }

    #[test]
    fn test_within_extends_existing_path() {
        let err = AppError::LLM("timeout".to_string())
            .within("judge")
            .within("trial_review_loop")
            .within("historical_court_system");

        assert_eq!(
            err.agent_path(),
            Some("historical_court_system > trial_review_loop > judge")
        );
        assert!(matches!(err.root_cause(), AppError::LLM(msg) if msg == "timeout"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: AppError = io_err.into();
        assert!(err.to_string().contains("read-only"));
        assert!(err.agent_path().is_none());
    }
}
