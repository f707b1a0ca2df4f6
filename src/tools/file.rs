use crate::state::TOPIC_KEY;
use crate::tools::registry::{Tool, ToolContext};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};

/// The `write_file` capability: persists a report under a fixed output root.
///
/// `directory` is resolved relative to the root and may not leave it. The
/// filename is reduced to a lowercase slug; an empty one falls back to the
/// slug of the current `TOPIC`.
pub struct WriteFileTool {
    root: PathBuf,
}

impl WriteFileTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve_directory(&self, directory: &str) -> Result<PathBuf> {
        let relative = Path::new(directory.trim());
        let mut resolved = self.root.clone();

        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(AppError::InvalidInput(format!(
                        "directory '{}' must be relative to the output root",
                        directory
                    )));
                }
            }
        }
        Ok(resolved)
    }
}

/// Lowercase ASCII slug: alphanumerics kept, every other run becomes `_`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// Safe report filename from a model-supplied name, with `topic` as fallback.
pub fn safe_filename(raw: &str, topic: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, slugify(ext)),
        _ => (base, String::new()),
    };

    let mut stem = slugify(stem);
    if stem.is_empty() {
        stem = slugify(topic);
    }
    if stem.is_empty() {
        stem = "report".to_string();
    }

    let ext = if ext.is_empty() { "txt".to_string() } else { ext };
    format!("{}.{}", stem, ext)
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Save text content to a file in the given directory, overwriting any previous version"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Relative directory to save into, e.g. court_reports"
                },
                "filename": {
                    "type": "string",
                    "description": "File name, e.g. topic_name.txt"
                },
                "content": {
                    "type": "string",
                    "description": "Full text to write"
                }
            },
            "required": ["directory", "filename", "content"]
        })
    }

    async fn execute(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let content = args
            .get("content")
            .and_then(|v| v.as_str())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::InvalidInput("'content' must not be empty".to_string()))?;
        let directory = args.get("directory").and_then(|v| v.as_str()).unwrap_or("");
        let filename = args.get("filename").and_then(|v| v.as_str()).unwrap_or("");

        let topic = ctx.state().get_text(TOPIC_KEY).unwrap_or_default();
        let dir = self.resolve_directory(directory)?;
        let name = safe_filename(filename, &topic);
        let target = dir.join(&name);

        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Persist(format!("cannot create {}: {}", dir.display(), e))
        })?;

        let tmp = dir.join(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&tmp, content.as_bytes()).await {
            return Err(AppError::Persist(format!(
                "cannot write {}: {}",
                target.display(),
                e
            )));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &target).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(AppError::Persist(format!(
                "cannot replace {}: {}",
                target.display(),
                e
            )));
        }

        tracing::info!(agent = ctx.agent(), path = %target.display(), bytes = content.len(), "Report written");

        Ok(json!({
            "status": "success",
            "path": target.to_string_lossy(),
            "bytes": content.len()
        }))
    }
}
