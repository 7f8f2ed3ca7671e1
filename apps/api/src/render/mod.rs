//! Rendering collaborators: final document text in, binary artifact out.
//!
//! The pipeline treats renderers as black boxes behind `Renderer`. The shipped
//! implementation shells out to pandoc inside a scratch directory.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

use crate::documents::fields::{first_text, FieldMap};

/// Field keys that override the registry title on the rendered artifact.
const TITLE_KEYS: &[&str] = &["document_title", "title"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Docx,
    Pdf,
}

impl ArtifactFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Docx => "docx",
            ArtifactFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ArtifactFormat::Pdf => "application/pdf",
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to prepare render workspace: {0}")]
    Io(#[from] std::io::Error),

    #[error("Renderer '{program}' could not be started: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Renderer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Renderer produced an empty artifact")]
    Empty,
}

/// Turns final document text into one binary artifact.
#[async_trait]
pub trait Renderer: Send + Sync {
    fn format(&self) -> ArtifactFormat;

    /// `title` is the registry display title; fields may override it.
    async fn render(&self, title: &str, text: &str, fields: &FieldMap) -> Result<Bytes, RenderError>;
}

/// Picks the artifact title: an explicit field wins over the document type's title.
pub fn artifact_title(default_title: &str, fields: &FieldMap) -> String {
    first_text(fields, TITLE_KEYS).unwrap_or_else(|| default_title.to_string())
}

pub struct PandocRenderer {
    program: PathBuf,
    format: ArtifactFormat,
}

impl PandocRenderer {
    pub fn new(program: impl Into<PathBuf>, format: ArtifactFormat) -> Self {
        Self {
            program: program.into(),
            format,
        }
    }

    fn args(&self, input: &str, output: &str, title: &str) -> Vec<String> {
        // commonmark has no TeX math, so "$963 ... $1,000" survives the PDF path.
        vec![
            input.to_string(),
            "--from".to_string(),
            "commonmark+hard_line_breaks".to_string(),
            "--output".to_string(),
            output.to_string(),
            "--metadata".to_string(),
            format!("title={title}"),
        ]
    }
}

#[async_trait]
impl Renderer for PandocRenderer {
    fn format(&self) -> ArtifactFormat {
        self.format
    }

    async fn render(&self, title: &str, text: &str, fields: &FieldMap) -> Result<Bytes, RenderError> {
        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join("document.md");
        let output = scratch
            .path()
            .join(format!("document.{}", self.format.extension()));
        tokio::fs::write(&input, text).await?;

        let title = artifact_title(title, fields);
        let args = self.args(
            &input.to_string_lossy(),
            &output.to_string_lossy(),
            &title,
        );
        debug!("Rendering {} via {:?}", self.format.extension(), self.program);

        let result = Command::new(&self.program)
            .args(&args)
            .current_dir(scratch.path())
            .output()
            .await
            .map_err(|source| RenderError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        if !result.status.success() {
            return Err(RenderError::Failed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let artifact = tokio::fs::read(&output).await?;
        if artifact.is_empty() {
            return Err(RenderError::Empty);
        }
        Ok(Bytes::from(artifact))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_artifact_title_prefers_field_override() {
        let fields = json!({"document_title": "Amended Petition"})
            .as_object()
            .cloned()
            .unwrap();
        assert_eq!(artifact_title("Petition", &fields), "Amended Petition");
        assert_eq!(artifact_title("Petition", &FieldMap::new()), "Petition");
    }

    #[test]
    fn test_format_metadata() {
        assert_eq!(ArtifactFormat::Docx.extension(), "docx");
        assert_eq!(ArtifactFormat::Pdf.content_type(), "application/pdf");
        assert!(ArtifactFormat::Docx.content_type().contains("wordprocessingml"));
    }

    #[test]
    fn test_pandoc_args_carry_title_and_output() {
        let r = PandocRenderer::new("pandoc", ArtifactFormat::Pdf);
        let args = r.args("in.md", "out.pdf", "Petition for Dissolution of Marriage");
        assert_eq!(args[0], "in.md");
        assert!(args.windows(2).any(|w| w[0] == "--output" && w[1] == "out.pdf"));
        assert!(args.contains(&"title=Petition for Dissolution of Marriage".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let r = PandocRenderer::new("/nonexistent/pandoc-binary", ArtifactFormat::Docx);
        let err = r
            .render("Petition", "Body text.", &FieldMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::Spawn { .. }));
    }
}
