use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("PDF converter '{0}' is not available")]
    Unavailable(String),

    #[error("PDF converter failed: {0}")]
    Failed(String),

    #[error("PDF converter produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("PDF conversion took longer than {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("document file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a markdown file into a PDF next to it (same stem, `.pdf`).
#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, markdown: &Path) -> Result<PathBuf, ConversionError>;
}

/// Runs an external markdown-to-PDF command, `md-to-pdf` by default.
pub struct MarkdownToPdf {
    program: String,
    prefix_args: Vec<String>,
    timeout: Duration,
}

impl MarkdownToPdf {
    /// `command_line` may carry leading arguments, e.g. `npx md-to-pdf`.
    pub fn new(command_line: &str, timeout: Duration) -> Self {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        MarkdownToPdf {
            program: parts.next().unwrap_or_default(),
            prefix_args: parts.collect(),
            timeout,
        }
    }
}

#[async_trait]
impl PdfConverter for MarkdownToPdf {
    async fn convert(&self, markdown: &Path) -> Result<PathBuf, ConversionError> {
        if self.program.is_empty() {
            return Err(ConversionError::Unavailable("(none configured)".to_string()));
        }
        let output_path = markdown.with_extension("pdf");
        info!(input = %markdown.display(), "Converting markdown to PDF");

        let mut command = Command::new(&self.program);
        command
            .args(&self.prefix_args)
            .arg(markdown)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = markdown.parent() {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConversionError::Unavailable(self.program.clone()),
            _ => ConversionError::Failed(e.to_string()),
        })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ConversionError::Timeout(self.timeout))??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ConversionError::Failed(if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            }));
        }

        if !tokio::fs::try_exists(&output_path).await? {
            return Err(ConversionError::MissingOutput(output_path));
        }
        debug!(output = %output_path.display(), "PDF written");
        Ok(output_path)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn markdown_in(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("resume.md");
        std::fs::write(&path, "# Sam Lee").unwrap();
        path
    }

    #[tokio::test]
    async fn test_missing_tool_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let converter = MarkdownToPdf::new("jobdesk-no-such-converter", Duration::from_secs(5));
        let err = converter.convert(&markdown_in(&dir)).await.unwrap_err();
        assert!(matches!(err, ConversionError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_script_converter_writes_sibling_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("convert.sh");
        std::fs::write(&script, "cp \"$1\" \"${1%.md}.pdf\"\n").unwrap();
        let converter =
            MarkdownToPdf::new(&format!("sh {}", script.display()), Duration::from_secs(5));

        let pdf = converter.convert(&markdown_in(&dir)).await.unwrap();
        assert_eq!(pdf, dir.path().join("resume.pdf"));
        assert_eq!(std::fs::read_to_string(pdf).unwrap(), "# Sam Lee");
    }

    #[tokio::test]
    async fn test_zero_exit_without_output_is_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let converter = MarkdownToPdf::new("true", Duration::from_secs(5));
        let err = converter.convert(&markdown_in(&dir)).await.unwrap_err();
        assert!(matches!(err, ConversionError::MissingOutput(_)));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let converter = MarkdownToPdf::new("false", Duration::from_secs(5));
        let err = converter.convert(&markdown_in(&dir)).await.unwrap_err();
        assert!(matches!(err, ConversionError::Failed(_)));
    }

    #[tokio::test]
    async fn test_slow_converter_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow.sh");
        std::fs::write(&script, "sleep 5\n").unwrap();
        let converter =
            MarkdownToPdf::new(&format!("sh {}", script.display()), Duration::from_millis(200));
        let err = converter.convert(&markdown_in(&dir)).await.unwrap_err();
        assert!(matches!(err, ConversionError::Timeout(_)));
    }
}
