//! Local `claude` command-line backend. Needs no credential; the prompt goes
//! in on stdin and the document comes back on stdout.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use super::prompts;
use super::{GenerationRequest, ProviderError, ProviderKind, TextGenerator};

pub struct ClaudeCli {
    program: String,
    prefix_args: Vec<String>,
    model: String,
    timeout: Duration,
}

impl ClaudeCli {
    /// `command_line` may carry leading arguments, e.g. `npx claude`.
    pub fn new(command_line: &str, model: String, timeout: Duration) -> Result<Self, ProviderError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| ProviderError::Unavailable("no CLI command configured".to_string()))?;
        Ok(Self {
            program,
            prefix_args: parts.collect(),
            model,
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn run(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut child = Command::new(&self.program)
            .args(&self.prefix_args)
            .args(["-p", "--model", &self.model])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ProviderError::Unavailable(format!(
                    "'{}' was not found on PATH",
                    self.program
                )),
                _ => ProviderError::Unavailable(e.to_string()),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| ProviderError::Process(format!("writing prompt: {e}")))?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ProviderError::Timeout(self.timeout))?
            .map_err(|e| ProviderError::Process(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ProviderError::Process(if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            }));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| ProviderError::MalformedResponse("CLI output was not UTF-8".to_string()))
    }
}

#[async_trait]
impl TextGenerator for ClaudeCli {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        info!(program = %self.program, model = %self.model, kind = ?request.kind, "Generating with local CLI");
        let prompt = prompts::render(request).combined();
        let text = self.run(&prompt).await?;
        debug!(chars = text.len(), "CLI generation finished");

        if text.trim().is_empty() {
            return Err(ProviderError::MalformedResponse("CLI produced no output".to_string()));
        }
        Ok(text)
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::ClaudeCli
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(dir: &tempfile::TempDir, body: &str) -> String {
        let path = dir.path().join("fake-claude.sh");
        std::fs::write(&path, body).unwrap();
        format!("sh {}", path.display())
    }

    #[test]
    fn test_empty_command_is_unavailable() {
        assert!(matches!(
            ClaudeCli::new("   ", "m".to_string(), Duration::from_secs(1)),
            Err(ProviderError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let cli = ClaudeCli::new("jobdesk-no-such-cli", "m".to_string(), Duration::from_secs(5)).unwrap();
        let err = cli
            .generate(&GenerationRequest::tailored_resume("# R", "JD"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_prompt_is_sent_on_stdin() {
        let dir = tempfile::tempdir().unwrap();
        // Echo the model flag, then the prompt.
        let command = script(&dir, "echo \"model=$3\"\ncat\n");
        let cli = ClaudeCli::new(&command, "claude-test".to_string(), Duration::from_secs(5)).unwrap();
        let text = cli
            .generate(&GenerationRequest::tailored_resume("# Jane Master", "Rust role"))
            .await
            .unwrap();
        assert!(text.starts_with("model=claude-test"));
        assert!(text.contains("# Jane Master"));
        assert!(text.contains("You are an expert resume writer."));
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_process_error() {
        let dir = tempfile::tempdir().unwrap();
        let command = script(&dir, "cat >/dev/null\necho 'not logged in' >&2\nexit 3\n");
        let cli = ClaudeCli::new(&command, "m".to_string(), Duration::from_secs(5)).unwrap();
        let err = cli
            .generate(&GenerationRequest::tailored_resume("# R", "JD"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Process(ref m) if m == "not logged in"));
    }

    #[tokio::test]
    async fn test_slow_cli_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let command = script(&dir, "cat >/dev/null\nsleep 5\n");
        let cli = ClaudeCli::new(&command, "m".to_string(), Duration::from_millis(200)).unwrap();
        let err = cli
            .generate(&GenerationRequest::tailored_resume("# R", "JD"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));
    }
}
