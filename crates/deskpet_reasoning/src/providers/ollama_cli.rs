//! Ollama subprocess provider
//!
//! Runs `ollama run <model>` with the prompt on stdin and returns its stdout.
//! Useful where the HTTP server is not running but the binary is installed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use deskpet_core::TextGenerator;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct OllamaCli {
    program: String,
    args: Vec<String>,
}

impl OllamaCli {
    pub fn new(binary: &str, model: &str) -> Self {
        Self::with_command(binary, ["run", model])
    }

    /// Arbitrary command that reads a prompt on stdin and writes a reply to stdout
    pub fn with_command<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaCli {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start {}", self.program))?;

        if let Some(mut stdin) = child.stdin.take() {
            // The child may exit before reading its stdin
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(e).context("Failed to write prompt");
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("Failed to wait for {}", self.program))?;

        if !output.status.success() {
            anyhow::bail!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}
