//! Advanced conversion via an external parsing tool.
//!
//! Shells out to a configured command (a MinerU-class document parser)
//! that reads the source file and writes Markdown to stdout. The source
//! bytes are staged in a private temp directory for the duration of the
//! run; the directory is removed when the conversion returns.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::config::AdvancedConfig;
use crate::convert::{Converter, Markdown, SourceDocument};
use crate::error::{MarkifyError, Result};

pub struct AdvancedConverter {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl AdvancedConverter {
    pub fn new(config: &AdvancedConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Locate the configured command on PATH.
    pub fn find_tool(&self) -> Option<PathBuf> {
        which::which(&self.command).ok()
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[async_trait]
impl Converter for AdvancedConverter {
    async fn convert(&self, doc: SourceDocument) -> Result<Markdown> {
        let title = doc.stem();

        // Stage the bytes under the original file name so the tool can use
        // the extension for format detection. Only the final path component
        // is kept; uploads must not escape the temp directory.
        let dir = tempfile::tempdir()
            .map_err(|e| MarkifyError::Conversion(format!("failed to stage input: {e}")))?;
        let staged_name = std::path::Path::new(&doc.filename)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "input".into());
        let input_path = dir.path().join(staged_name);
        tokio::fs::write(&input_path, &doc.content)
            .await
            .map_err(|e| MarkifyError::Conversion(format!("failed to stage input: {e}")))?;

        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg(&input_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                MarkifyError::Conversion(format!(
                    "'{}' timed out after {}s",
                    self.command,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                MarkifyError::Conversion(format!("failed to run '{}': {e}", self.command))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MarkifyError::Conversion(format!(
                "'{}' exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8(output.stdout).map_err(|_| {
            MarkifyError::Conversion(format!("'{}' produced non-UTF-8 output", self.command))
        })?;

        Ok(Markdown { title, text })
    }
}
