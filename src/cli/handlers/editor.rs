//! Editor launching for `open` and `new --edit`.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

/// Trait for launching an editor (allows mocking in tests).
pub trait EditorLauncher {
    /// Opens `path` and returns once the editor exits.
    fn open(&self, path: &Path) -> Result<()>;
}

/// Runs the configured editor command, which may carry arguments
/// (`code --wait`).
pub struct SystemEditor {
    command: String,
}

impl SystemEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl EditorLauncher for SystemEditor {
    fn open(&self, path: &Path) -> Result<()> {
        let parts: Vec<&str> = self.command.split_whitespace().collect();
        let Some((cmd, args)) = parts.split_first() else {
            bail!("editor command is empty");
        };

        let status = Command::new(cmd)
            .args(args)
            .arg(path)
            .status()
            .with_context(|| format!("failed to launch editor '{}'", self.command))?;

        if !status.success() {
            bail!("editor '{}' exited with non-zero status", self.command);
        }

        Ok(())
    }
}
