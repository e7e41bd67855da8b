//! Fluent wrapper around assert_cmd::Command.

// Allow dead code since this is a test utility shared by several test binaries
#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Fluent wrapper around `assert_cmd::Command` for the `zet` binary.
///
/// The process never sees the user's config file or `ZET_ROOT`.
pub struct ZetCommand {
    args: Vec<String>,
    config: PathBuf,
    editor: String,
}

impl ZetCommand {
    pub fn new(config: &Path) -> Self {
        Self {
            args: Vec::new(),
            config: config.to_path_buf(),
            editor: "true".to_string(),
        }
    }

    /// Sets the `--root` option.
    pub fn root(self, path: &Path) -> Self {
        self.args(["--root".to_string(), path.display().to_string()])
    }

    /// Editor command exported as `$EDITOR`.
    pub fn editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Adds `<command> <path>`.
    pub fn with_path(self, command: &str, path: &Path) -> Self {
        self.args([command.to_string(), path.display().to_string()])
    }

    /// Runs the command and returns an Assert for making assertions.
    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("zet").expect("Failed to find zet binary");
        cmd.args(&self.args)
            .env("ZET_CONFIG", &self.config)
            .env("EDITOR", &self.editor)
            .env_remove("ZET_ROOT")
            .env_remove("VISUAL")
            .env_remove("RUST_LOG");
        cmd.assert()
    }

    /// Runs the command, expects success, and returns stdout as a string.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Stdout split into lines.
    pub fn output_lines(self) -> Vec<String> {
        self.output_success().lines().map(String::from).collect()
    }

    /// Runs the command, expects success, and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    // ===========================================
    // Command Shortcuts
    // ===========================================

    pub fn sync(self) -> Self {
        self.args(["sync"])
    }

    pub fn new_note(self, title: &str) -> Self {
        self.args(["new", title])
    }

    pub fn search(self, query: &str) -> Self {
        self.args(["search", query])
    }

    pub fn history(self) -> Self {
        self.args(["history"])
    }

    pub fn backlog(self) -> Self {
        self.args(["backlog"])
    }

    pub fn last(self) -> Self {
        self.args(["last"])
    }

    pub fn broken_links(self) -> Self {
        self.args(["brokenlinks"])
    }

    /// Adds `--format json` to the command.
    pub fn format_json(self) -> Self {
        self.args(["--format", "json"])
    }
}
