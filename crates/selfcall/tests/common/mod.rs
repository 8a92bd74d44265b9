//! Common test utilities for selfcall integration tests
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

/// Isolated home directory for one test
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub data_dir: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let data_dir = temp_dir.path().join(".selfcall");

        Ok(Self { temp_dir, data_dir })
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    pub fn personas_dir(&self) -> PathBuf {
        self.data_dir.join("workspace").join("personas")
    }

    /// Command with HOME pointed at the temp dir
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_selfcall"));
        cmd.env("HOME", self.temp_dir.path());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Write a config with an API key pointing at an unreachable backend
    pub fn create_config(&self) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.data_dir)?;
        let config = r#"{
  "agent": { "model": "test/model", "request_timeout_secs": 2 },
  "providers": {
    "openrouter": { "api_key": "sk-or-test", "api_base": "http://127.0.0.1:9" }
  }
}"#;
        let path = self.config_file();
        std::fs::write(&path, config)?;
        Ok(path)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}
