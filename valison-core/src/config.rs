//! Configuration management for `valison-core`.
//!
//! [`EngineOptions`] tune how rule definitions are read. [`RulesFile`] is the
//! on-disk form of a definition: a YAML or JSON document holding optional
//! options and a `rules` mapping from path to steps.
//!
//! ```yaml
//! options:
//!   message_marker: "msg:"
//! rules:
//!   name: ["trim", ["isLength", "Name is too short", 2]]
//!   email: [["isEmail", "msg:Not an email"]]
//! ```
//!
//! License: MIT OR APACHE 2.0

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options controlling how call-step messages are recognised.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Prefix marking an argument as the step's message, wherever it appears
    /// in the argument list. An empty marker disables marker detection.
    pub message_marker: String,
    /// When true, the first argument of a validator step is its message if it
    /// is a string or `null`.
    pub positional_messages: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            message_marker: "msg:".to_string(),
            positional_messages: true,
        }
    }
}

/// A rule definition file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RulesFile {
    #[serde(default)]
    pub options: EngineOptions,
    /// Mapping from property path to steps, in document order.
    pub rules: Value,
}

impl RulesFile {
    /// Loads a rules file. Files ending in `.json` are read as JSON, anything
    /// else as YAML.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading rules from: {}", path.display());
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules file {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let file = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
        .with_context(|| format!("Failed to parse rules file {}", path.display()))?;

        info!("Loaded {} rule path(s) from file {}.", file.path_count(), path.display());
        Ok(file)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let file: RulesFile = serde_yml::from_str(text).context("Invalid YAML rules document")?;
        file.check_shape()?;
        debug!("Parsed YAML rules document with {} path(s).", file.path_count());
        Ok(file)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let file: RulesFile = serde_json::from_str(text).context("Invalid JSON rules document")?;
        file.check_shape()?;
        debug!("Parsed JSON rules document with {} path(s).", file.path_count());
        Ok(file)
    }

    /// Accepts a bare rules mapping (without the `rules:` wrapper) as well.
    pub fn from_definition(rules: Value) -> Result<Self> {
        let file = Self {
            options: EngineOptions::default(),
            rules,
        };
        file.check_shape()?;
        Ok(file)
    }

    pub fn path_count(&self) -> usize {
        self.rules.as_object().map_or(0, |map| map.len())
    }

    fn check_shape(&self) -> Result<()> {
        if !self.rules.is_object() {
            return Err(anyhow!("`rules` must be a mapping from path to steps"));
        }
        Ok(())
    }
}
