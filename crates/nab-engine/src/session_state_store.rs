//! Per-account session configuration and its state file.
//!
//! Each session owns one state file under its own state directory; nothing
//! here is shared across sessions. Verification state is deliberately not
//! persisted: a restarted session starts verified.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use nab_core::write_text_atomic;

use crate::session_commands::RECOGNIZED_LANGUAGES;

pub const SESSION_STATE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Mutable per-session configuration, owned by exactly one session runner.
pub struct AccountConfig {
    pub whitelisted_channels: BTreeSet<u64>,
    /// Ordered language preference list; always non-empty and lower-cased.
    pub languages: Vec<String>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            whitelisted_channels: BTreeSet::new(),
            languages: vec!["english".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionStateFile {
    schema_version: u32,
    #[serde(default)]
    whitelisted_channels: Vec<u64>,
    #[serde(default)]
    languages: Vec<String>,
}

/// Loads, holds, and saves one session's configuration.
#[derive(Debug)]
pub struct SessionStateStore {
    path: PathBuf,
    config: AccountConfig,
}

impl SessionStateStore {
    pub fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read session state file {}", path.display()))?;
            serde_json::from_str::<SessionStateFile>(&raw).with_context(|| {
                format!("failed to parse session state file {}", path.display())
            })?
        } else {
            SessionStateFile {
                schema_version: SESSION_STATE_SCHEMA_VERSION,
                whitelisted_channels: Vec::new(),
                languages: AccountConfig::default().languages,
            }
        };

        if state.schema_version != SESSION_STATE_SCHEMA_VERSION {
            bail!(
                "unsupported session state schema: expected {}, found {}",
                SESSION_STATE_SCHEMA_VERSION,
                state.schema_version
            );
        }

        let mut languages = Vec::new();
        for language in &state.languages {
            let normalized = language.to_lowercase();
            if !RECOGNIZED_LANGUAGES.contains(&normalized.as_str()) {
                warn!(
                    "session state dropped unrecognized language: file={} language={language}",
                    path.display()
                );
                continue;
            }
            if !languages.contains(&normalized) {
                languages.push(normalized);
            }
        }
        if languages.is_empty() {
            languages.push("english".to_string());
        }

        Ok(Self {
            path,
            config: AccountConfig {
                whitelisted_channels: state.whitelisted_channels.into_iter().collect(),
                languages,
            },
        })
    }

    pub fn config(&self) -> &AccountConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut AccountConfig {
        &mut self.config
    }

    pub fn save(&self) -> Result<()> {
        let state = SessionStateFile {
            schema_version: SESSION_STATE_SCHEMA_VERSION,
            whitelisted_channels: self.config.whitelisted_channels.iter().copied().collect(),
            languages: self.config.languages.clone(),
        };
        let rendered =
            serde_json::to_string_pretty(&state).context("failed to render session state")?;
        write_text_atomic(&self.path, &rendered)
    }
}
