//! Account credential file loading and validation.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
/// One account a session runs for; the token belongs to the transport layer.
pub struct AccountCredential {
    pub account_id: u64,
    pub token: String,
}

/// Loads the credentials file: a JSON array of account entries.
pub fn load_account_credentials(path: &Path) -> Result<Vec<AccountCredential>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read credentials file {}", path.display()))?;
    let credentials = serde_json::from_str::<Vec<AccountCredential>>(&raw)
        .with_context(|| format!("failed to parse credentials file {}", path.display()))?;

    if credentials.is_empty() {
        bail!("credentials file {} lists no accounts", path.display());
    }
    let mut seen_ids = HashSet::new();
    for (index, credential) in credentials.iter().enumerate() {
        if credential.account_id == 0 {
            bail!("credential index {index} has zero account_id");
        }
        if credential.token.trim().is_empty() {
            bail!("credential index {index} has empty token");
        }
        if !seen_ids.insert(credential.account_id) {
            bail!(
                "credential index {index} duplicates account_id {}",
                credential.account_id
            );
        }
    }
    Ok(credentials)
}
