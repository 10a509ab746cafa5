//! Read-only species name index and localization lookup.
//!
//! Loaded once at startup from a JSON data file and shared across sessions;
//! lookups are case-insensitive on the canonical name and filtered by the
//! session's language preference list.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
/// Alternate display name for a species in one language.
pub struct AlternateName {
    pub language: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
/// One species record from the data file.
pub struct SpeciesRecord {
    pub name: String,
    #[serde(default)]
    pub altnames: Vec<AlternateName>,
}

/// Immutable species lookup table.
#[derive(Debug, Clone)]
pub struct SpeciesIndex {
    records: Vec<SpeciesRecord>,
}

impl SpeciesIndex {
    pub fn from_records(records: Vec<SpeciesRecord>) -> Result<Self> {
        for (index, record) in records.iter().enumerate() {
            if record.name.trim().is_empty() {
                bail!("species record index {index} has empty name");
            }
        }
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the lower-cased alternate names for `label` restricted to
    /// `languages`; empty when the label is unknown or nothing matches.
    pub fn localized_names(&self, label: &str, languages: &[String]) -> Vec<String> {
        let wanted_label = label.to_lowercase();
        let Some(record) = self
            .records
            .iter()
            .find(|record| record.name.to_lowercase() == wanted_label)
        else {
            return Vec::new();
        };
        record
            .altnames
            .iter()
            .filter(|alternate| {
                let language = alternate.language.to_lowercase();
                languages.iter().any(|wanted| wanted == &language)
            })
            .map(|alternate| alternate.name.to_lowercase())
            .collect()
    }
}

/// Loads the species index from a JSON array file.
pub fn load_species_index(path: &Path) -> Result<SpeciesIndex> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read species data file {}", path.display()))?;
    let records = serde_json::from_str::<Vec<SpeciesRecord>>(&raw)
        .with_context(|| format!("failed to parse species data file {}", path.display()))?;
    SpeciesIndex::from_records(records)
}
