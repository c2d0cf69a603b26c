use clap::ValueEnum;
use serde::Serialize;

use crate::error::{ModError, ModResult};

/// File name of the manifest at the top of every mod archive.
pub const MANIFEST_FILE: &str = "modinfo.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModType {
    Content,
    Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModSide {
    Universal,
    Server,
    Client,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestRecord {
    pub name: String,
    pub modid: String,
    #[serde(rename = "type")]
    pub mod_type: ModType,
    pub side: ModSide,
    pub authors: Vec<String>,
}

impl ManifestRecord {
    /// Build the manifest from the operator's answers. The name and author are
    /// kept as entered; the mod id is the name with all whitespace removed.
    pub fn new(name: &str, author: &str, mod_type: ModType, side: ModSide) -> ModResult<Self> {
        let modid: String = name.chars().filter(|c| !c.is_whitespace()).collect();
        if modid.is_empty() {
            return Err(ModError::InvalidName(name.to_string()));
        }

        Ok(ManifestRecord {
            name: name.to_string(),
            modid,
            mod_type,
            side,
            authors: vec![author.to_string()],
        })
    }

    pub fn to_json(&self) -> ModResult<String> {
        serde_json::to_string_pretty(self).map_err(|source| ModError::Serialize {
            what: "mod manifest".to_string(),
            source,
        })
    }
}
