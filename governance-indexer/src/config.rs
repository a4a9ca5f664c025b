// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Indexer configuration

use crate::decimals::{DecimalScale, DEFAULT_TOKEN_DECIMALS};
use crate::reader::InputFormat;
use anyhow::{Context, Result};
use ethers::types::Address;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Precision of the governance token
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,
    /// JSON file holding the projection and the watermark
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default)]
    pub input_format: InputFormat,
    /// Only accept governor events from this contract
    #[serde(default)]
    pub governor_address: Option<Address>,
    /// Only accept token events from this contract
    #[serde(default)]
    pub token_address: Option<Address>,
}

fn default_token_decimals() -> u32 {
    DEFAULT_TOKEN_DECIMALS
}

fn default_store_path() -> PathBuf {
    PathBuf::from("governance-state.json")
}

fn default_channel_capacity() -> usize {
    1024
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            token_decimals: default_token_decimals(),
            store_path: default_store_path(),
            channel_capacity: default_channel_capacity(),
            input_format: InputFormat::default(),
            governor_address: None,
            token_address: None,
        }
    }
}

impl IndexerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read indexer config file: {:?}", path))?;

        let contents = expand_env_placeholders(&contents)?;

        let config: IndexerConfig =
            serde_yaml::from_str(&contents).context("Failed to parse indexer config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.decimal_scale()?;
        if self.channel_capacity == 0 {
            anyhow::bail!("channel_capacity must be greater than zero");
        }
        Ok(())
    }

    pub fn decimal_scale(&self) -> Result<DecimalScale> {
        Ok(DecimalScale::new(self.token_decimals)?)
    }
}

/// Expand `${VAR}` placeholders from the environment.
///
/// A placeholder left in place would be read as a literal store path or fail
/// as a malformed address far from its cause, so every unset variable is
/// reported at once and the load fails.
fn expand_env_placeholders(content: &str) -> Result<String> {
    let placeholder = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")?;
    let mut unset = BTreeSet::new();

    let expanded = placeholder.replace_all(content, |caps: &Captures| {
        match std::env::var(&caps[1]) {
            Ok(value) => value,
            Err(_) => {
                unset.insert(caps[1].to_string());
                caps[0].to_string()
            }
        }
    });

    if !unset.is_empty() {
        let names: Vec<String> = unset.into_iter().collect();
        anyhow::bail!(
            "Indexer config references unset environment variables: {}",
            names.join(", ")
        );
    }
    Ok(expanded.into_owned())
}
