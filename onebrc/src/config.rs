//! Engine configuration.
//!
//! Loaded from TOML or built in code; every field has a default so an empty
//! file is a valid configuration.

use std::num::NonZeroUsize;
use std::path::Path;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

/// What to do with a line that is not a valid record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Fail the whole run with the lowest offending offset.
    #[default]
    Fail,
    /// Drop the line and count it in [`crate::AggregateMap::skipped`].
    Skip,
}

/// How per-chunk maps are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Pairwise rounds, each pair merged on its own blocking task.
    #[default]
    Tree,
    /// One fold on the coordinating task.
    Sequential,
}

/// How [`crate::aggregate_file`] brings the input into memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    #[default]
    Mmap,
    Buffered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub worker_count: usize,
    #[serde(deserialize_with = "byte_from_char")]
    pub delimiter: u8,
    #[serde(deserialize_with = "byte_from_char")]
    pub terminator: u8,
    pub on_malformed: MalformedPolicy,
    pub merge: MergeStrategy,
    pub load: LoadMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            delimiter: b';',
            terminator: b'\n',
            on_malformed: MalformedPolicy::default(),
            merge: MergeStrategy::default(),
            load: LoadMode::default(),
        }
    }
}

/// Available hardware parallelism, or 1 when it cannot be queried.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

impl EngineConfig {
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_terminator(mut self, terminator: u8) -> Self {
        self.terminator = terminator;
        self
    }

    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.on_malformed = policy;
        self
    }

    pub fn with_merge_strategy(mut self, merge: MergeStrategy) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_load_mode(mut self, load: LoadMode) -> Self {
        self.load = load;
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_count == 0 {
            return Err(Error::Config("worker_count must be at least 1".to_string()));
        }
        if self.delimiter == self.terminator {
            return Err(Error::Config(format!(
                "delimiter and terminator must differ, both are {:?}",
                self.delimiter as char
            )));
        }
        for (name, byte) in [("delimiter", self.delimiter), ("terminator", self.terminator)] {
            if byte.is_ascii_digit() || matches!(byte, b'+' | b'-' | b'.') {
                return Err(Error::Config(format!(
                    "{name} {:?} can appear inside a number",
                    byte as char
                )));
            }
        }
        Ok(())
    }
}

fn byte_from_char<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    match text.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(D::Error::custom(format!(
            "expected a single ASCII character, got {text:?}"
        ))),
    }
}
