// SPDX-FileCopyrightText: 2025 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Generator configuration
//!
//! Configurations are JSON documents. Every field is optional and falls back to its default, so
//! `{}` is a valid configuration.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::blocks::PredictKind;
use crate::context::DEFAULT_RETRY_BUDGET;
use crate::isa::Extension;
use crate::selector::DEFAULT_ATTEMPTS;

/// Errors raised while loading a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Seed of the generation context. A fresh seed is drawn when absent.
    pub seed: Option<u64>,

    /// Extensions every generated block may use
    pub extensions: BTreeSet<Extension>,

    /// Predictor mechanism, one of `call`, `return`, `branch_taken` or `branch_not_taken`.
    /// Kept as text so that an unknown mechanism surfaces as a block configuration error.
    pub predict_kind: String,

    /// Number of training runs
    pub train_loop: usize,

    /// Number of victim runs
    pub victim_loop: usize,

    /// Load the delay chain from its template instead of synthesising it
    pub delay_default: bool,

    /// Selector queries per connecting instruction before giving up
    pub retry_budget: usize,

    /// Candidate instantiations per selector query
    pub selector_attempts: usize,

    /// Directory containing `env/trans/*.S`
    pub template_root: PathBuf,
}

impl GeneratorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            extensions: BTreeSet::from([
                Extension::RV_I,
                Extension::RV64_I,
                Extension::RV_M,
                Extension::RV64_M,
                Extension::RV_F,
                Extension::RV64_F,
                Extension::RV_D,
                Extension::RV64_D,
            ]),
            predict_kind: PredictKind::BranchTaken.to_string(),
            train_loop: 10,
            victim_loop: 1,
            delay_default: false,
            retry_budget: DEFAULT_RETRY_BUDGET,
            selector_attempts: DEFAULT_ATTEMPTS,
            template_root: PathBuf::from("."),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(
            GeneratorConfig::from_json("{}").unwrap(),
            GeneratorConfig::default()
        );
    }

    #[test]
    fn test_partial_document() {
        let config = GeneratorConfig::from_json(
            r#"{
                "seed": 17,
                "extensions": ["RV_I", "RV_M"],
                "predict_kind": "call",
                "train_loop": 4
            }"#,
        )
        .unwrap();

        assert_eq!(config.seed, Some(17));
        assert_eq!(
            config.extensions,
            BTreeSet::from([Extension::RV_I, Extension::RV_M])
        );
        assert_eq!(config.predict_kind, "call");
        assert_eq!(config.train_loop, 4);
        assert_eq!(config.victim_loop, 1);
        assert_eq!(config.retry_budget, 64);
        assert_eq!(config.selector_attempts, 256);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        assert!(matches!(
            GeneratorConfig::from_json(r#"{ "train_loops": 4 }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        assert!(matches!(
            GeneratorConfig::from_file(&path),
            Err(ConfigError::Io { .. })
        ));

        fs::write(&path, r#"{ "delay_default": true }"#).unwrap();
        let config = GeneratorConfig::from_file(&path).unwrap();
        assert!(config.delay_default);
    }
}
