// Copyright (c) 2025 Aegis Team
// SPDX-License-Identifier: Apache-2.0

//! YAML config loader with environment-variable interpolation.

use crate::config::AegisConfig;
use regex::{Captures, Regex};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

pub const CONFIG_FILENAME: &str = ".aegis.yaml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not find {CONFIG_FILENAME}; create one from .aegis.yaml.example or pass a path")]
    NotFound,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env-var pattern"))
}

/// Replace `${VAR}` and `${VAR:-default}` occurrences with environment
/// values. An unset variable without a default is left literal.
fn interpolate_env(value: &str) -> String {
    env_var_pattern()
        .replace_all(value, |caps: &Captures<'_>| {
            let expr = &caps[1];
            match expr.split_once(":-") {
                Some((var, default)) => {
                    std::env::var(var.trim()).unwrap_or_else(|_| default.to_string())
                }
                None => std::env::var(expr.trim()).unwrap_or_else(|_| caps[0].to_string()),
            }
        })
        .into_owned()
}

/// Walk a parsed document and interpolate env vars in every string leaf.
fn interpolate_recursive(value: &mut Value) {
    match value {
        Value::String(s) => *s = interpolate_env(s),
        Value::Mapping(mapping) => {
            for (_, v) in mapping.iter_mut() {
                interpolate_recursive(v);
            }
        }
        Value::Sequence(items) => {
            for item in items.iter_mut() {
                interpolate_recursive(item);
            }
        }
        _ => {}
    }
}

/// Walk up from `start` (default: cwd) looking for the config file.
pub fn find_config_file(start: Option<&Path>) -> Option<PathBuf> {
    let current = match start {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };

    for ancestor in current.ancestors() {
        let candidate = ancestor.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
    }
    None
}

/// Load and validate the config document, applying env interpolation.
///
/// When `path` is `None` the file is located by walking up from the
/// current directory.
pub fn load_config(path: Option<&Path>) -> Result<AegisConfig, ConfigError> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => find_config_file(None).ok_or(ConfigError::NotFound)?,
    };

    let raw = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;

    let mut document: Value = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: config_path.clone(),
        source,
    })?;
    interpolate_recursive(&mut document);

    serde_yaml::from_value(document).map_err(|source| ConfigError::Invalid {
        path: config_path,
        source,
    })
}
