//! Rule configuration.
//!
//! Rules are declared in a TOML file and handed to the engine as explicit
//! values; there is no process-wide rule registry. Parsing goes through
//! `toml_edit`'s serde bridge.
//!
//! ```toml
//! [[rule]]
//! type = "deref_arg"
//! callee = "take"
//! arg = 0
//! insert_use = ["crate::util"]
//!
//! [[rule]]
//! type = "rename_call"
//! from = "old_name"
//! to = "new_name"
//! ```

use crate::rule::{DerefArgRule, RenameCallRule, Rule};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct RuleSet {
    #[serde(default)]
    pub rule: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleSpec {
    /// Rewrite the argument at `arg` of calls to `callee` into its
    /// dereferenced form.
    DerefArg {
        callee: String,
        #[serde(default)]
        arg: usize,
        #[serde(default)]
        insert_use: Vec<String>,
    },
    /// Rename the callee of matching calls.
    RenameCall {
        from: String,
        to: String,
        #[serde(default)]
        insert_use: Vec<String>,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read rule config from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse rule config TOML: {0}")]
    Toml(#[from] toml_edit::de::Error),

    #[error("invalid rule config: {0}")]
    Invalid(String),
}

impl RuleSet {
    /// An empty rule list is a setup error: a run with nothing to match
    /// would silently report every file as a no-op.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rule.is_empty() {
            return Err(ConfigError::Invalid("no rules defined".to_string()));
        }

        for spec in &self.rule {
            match spec {
                RuleSpec::DerefArg { callee, .. } => {
                    if callee.trim().is_empty() {
                        return Err(ConfigError::Invalid(
                            "deref_arg rule requires a callee".to_string(),
                        ));
                    }
                }
                RuleSpec::RenameCall { from, to, .. } => {
                    if from.trim().is_empty() {
                        return Err(ConfigError::Invalid(
                            "rename_call rule requires a source name".to_string(),
                        ));
                    }
                    if syn::parse_str::<syn::Ident>(to).is_err() {
                        return Err(ConfigError::Invalid(format!(
                            "rename_call target {to:?} is not a valid identifier"
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Materialize the declared rules.
    pub fn build(&self) -> Vec<Box<dyn Rule>> {
        self.rule
            .iter()
            .map(|spec| -> Box<dyn Rule> {
                match spec {
                    RuleSpec::DerefArg {
                        callee,
                        arg,
                        insert_use,
                    } => Box::new(
                        DerefArgRule::new(callee, *arg).with_use_inserts(insert_use.clone()),
                    ),
                    RuleSpec::RenameCall {
                        from,
                        to,
                        insert_use,
                    } => Box::new(
                        RenameCallRule::new(from, to).with_use_inserts(insert_use.clone()),
                    ),
                }
            })
            .collect()
    }
}

pub fn load_from_str(input: &str) -> Result<RuleSet, ConfigError> {
    let set: RuleSet = toml_edit::de::from_str(input)?;
    set.validate()?;
    Ok(set)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<RuleSet, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents)
}
