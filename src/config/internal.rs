//! Internal implementation for config module

use serde_yaml::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// One raw config entry: the command kind and its unparsed body.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDescriptor {
    pub kind: String,
    pub body: Value,
}

impl CommandDescriptor {
    pub fn new(kind: impl Into<String>, body: Value) -> Self {
        Self {
            kind: kind.into(),
            body,
        }
    }
}

/// Config files that cannot be read or do not have the expected shape.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("config {} must be a list of commands", .path.display())]
    NotASequence { path: PathBuf },

    #[error(
        "entry {index} in config {} must be a mapping with exactly one command key",
        .path.display()
    )]
    MalformedEntry { path: PathBuf, index: usize },
}

pub fn load_descriptors(
    primary: &Path,
    additional: &[PathBuf],
) -> Result<Vec<CommandDescriptor>, ConfigError> {
    let mut descriptors = load_file(primary)?;

    for path in additional {
        descriptors.extend(load_file(path)?);
    }

    info!(
        commands = descriptors.len(),
        files = additional.len() + 1,
        "loaded dockerfile config"
    );
    Ok(descriptors)
}

pub fn load_file(path: &Path) -> Result<Vec<CommandDescriptor>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let descriptors = parse_descriptors(&content, path)?;
    debug!(path = %path.display(), commands = descriptors.len(), "parsed config file");
    Ok(descriptors)
}

pub fn parse_descriptors(content: &str, path: &Path) -> Result<Vec<CommandDescriptor>, ConfigError> {
    // An empty file declares no commands
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document: Value = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    let entries = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Sequence(entries) => entries,
        _ => {
            return Err(ConfigError::NotASequence {
                path: path.to_path_buf(),
            })
        }
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            descriptor_from_entry(entry).ok_or_else(|| ConfigError::MalformedEntry {
                path: path.to_path_buf(),
                index,
            })
        })
        .collect()
}

fn descriptor_from_entry(entry: Value) -> Option<CommandDescriptor> {
    let Value::Mapping(mapping) = entry else {
        return None;
    };
    if mapping.len() != 1 {
        return None;
    }

    let (key, body) = mapping.into_iter().next()?;
    match key {
        Value::String(kind) => Some(CommandDescriptor::new(kind, body)),
        _ => None,
    }
}
