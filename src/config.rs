//! Dockerfile config loading
//!
//! "Do X": Turn one or more YAML config files into an ordered list of command
//! descriptors.
//!
//! A config document is a YAML list. Every entry is a mapping with exactly one
//! key, the command kind, whose value is the kind-specific body:
//!
//! ```yaml
//! - apt-get:
//!   - curl
//!   - name: dnsutils
//!     provides: [dig, nslookup]
//! - curl:
//!   - name: kubectl
//!     version: v1.29.2
//!     from: https://dl.k8s.io/release/{version}/bin/linux/amd64/kubectl
//!     to: /bin/kubectl
//!     command: chmod 755 /bin/kubectl
//! ```
//!
//! Additional configs are appended after the primary one, each keeping its own
//! entry order. Descriptors are not interpreted here; see [`crate::command`].

mod internal;

use std::path::{Path, PathBuf};

pub use internal::{CommandDescriptor, ConfigError};

/// Load the primary config followed by every additional config, in order.
pub fn load_descriptors(
    primary: &Path,
    additional: &[PathBuf],
) -> Result<Vec<CommandDescriptor>, ConfigError> {
    internal::load_descriptors(primary, additional)
}

/// Load the descriptors of a single config file.
pub fn load_file(path: &Path) -> Result<Vec<CommandDescriptor>, ConfigError> {
    internal::load_file(path)
}

/// Parse descriptors from YAML text. `path` is only used in error messages.
pub fn parse_descriptors(content: &str, path: &Path) -> Result<Vec<CommandDescriptor>, ConfigError> {
    internal::parse_descriptors(content, path)
}
