//! Download validation
//!
//! "Do X": Check that every tool of every fetch-by-URL command can actually be
//! downloaded.
//!
//! # Design
//!
//! - **Probe**: one read-only existence check against a URL
//! - **HttpProbe**: the real probe, a GET that follows redirects and drops the body
//! - [`validate_tools`] never stops early. Every tool is probed and every
//!   failure is collected, in command then tool order.

mod http;

use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::command::Command;

pub use http::{HttpProbe, DEFAULT_TIMEOUT};

/// Why a single probe failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    /// The server answered, but with a status >= 400
    #[error("HTTP status {0}")]
    Status(u16),

    /// No usable answer: DNS, connect, TLS, timeout, redirect loop
    #[error("{0}")]
    Transport(String),
}

/// Existence check for a download URL.
pub trait Probe {
    fn probe(&self, url: &str) -> Result<(), ProbeFailure>;
}

/// A failed probe: which tool, which URL, and what went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    tool: String,
    url: String,
    #[serde(serialize_with = "serialize_display")]
    failure: ProbeFailure,
}

impl ValidationError {
    pub fn new(tool: impl Into<String>, url: impl Into<String>, failure: ProbeFailure) -> Self {
        Self {
            tool: tool.into(),
            url: url.into(),
            failure,
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn failure(&self) -> &ProbeFailure {
        &self.failure
    }

    /// The probe as it was issued.
    pub fn invocation(&self) -> String {
        format!("GET {}", self.url)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Download of '{}' (\"{}\") failed with {}",
            self.tool,
            self.invocation(),
            self.failure
        )
    }
}

fn serialize_display<S: serde::Serializer>(
    failure: &ProbeFailure,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(failure)
}

/// Probe every tool of every curl command. Returns one error per failed probe.
pub fn validate_tools<P: Probe + ?Sized>(commands: &[Command], probe: &P) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for curl in commands.iter().filter_map(Command::as_curl) {
        for tool in curl.tools() {
            let url = tool.download_location();
            debug!(tool = %tool.name, url = %url, "probing download location");

            if let Err(failure) = probe.probe(&url) {
                warn!(tool = %tool.name, url = %url, error = %failure, "download location unreachable");
                errors.push(ValidationError::new(&tool.name, url, failure));
            }
        }
    }

    errors
}
