//! Blocking HTTP probe.
//!
//! - reqwest blocking client (no async runtime needed)
//! - Response bodies are never read; dropping the response closes the connection

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::error::Error as _;
use std::time::Duration;

use super::{Probe, ProbeFailure};

/// Per-probe timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Same limit curl applies to `-L`
const MAX_REDIRECTS: usize = 50;

const USER_AGENT: &str = concat!("toolbelt-check/", env!("CARGO_PKG_VERSION"));

/// Probe issuing a GET per URL.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Use a preconfigured client (proxies, custom roots, ...).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Probe for HttpProbe {
    fn probe(&self, url: &str) -> Result<(), ProbeFailure> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProbeFailure::Transport(describe(&e)))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(ProbeFailure::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// reqwest's own message hides the root cause; append the source chain.
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
