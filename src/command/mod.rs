//! Command model for dockerfile configs
//!
//! "Do X": Turn raw config descriptors into typed installation commands.
//!
//! # Design
//!
//! - **CommandKind**: closed set of directive kinds, keyed by the config key
//! - **Command**: one variant per kind, fully validated on construction
//! - Only [`Command::Curl`] downloads anything over the network, so it is the
//!   only variant the validator looks at. Every other kind is inert there.
//!
//! # Example
//!
//! ```ignore
//! use toolbelt::{config, command};
//!
//! let descriptors = config::load_file(Path::new("tools.yaml"))?;
//! let commands = command::create_commands(descriptors)?;
//! for command in &commands {
//!     println!("{}: {:?}", command.kind(), command.tools());
//! }
//! ```

mod internal;

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::CommandDescriptor;

pub use internal::{BashCommand, CopyCommand, CurlCommand, CurlTool, EnvCommand, Package, PackageCommand};

/// Descriptors that cannot be turned into a command. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command kind '{kind}'")]
    UnknownKind { kind: String },

    #[error("invalid '{kind}' command: {reason}")]
    InvalidDescriptor { kind: String, reason: String },
}

/// Command kinds, as spelled in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Curl,
    AptGet,
    Pip,
    Bash,
    Env,
    Copy,
}

impl CommandKind {
    pub const ALL: [CommandKind; 6] = [
        CommandKind::Curl,
        CommandKind::AptGet,
        CommandKind::Pip,
        CommandKind::Bash,
        CommandKind::Env,
        CommandKind::Copy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Curl => "curl",
            CommandKind::AptGet => "apt-get",
            CommandKind::Pip => "pip",
            CommandKind::Bash => "bash",
            CommandKind::Env => "env",
            CommandKind::Copy => "copy",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CommandError::UnknownKind {
                kind: s.to_string(),
            })
    }
}

/// A validated installation directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Curl(CurlCommand),
    AptGet(PackageCommand),
    Pip(PackageCommand),
    Bash(BashCommand),
    Env(EnvCommand),
    Copy(CopyCommand),
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Curl(_) => CommandKind::Curl,
            Command::AptGet(_) => CommandKind::AptGet,
            Command::Pip(_) => CommandKind::Pip,
            Command::Bash(_) => CommandKind::Bash,
            Command::Env(_) => CommandKind::Env,
            Command::Copy(_) => CommandKind::Copy,
        }
    }

    /// Names of the tools this command declares, in config order.
    pub fn tools(&self) -> Vec<&str> {
        match self {
            Command::Curl(curl) => curl.tools().iter().map(|t| t.name.as_str()).collect(),
            Command::AptGet(packages) | Command::Pip(packages) => {
                packages.packages().iter().map(|p| p.name.as_str()).collect()
            }
            Command::Bash(bash) => bash.tools.iter().map(String::as_str).collect(),
            Command::Env(_) | Command::Copy(_) => Vec::new(),
        }
    }

    /// The fetch-by-URL view of this command, if it is one.
    pub fn as_curl(&self) -> Option<&CurlCommand> {
        match self {
            Command::Curl(curl) => Some(curl),
            _ => None,
        }
    }

    /// Dockerfile instruction(s) installing this command.
    pub fn dockerfile_instruction(&self) -> String {
        match self {
            Command::Curl(curl) => curl.dockerfile_instruction(),
            Command::AptGet(packages) => packages.apt_instruction(),
            Command::Pip(packages) => packages.pip_instruction(),
            Command::Bash(bash) => bash.dockerfile_instruction(),
            Command::Env(env) => env.dockerfile_instruction(),
            Command::Copy(copy) => copy.dockerfile_instruction(),
        }
    }
}

/// Build a command from its descriptor, dispatching on the descriptor kind.
pub fn create_command(descriptor: CommandDescriptor) -> Result<Command, CommandError> {
    let CommandDescriptor { kind, body } = descriptor;
    let kind: CommandKind = kind.parse()?;

    let command = match kind {
        CommandKind::Curl => Command::Curl(CurlCommand::from_body(body)?),
        CommandKind::AptGet => Command::AptGet(PackageCommand::from_body(kind, body)?),
        CommandKind::Pip => Command::Pip(PackageCommand::from_body(kind, body)?),
        CommandKind::Bash => Command::Bash(BashCommand::from_body(body)?),
        CommandKind::Env => Command::Env(EnvCommand::from_body(body)?),
        CommandKind::Copy => Command::Copy(CopyCommand::from_body(body)?),
    };
    Ok(command)
}

/// Build every command, failing on the first bad descriptor.
pub fn create_commands(descriptors: Vec<CommandDescriptor>) -> Result<Vec<Command>, CommandError> {
    descriptors.into_iter().map(create_command).collect()
}

/// Render a complete Dockerfile: the base image followed by one instruction
/// per command.
pub fn render_dockerfile(base_image: &str, commands: &[Command]) -> String {
    let mut dockerfile = format!("FROM {}\n", base_image);
    for command in commands {
        dockerfile.push('\n');
        dockerfile.push_str(&command.dockerfile_instruction());
        dockerfile.push('\n');
    }
    dockerfile
}
