pub mod command;
pub mod config;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod validate;

// Re-export commonly used types
pub use command::{create_command, Command, CommandError, CommandKind};
pub use config::{CommandDescriptor, ConfigError};
pub use report::Report;
pub use validate::{validate_tools, HttpProbe, Probe, ProbeFailure, ValidationError};
