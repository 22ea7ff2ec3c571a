//! Internal implementation for command module
//!
//! Typed bodies for every command kind, plus their Dockerfile rendering.

use reqwest::Url;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

use super::{CommandError, CommandKind};

/// Separator between shell steps that share one RUN instruction
const RUN_CONTINUATION: &str = " && \\\n    ";

// =============================================================================
// Body parsing helpers
// =============================================================================

pub(super) fn parse_body<T: DeserializeOwned>(kind: CommandKind, body: Value) -> Result<T, CommandError> {
    serde_yaml::from_value(body).map_err(|e| invalid(kind, e.to_string()))
}

pub(super) fn invalid(kind: CommandKind, reason: impl Into<String>) -> CommandError {
    CommandError::InvalidDescriptor {
        kind: kind.as_str().to_string(),
        reason: reason.into(),
    }
}

fn ensure_unique<'a>(
    kind: CommandKind,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), CommandError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(invalid(kind, format!("tool '{}' is declared more than once", name)));
        }
    }
    Ok(())
}

/// YAML happily reads `version: 1.0` as a float; keep it as text.
fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn optional_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => scalar_to_string(value)
            .map(Some)
            .ok_or_else(|| D::Error::custom("expected a scalar value")),
    }
}

// =============================================================================
// curl
// =============================================================================

/// A binary or archive downloaded over HTTP(S).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurlTool {
    pub name: String,
    /// URL template; `{version}` is replaced by `version`
    pub from: String,
    /// Destination path inside the image
    pub to: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub version: Option<String>,
    /// Shell command run after the download (e.g. chmod, tar -x)
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub info: Option<String>,
}

impl CurlTool {
    /// Fully-qualified download URL for this tool.
    pub fn download_location(&self) -> String {
        match &self.version {
            Some(version) => self.from.replace("{version}", version),
            None => self.from.clone(),
        }
    }

    /// The download location must be an absolute http(s) URL with no
    /// placeholder left unresolved.
    fn check_location(&self) -> Result<(), CommandError> {
        if self.version.is_none() && self.from.contains("{version}") {
            return Err(invalid(
                CommandKind::Curl,
                format!("tool '{}' uses {{version}} but declares no version", self.name),
            ));
        }

        let location = self.download_location();
        let url = Url::parse(&location).map_err(|e| {
            invalid(
                CommandKind::Curl,
                format!("tool '{}' has invalid download URL '{}': {}", self.name, location, e),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(
                CommandKind::Curl,
                format!("tool '{}' must be downloaded over http(s), not '{}'", self.name, url.scheme()),
            ));
        }
        Ok(())
    }

    fn shell_steps(&self) -> String {
        let download = format!("curl -sLf {} -o {}", self.download_location(), self.to);
        match &self.command {
            Some(command) => format!("{} && {}", download, command.trim()),
            None => download,
        }
    }
}

/// Fetch-by-URL command: every tool is downloaded from its own URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurlCommand {
    tools: Vec<CurlTool>,
}

impl CurlCommand {
    pub fn new(tools: Vec<CurlTool>) -> Result<Self, CommandError> {
        if tools.is_empty() {
            return Err(invalid(CommandKind::Curl, "at least one tool is required"));
        }
        ensure_unique(CommandKind::Curl, tools.iter().map(|t| t.name.as_str()))?;
        for tool in &tools {
            tool.check_location()?;
        }
        Ok(Self { tools })
    }

    pub(super) fn from_body(body: Value) -> Result<Self, CommandError> {
        Self::new(parse_body(CommandKind::Curl, body)?)
    }

    /// Declared tools, in config order.
    pub fn tools(&self) -> &[CurlTool] {
        &self.tools
    }

    pub fn tool(&self, name: &str) -> Option<&CurlTool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Download URL of the named tool, if this command declares it.
    pub fn download_location(&self, name: &str) -> Option<String> {
        self.tool(name).map(CurlTool::download_location)
    }

    pub(super) fn dockerfile_instruction(&self) -> String {
        let steps: Vec<String> = self.tools.iter().map(CurlTool::shell_steps).collect();
        format!("RUN {}", steps.join(RUN_CONTINUATION))
    }
}

// =============================================================================
// apt-get / pip
// =============================================================================

/// A package installed through a package manager.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default, deserialize_with = "optional_scalar")]
    pub version: Option<String>,
    /// Executables the package brings along (e.g. dnsutils -> dig)
    #[serde(default)]
    pub provides: Vec<String>,
    #[serde(default)]
    pub info: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PackageEntry {
    Name(String),
    Detailed(Package),
}

impl From<PackageEntry> for Package {
    fn from(entry: PackageEntry) -> Self {
        match entry {
            PackageEntry::Name(name) => Package {
                name,
                version: None,
                provides: Vec::new(),
                info: None,
            },
            PackageEntry::Detailed(package) => package,
        }
    }
}

/// Package manager command, shared by `apt-get` and `pip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageCommand {
    packages: Vec<Package>,
}

impl PackageCommand {
    pub(super) fn from_body(kind: CommandKind, body: Value) -> Result<Self, CommandError> {
        let entries: Vec<PackageEntry> = parse_body(kind, body)?;
        let packages: Vec<Package> = entries.into_iter().map(Package::from).collect();
        if packages.is_empty() {
            return Err(invalid(kind, "at least one package is required"));
        }
        ensure_unique(kind, packages.iter().map(|p| p.name.as_str()))?;
        Ok(Self { packages })
    }

    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    fn pinned(&self, separator: &str) -> Vec<String> {
        self.packages
            .iter()
            .map(|p| match &p.version {
                Some(version) => format!("{}{}{}", p.name, separator, version),
                None => p.name.clone(),
            })
            .collect()
    }

    pub(super) fn apt_instruction(&self) -> String {
        format!(
            "RUN apt-get --yes update && apt-get --yes install {} && rm -rf /var/lib/apt/lists/*",
            self.pinned("=").join(" ")
        )
    }

    pub(super) fn pip_instruction(&self) -> String {
        format!("RUN pip install --no-cache-dir {}", self.pinned("==").join(" "))
    }
}

// =============================================================================
// bash
// =============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum BashBody {
    Script(String),
    Detailed {
        script: String,
        #[serde(default)]
        tools: Vec<String>,
        #[serde(default)]
        info: Option<String>,
    },
}

/// Free-form shell script, optionally naming the tools it installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BashCommand {
    pub script: String,
    pub tools: Vec<String>,
    pub info: Option<String>,
}

impl BashCommand {
    pub(super) fn from_body(body: Value) -> Result<Self, CommandError> {
        let body: BashBody = parse_body(CommandKind::Bash, body)?;
        let command = match body {
            BashBody::Script(script) => Self {
                script,
                tools: Vec::new(),
                info: None,
            },
            BashBody::Detailed {
                script,
                tools,
                info,
            } => Self {
                script,
                tools,
                info,
            },
        };

        match command.script_lines().last() {
            None => return Err(invalid(CommandKind::Bash, "script has no commands")),
            // A dangling continuation would swallow the next instruction
            Some(last) if last.ends_with('\\') => {
                return Err(invalid(CommandKind::Bash, "last script line must not end with '\\'"))
            }
            Some(_) => {}
        }
        Ok(command)
    }

    /// Script lines without blanks and comments
    fn script_lines(&self) -> Vec<&str> {
        self.script
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect()
    }

    pub(super) fn dockerfile_instruction(&self) -> String {
        let mut rendered = String::from("RUN ");
        let lines = self.script_lines();

        for (i, line) in lines.iter().enumerate() {
            rendered.push_str(line);
            if i + 1 == lines.len() {
                break;
            }
            // Lines already continued by the author only need the indent
            if line.ends_with('\\') {
                rendered.push_str("\n    ");
            } else {
                rendered.push_str(RUN_CONTINUATION);
            }
        }
        rendered
    }
}

// =============================================================================
// env / copy
// =============================================================================

/// Environment variables, kept in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvCommand {
    vars: Vec<(String, String)>,
}

impl EnvCommand {
    pub(super) fn from_body(body: Value) -> Result<Self, CommandError> {
        let mapping: Mapping = parse_body(CommandKind::Env, body)?;
        let mut vars = Vec::with_capacity(mapping.len());

        for (key, value) in mapping {
            let Value::String(name) = key else {
                return Err(invalid(CommandKind::Env, "variable names must be strings"));
            };
            let value = match value {
                Value::Null => String::new(),
                other => scalar_to_string(other).ok_or_else(|| {
                    invalid(CommandKind::Env, format!("value of '{}' must be a scalar", name))
                })?,
            };
            vars.push((name, value));
        }

        if vars.is_empty() {
            return Err(invalid(CommandKind::Env, "at least one variable is required"));
        }
        Ok(Self { vars })
    }

    pub fn vars(&self) -> &[(String, String)] {
        &self.vars
    }

    pub(super) fn dockerfile_instruction(&self) -> String {
        self.vars
            .iter()
            .map(|(name, value)| format!("ENV {}={}", name, quote_env_value(value)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn quote_env_value(value: &str) -> String {
    if !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c == '"') {
        return value.to_string();
    }
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// File copied from the build context into the image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CopyCommand {
    pub from: String,
    pub to: String,
}

impl CopyCommand {
    pub(super) fn from_body(body: Value) -> Result<Self, CommandError> {
        parse_body(CommandKind::Copy, body)
    }

    pub(super) fn dockerfile_instruction(&self) -> String {
        format!("COPY {} {}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_version_placeholder_is_substituted_everywhere() {
        let tool = CurlTool {
            name: "helm".to_string(),
            from: "https://get.helm.sh/helm-{version}-linux-amd64.tar.gz?v={version}".to_string(),
            to: "/tmp/helm.tar.gz".to_string(),
            version: Some("v3.14.0".to_string()),
            command: None,
            info: None,
        };
        assert_eq!(
            tool.download_location(),
            "https://get.helm.sh/helm-v3.14.0-linux-amd64.tar.gz?v=v3.14.0"
        );
    }

    #[test]
    fn test_template_without_version_is_used_verbatim() {
        let tool = CurlTool {
            name: "jq".to_string(),
            from: "https://example.com/{version}/jq".to_string(),
            to: "/bin/jq".to_string(),
            version: None,
            command: None,
            info: None,
        };
        assert_eq!(tool.download_location(), "https://example.com/{version}/jq");
    }

    #[test]
    fn test_numeric_version_is_kept_as_text() {
        let tools: Vec<CurlTool> = parse_body(
            CommandKind::Curl,
            yaml("- {name: yq, version: 4, from: 'https://example.com/yq-{version}', to: /bin/yq}"),
        )
        .unwrap();
        assert_eq!(tools[0].version.as_deref(), Some("4"));
    }

    #[test]
    fn test_nested_version_is_rejected() {
        let result: Result<Vec<CurlTool>, _> = parse_body(
            CommandKind::Curl,
            yaml("- {name: yq, version: [1], from: 'https://example.com', to: /bin/yq}"),
        );
        assert!(matches!(result, Err(CommandError::InvalidDescriptor { .. })));
    }

    #[test]
    fn test_curl_requires_tools() {
        let err = CurlCommand::new(Vec::new()).unwrap_err();
        assert!(err.to_string().contains("at least one tool"));
    }

    #[test]
    fn test_duplicate_package_names_are_rejected() {
        let err = PackageCommand::from_body(CommandKind::AptGet, yaml("[git, {name: git}]")).unwrap_err();
        assert!(err.to_string().contains("'git'"));
    }

    #[test]
    fn test_bash_script_lines_are_chained() {
        let command = BashCommand::from_body(yaml(
            "|\n  # fetch sources\n  cd /tmp\n  ./configure \\\n    --prefix=/usr\n  make install\n",
        ))
        .unwrap();
        assert_eq!(
            command.dockerfile_instruction(),
            "RUN cd /tmp && \\\n    ./configure \\\n    --prefix=/usr && \\\n    make install"
        );
    }

    #[test]
    fn test_blank_bash_script_is_rejected() {
        assert!(BashCommand::from_body(yaml("'   '")).is_err());
        assert!(BashCommand::from_body(yaml("\"# just a comment\\n\"")).is_err());
    }

    #[test]
    fn test_trailing_continuation_in_bash_script_is_rejected() {
        let err = BashCommand::from_body(yaml("|\n  ./configure \\\n    --prefix=/usr \\\n")).unwrap_err();
        assert!(err.to_string().contains("must not end with"));

        // Continuations in the middle are fine
        assert!(BashCommand::from_body(yaml("|\n  ./configure \\\n    --prefix=/usr\n")).is_ok());
    }

    #[test]
    fn test_env_values_with_spaces_are_quoted() {
        let command = EnvCommand::from_body(yaml("{EDITOR: vim, PS1: '$ ', DEBUG: 1}")).unwrap();
        assert_eq!(
            command.dockerfile_instruction(),
            "ENV EDITOR=vim\nENV PS1=\"$ \"\nENV DEBUG=1"
        );
    }

    #[test]
    fn test_env_rejects_non_string_names() {
        for body in ["{1: x}", "{true: x}"] {
            let err = EnvCommand::from_body(yaml(body)).unwrap_err();
            assert!(err.to_string().contains("names must be strings"), "body: {}", body);
        }
    }

    #[test]
    fn test_env_rejects_nested_values() {
        let err = EnvCommand::from_body(yaml("{PATH: [a, b]}")).unwrap_err();
        assert!(err.to_string().contains("'PATH'"));
    }
}
