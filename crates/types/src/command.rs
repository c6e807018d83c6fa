use std::{error::Error, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace for command identifiers derived from `(name, template)`.
const COMMAND_ID_NAMESPACE: Uuid = Uuid::from_u128(0x3b0e_5a51_9c2d_4f7e_8a64_1d2f_90c3_7e15);

/// Value type a placeholder can declare with `${name:type}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VariableType {
    /// Anything (default when no type is declared)
    Any,
    /// Digits only, no decimals
    Int,
    /// Digits with a decimal part
    Float,
    /// Either `int` or `float`
    Number,
    /// No digits at all
    NonNumeric,
    /// `true` or `false`, case-insensitive
    Boolean,
    /// No whitespace
    Password,
    /// Absolute request URI
    Url,
    /// Lexically clean path
    Path,
    /// Short command line flag such as `-la`
    Flag,
    /// Long command line option such as `--dry-run`
    #[serde(rename = "option")]
    LongOption,
}

impl VariableType {
    /// Every type accepted by the placeholder grammar.
    pub const ALL: [VariableType; 11] = [
        VariableType::Any,
        VariableType::Int,
        VariableType::Float,
        VariableType::Number,
        VariableType::NonNumeric,
        VariableType::Boolean,
        VariableType::Password,
        VariableType::Url,
        VariableType::Path,
        VariableType::Flag,
        VariableType::LongOption,
    ];

    /// Name of the type as written in a template.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Int => "int",
            Self::Float => "float",
            Self::Number => "number",
            Self::NonNumeric => "non-numeric",
            Self::Boolean => "boolean",
            Self::Password => "password",
            Self::Url => "url",
            Self::Path => "path",
            Self::Flag => "flag",
            Self::LongOption => "option",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableType {
    type Err = UnknownVariableType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownVariableType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariableType(pub String);

impl fmt::Display for UnknownVariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variable type '{}'", self.0)
    }
}

impl Error for UnknownVariableType {}

/// A `${...}` placeholder declared by a command template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Placeholder name, used as the argument key
    pub name: String,
    /// Whether an empty value is accepted (`${name?}`)
    #[serde(default)]
    pub optional: bool,
    /// Declared value type; `None` when absent or unrecognized
    #[serde(default, rename = "type")]
    pub kind: Option<VariableType>,
    /// Listed values from `${name[a|b]}`, de-duplicated in source order
    #[serde(default)]
    pub values: Vec<String>,
    /// True when `values` is non-empty and does not contain `*`
    #[serde(default)]
    pub restricted: bool,
    /// Default value from `${name=value}`
    #[serde(default)]
    pub default: String,
}

/// A parsed catalogue entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Stable identifier derived from `(name, command)`
    pub id: String,
    /// Display name from `@name`; empty for unnamed commands
    #[serde(default)]
    pub name: String,
    /// UI grouping from `@group`
    #[serde(default)]
    pub group: String,
    /// Free-form text from `@description` / `@desc`
    #[serde(default)]
    pub description: String,
    /// Raw command template containing placeholders
    pub command: String,
    /// Variables extracted from the template, in order of first appearance
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl Command {
    /// Build a command, deriving its identifier from the name and template.
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        description: impl Into<String>,
        command: impl Into<String>,
        variables: Vec<Variable>,
    ) -> Self {
        let name = name.into();
        let command = command.into();
        let id = CommandKey::new(name.as_str(), command.as_str()).synthetic_id();
        Self {
            id,
            name,
            group: group.into(),
            description: description.into(),
            command,
            variables,
        }
    }

    /// Returns true when both halves of the lookup key match exactly.
    pub fn matches(&self, name: &str, command: &str) -> bool {
        self.name == name && self.command == command
    }
}

/// The `(name, template)` pair callers present to identify a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandKey {
    pub name: String,
    pub command: String,
}

impl CommandKey {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
        }
    }

    /// UUIDv5 over the pair; stable across restarts and processes.
    pub fn synthetic_id(&self) -> String {
        let mut material = Vec::with_capacity(self.name.len() + self.command.len() + 1);
        material.extend_from_slice(self.name.as_bytes());
        material.push(b'\n');
        material.extend_from_slice(self.command.as_bytes());
        Uuid::new_v5(&COMMAND_ID_NAMESPACE, &material).to_string()
    }
}

/// Input for appending a command to the catalogue file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommand {
    pub command_name: String,
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub description: String,
    pub command: String,
}
