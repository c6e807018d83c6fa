use runny_types::VariableType;
use thiserror::Error;

/// Argument validation failures, always tied to the offending variable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("variable \"{name}\" is required")]
    Missing { name: String },

    #[error("variable \"{name}\" of type \"{kind}\" has invalid value \"{value}\"")]
    InvalidType { name: String, kind: VariableType, value: String },

    #[error("variable \"{name}\" has invalid value \"{value}\"")]
    NotAllowed { name: String, value: String },

    #[error("argument \"{name}\" is not defined")]
    Undefined { name: String },
}

impl ValidationError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::Missing { name: name.into() }
    }

    /// Password values never make it into the message.
    pub fn invalid_type(name: impl Into<String>, kind: VariableType, value: &str) -> Self {
        let value = match kind {
            VariableType::Password => "<redacted>".to_string(),
            _ => value.to_string(),
        };
        Self::InvalidType {
            name: name.into(),
            kind,
            value,
        }
    }

    pub fn not_allowed(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NotAllowed {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn undefined(name: impl Into<String>) -> Self {
        Self::Undefined { name: name.into() }
    }

    /// Name of the variable the error refers to.
    pub fn variable_name(&self) -> &str {
        match self {
            Self::Missing { name } | Self::InvalidType { name, .. } | Self::NotAllowed { name, .. } | Self::Undefined { name } => {
                name
            }
        }
    }
}
