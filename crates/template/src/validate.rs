use once_cell::sync::Lazy;
use regex::Regex;
use runny_types::{Variable, VariableType};
use url::Url;

use crate::error::ValidationError;

static INT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").expect("valid int regex"));
static FLOAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+$").expect("valid float regex"));
static FLAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-[A-Za-z]+$").expect("valid flag regex"));
static OPTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^--[A-Za-z-]+$").expect("valid option regex"));

/// Check a raw argument against a variable declaration.
///
/// A declared type takes precedence over the listed values; the value list
/// only constrains untyped variables.
pub fn validate(variable: &Variable, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return if variable.optional {
            Ok(())
        } else {
            Err(ValidationError::missing(&variable.name))
        };
    }

    if let Some(kind) = variable.kind {
        if matches_type(kind, value) {
            return Ok(());
        }
        return Err(ValidationError::invalid_type(&variable.name, kind, value));
    }

    if variable.restricted && !variable.values.iter().any(|allowed| allowed == value) {
        return Err(ValidationError::not_allowed(&variable.name, value));
    }

    Ok(())
}

/// Type predicate for a single non-empty value.
pub fn matches_type(kind: VariableType, value: &str) -> bool {
    match kind {
        VariableType::Any => true,
        VariableType::Int => INT_RE.is_match(value),
        VariableType::Float => FLOAT_RE.is_match(value),
        VariableType::Number => INT_RE.is_match(value) || FLOAT_RE.is_match(value),
        VariableType::NonNumeric => !value.chars().any(|character| character.is_ascii_digit()),
        VariableType::Boolean => value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false"),
        VariableType::Password => !value.chars().any(char::is_whitespace),
        VariableType::Path => runny_util::is_clean_path(value),
        VariableType::Flag => FLAG_RE.is_match(value),
        VariableType::LongOption => OPTION_RE.is_match(value),
        VariableType::Url => is_request_uri(value),
    }
}

/// Absolute path (`/status`) or an absolute URL with a hierarchical scheme.
fn is_request_uri(value: &str) -> bool {
    if value.starts_with('/') {
        return !value.chars().any(char::is_whitespace);
    }
    let Ok(url) = Url::parse(value) else {
        return false;
    };
    // The parser fills in a missing `//` for special schemes such as http.
    !url.cannot_be_a_base() && value.get(url.scheme().len()..).is_some_and(|rest| rest.starts_with("://"))
}
