//! Shell quoting of substituted argument values.
//!
//! [`QuotingMode::Heuristic`] keeps values readable for typical arguments but
//! does not neutralize backticks, `$(...)` or `;` inside an `any` value.
//! Templates that accept untrusted input should declare narrow types or run
//! with [`QuotingMode::Strict`].

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// How substituted values are quoted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotingMode {
    #[default]
    Heuristic,
    /// POSIX single-quote encoding
    Strict,
}

impl fmt::Display for QuotingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heuristic => f.write_str("heuristic"),
            Self::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for QuotingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(Self::Heuristic),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown quoting mode '{other}' (expected 'heuristic' or 'strict')")),
        }
    }
}

/// Quote `value` for insertion into a command line.
///
/// ```rust
/// use runny_template::{QuotingMode, quote};
///
/// assert_eq!(quote("/home", QuotingMode::Heuristic), "/home");
/// assert_eq!(quote("Hello World", QuotingMode::Heuristic), "\"Hello World\"");
/// assert_eq!(quote("it's here", QuotingMode::Strict), "'it'\\''s here'");
/// ```
pub fn quote(value: &str, mode: QuotingMode) -> String {
    match mode {
        QuotingMode::Heuristic => quote_heuristic(value),
        QuotingMode::Strict => quote_strict(value),
    }
}

fn quote_heuristic(value: &str) -> String {
    let value = collapse_quote_runs(value);
    if !value.chars().any(char::is_whitespace) {
        return value;
    }
    if !has_unescaped(&value, '"') {
        return format!("\"{value}\"");
    }
    if !has_unescaped(&value, '\'') {
        return format!("'{value}'");
    }
    format!("\"{}\"", escape_unescaped_double_quotes(&value))
}

fn quote_strict(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    if value.chars().all(is_shell_safe) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn is_shell_safe(character: char) -> bool {
    character.is_ascii_alphanumeric() || matches!(character, '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-')
}

fn is_quote(character: char) -> bool {
    character == '"' || character == '\''
}

/// Replace every run of adjacent quote characters with the run's last one.
fn collapse_quote_runs(value: &str) -> String {
    let mut collapsed = String::with_capacity(value.len());
    let mut previous_was_quote = false;
    for character in value.chars() {
        let current_is_quote = is_quote(character);
        if current_is_quote && previous_was_quote {
            collapsed.pop();
        }
        collapsed.push(character);
        previous_was_quote = current_is_quote;
    }
    collapsed
}

/// True if `quote` occurs preceded by an even number of backslashes.
fn has_unescaped(value: &str, quote: char) -> bool {
    let mut backslashes = 0usize;
    for character in value.chars() {
        if character == quote && backslashes % 2 == 0 {
            return true;
        }
        backslashes = if character == '\\' { backslashes + 1 } else { 0 };
    }
    false
}

fn escape_unescaped_double_quotes(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 8);
    let mut backslashes = 0usize;
    for character in value.chars() {
        if character == '"' && backslashes % 2 == 0 {
            escaped.push('\\');
        }
        escaped.push(character);
        backslashes = if character == '\\' { backslashes + 1 } else { 0 };
    }
    escaped
}
