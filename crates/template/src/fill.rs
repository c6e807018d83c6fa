use std::collections::HashMap;

use runny_types::Variable;
use tracing::debug;

use crate::{
    error::ValidationError,
    grammar::extract_placeholders,
    quote::{QuotingMode, quote},
    validate::validate,
};

/// Substitute validated, quoted arguments into `template`.
///
/// Every placeholder occurrence is replaced. A missing argument falls back to
/// the variable's default; an argument supplied as an empty string does not.
/// The output is assembled in a single pass over the template, so substituted
/// values are never scanned for placeholders themselves. A value containing
/// `${...}` is copied through as literal text, so re-parsing the filled line
/// as a template would pick it up as a placeholder.
///
/// ```rust
/// use std::collections::HashMap;
/// use runny_template::{QuotingMode, fill, parse_variables};
///
/// let template = "ls ${Path:path=/home}";
/// let variables = parse_variables(template);
/// let filled = fill(template, &variables, &HashMap::new(), QuotingMode::Heuristic).unwrap();
/// assert_eq!(filled, "ls /home");
/// ```
pub fn fill(
    template: &str,
    variables: &[Variable],
    args: &HashMap<String, String>,
    mode: QuotingMode,
) -> Result<String, ValidationError> {
    let placeholders = extract_placeholders(template);
    let mut replacements: HashMap<&str, String> = HashMap::with_capacity(placeholders.len());

    for placeholder in &placeholders {
        if replacements.contains_key(placeholder.token) {
            continue;
        }
        let name = placeholder.variable.name.as_str();
        let variable = variables
            .iter()
            .find(|variable| variable.name == name)
            .ok_or_else(|| ValidationError::undefined(name))?;
        let value = args.get(name).map(String::as_str).unwrap_or(variable.default.as_str());
        validate(variable, value)?;
        replacements.insert(placeholder.token, quote(value, mode));
    }

    let mut filled = String::with_capacity(template.len());
    let mut cursor = 0usize;
    for placeholder in &placeholders {
        filled.push_str(&template[cursor..placeholder.start]);
        if let Some(replacement) = replacements.get(placeholder.token) {
            filled.push_str(replacement);
        }
        cursor = placeholder.end;
    }
    filled.push_str(&template[cursor..]);

    debug!(placeholders = placeholders.len(), "filled command template");
    Ok(filled)
}
