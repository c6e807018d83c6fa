//! Placeholder grammar.
//!
//! A placeholder is `${` + name + modifiers + `}`. Modifiers may appear in any
//! order after the name:
//!
//! | Modifier | Meaning |
//! |---|---|
//! | `?` | optional |
//! | `:type` | value type, runs until `?`, `=`, `[` or the end |
//! | `=default` | default value, runs until `[` or the end |
//! | `[a\|b]` | listed values; a `*` entry lifts the restriction |
//!
//! The token ends at the first `}` after `${`.

use runny_types::{Variable, VariableType};
use tracing::debug;

/// A single `${...}` occurrence with its byte range in the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Full token text including `${` and `}`
    pub token: &'a str,
    pub start: usize,
    pub end: usize,
    /// Declaration parsed from the token
    pub variable: Variable,
}

/// Find every placeholder occurrence in `template`, in source order.
///
/// ```rust
/// use runny_template::extract_placeholders;
///
/// let found = extract_placeholders("ls ${Path:path=/home} ${Flags?}");
/// assert_eq!(found.len(), 2);
/// assert_eq!(found[0].token, "${Path:path=/home}");
/// assert_eq!(found[0].variable.default, "/home");
/// assert!(found[1].variable.optional);
/// ```
pub fn extract_placeholders(template: &str) -> Vec<Placeholder<'_>> {
    let mut placeholders = Vec::new();
    let mut offset = 0usize;

    while let Some(relative_start) = template[offset..].find("${") {
        let start = offset + relative_start;
        let body_start = start + 2;
        let Some(relative_end) = template[body_start..].find('}') else {
            break;
        };
        let body_end = body_start + relative_end;
        let end = body_end + 1;

        match parse_body(&template[body_start..body_end]) {
            Some(variable) => {
                placeholders.push(Placeholder {
                    token: &template[start..end],
                    start,
                    end,
                    variable,
                });
                offset = end;
            }
            None => offset = body_start,
        }
    }

    placeholders
}

/// Extract the variable declarations of a template.
///
/// A name declared more than once yields a single variable; the first
/// occurrence defines it.
pub fn parse_variables(template: &str) -> Vec<Variable> {
    let mut variables: Vec<Variable> = Vec::new();
    for placeholder in extract_placeholders(template) {
        if variables.iter().any(|known| known.name == placeholder.variable.name) {
            continue;
        }
        variables.push(placeholder.variable);
    }
    variables
}

fn parse_body(body: &str) -> Option<Variable> {
    let name_end = body.find(['?', ':', '=', '[']).unwrap_or(body.len());
    let name = &body[..name_end];
    if name.trim().is_empty() {
        return None;
    }

    let mut variable = Variable {
        name: name.to_string(),
        ..Variable::default()
    };

    let mut rest = &body[name_end..];
    loop {
        let mut chars = rest.chars();
        let Some(marker) = chars.next() else {
            break;
        };
        rest = chars.as_str();

        match marker {
            '?' => variable.optional = true,
            ':' => {
                let type_end = rest.find(['?', '=', '[']).unwrap_or(rest.len());
                variable.kind = parse_type(&rest[..type_end]);
                rest = &rest[type_end..];
            }
            '=' => {
                let default_end = rest.find('[').unwrap_or(rest.len());
                variable.default = rest[..default_end].to_string();
                rest = &rest[default_end..];
            }
            '[' => {
                let values_end = rest.find(']').unwrap_or(rest.len());
                let (values, restricted) = split_values(&rest[..values_end]);
                variable.values = values;
                variable.restricted = restricted;
                rest = rest.get(values_end + 1..).unwrap_or("");
            }
            // stray text after a closed value list
            _ => {}
        }
    }

    Some(variable)
}

fn parse_type(raw: &str) -> Option<VariableType> {
    let raw = raw.trim();
    match raw.parse() {
        Ok(kind) => Some(kind),
        Err(error) => {
            debug!("ignoring placeholder type: {}", error);
            None
        }
    }
}

fn split_values(raw: &str) -> (Vec<String>, bool) {
    let mut values: Vec<String> = Vec::new();
    for value in raw.split('|') {
        if value.is_empty() || values.iter().any(|known| known == value) {
            continue;
        }
        values.push(value.to_string());
    }
    let restricted = !values.is_empty() && !values.iter().any(|value| value == "*");
    (values, restricted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(template: &str) -> Variable {
        let mut variables = parse_variables(template);
        assert_eq!(variables.len(), 1, "expected one variable in {template:?}");
        variables.remove(0)
    }

    #[test]
    fn plain_placeholder_is_required_and_untyped() {
        let variable = single("echo ${name}");
        assert_eq!(variable.name, "name");
        assert!(!variable.optional);
        assert_eq!(variable.kind, None);
        assert!(!variable.restricted);
        assert!(variable.default.is_empty());
    }

    #[test]
    fn each_modifier_is_recognized() {
        assert!(single("${Name?}").optional);
        assert_eq!(single("${Name:int}").kind, Some(VariableType::Int));
        assert_eq!(single("${Name=John}").default, "John");

        let listed = single("${Name[John|Sara]}");
        assert_eq!(listed.values, vec!["John", "Sara"]);
        assert!(listed.restricted);

        let suggested = single("${Name[John|Sara|*]}");
        assert_eq!(suggested.values, vec!["John", "Sara", "*"]);
        assert!(!suggested.restricted);
    }

    #[test]
    fn modifiers_compose_in_any_order() {
        let forward = single("${Port?:int=8080[80|8080]}");
        let shuffled = single("${Port:int[80|8080]?=8080}");
        for variable in [&forward, &shuffled] {
            assert_eq!(variable.name, "Port");
            assert!(variable.optional);
            assert_eq!(variable.kind, Some(VariableType::Int));
            assert_eq!(variable.default, "8080");
            assert_eq!(variable.values, vec!["80", "8080"]);
        }
    }

    #[test]
    fn default_may_contain_colons_and_question_marks() {
        let variable = single("curl ${Target:url=https://example.com/a?b=1}");
        assert_eq!(variable.kind, Some(VariableType::Url));
        assert_eq!(variable.default, "https://example.com/a?b=1");
    }

    #[test]
    fn unknown_type_is_dropped() {
        let variable = single("${Name:string}");
        assert_eq!(variable.kind, None);
    }

    #[test]
    fn listed_values_are_deduplicated_without_empties() {
        let variable = single("${Mode[a||b|a]}");
        assert_eq!(variable.values, vec!["a", "b"]);
    }

    #[test]
    fn repeated_names_produce_one_variable() {
        let variables = parse_variables("cp ${File} ${File}.bak ${Dest}");
        let names: Vec<_> = variables.iter().map(|variable| variable.name.as_str()).collect();
        assert_eq!(names, vec!["File", "Dest"]);
    }

    #[test]
    fn empty_or_unterminated_tokens_are_not_placeholders() {
        assert!(parse_variables("echo ${} ${").is_empty());
        assert!(parse_variables("echo $HOME ${?}").is_empty());
    }

    #[test]
    fn placeholder_ranges_cover_the_token() {
        let template = "a ${x} b ${y=1}";
        let placeholders = extract_placeholders(template);
        assert_eq!(&template[placeholders[0].start..placeholders[0].end], "${x}");
        assert_eq!(&template[placeholders[1].start..placeholders[1].end], "${y=1}");
    }
}
