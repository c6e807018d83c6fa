//! In-place edits of catalogue text.

use runny_types::NewCommand;

use crate::{error::CatalogueError, parser::scan_catalogue};

/// Catalogue written when no catalogue file exists yet.
pub const DEFAULT_CATALOGUE: &str = r#"
# Commands to run on remote server

# Syntax:
# @name <command name (Unique and required)>
# @group <group name (Optional)>
# @desc <command description (Optional)>
# <command ...${variable}>

# - The directive must be on one line.
# - Use only one unique directive per command.
# - No empty lines or comments between directives and the command.

# Command's variables:
# ${name}               - A required variable of 'any' type with no default or restricted values.
# ${Name?}              - An optional variable.
# ${Name:int}           - Specifies the value type. Defaults to 'any'.
# ${Name=John}          - A default value that should match the specified value type.
# ${Name[John|Sara]}    - Accepts only the listed values, matching the value type.
# ${Name[John|Sara|*]}  - Provides auto-completion and allows manual entry of values matching the value type.

# Value types:
# "any"            - Anything (default)
# "int"            - Numbers with no decimals
# "float"          - Only numbers with decimals
# "number"         - Numbers with decimal or integer values
# "non-numeric"    - Strings with no numbers
# "boolean"        - true or false
# "password"       - Strings with no whitespace
# "url"            - A web URL
# "path"           - Matches a clean path
# "flag"           - Command line flag (e.g., -a or -la)
# "option"         - Command line option (e.g., --option or --option-name)

# Examples:
@name List Files
@group Files & Directories
@description List files in a directory
ls ${Path:path=/home}

@name echo
@group Utils
@description Echo a message
echo ${Message=Hello World}

@name Random 32 hex characters
@group Utils
@description Generate random 32 hex password
openssl rand -hex 16
"#;

fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

/// Remove every command line equal to `template` whose resolved name is
/// `name`, together with the directive block directly above it.
///
/// Returns the rewritten text and whether anything was removed. Comments,
/// blank lines, and the text's line ending style are preserved.
pub fn remove_command(text: &str, name: &str, template: &str) -> (String, bool) {
    let template = template.trim();
    let doomed: Vec<(usize, usize)> = scan_catalogue(text)
        .into_iter()
        .filter(|scanned| scanned.name == name && scanned.command == template)
        .map(|scanned| (scanned.block_start, scanned.line_index))
        .collect();
    if doomed.is_empty() {
        return (text.to_string(), false);
    }

    let ending = line_ending(text);
    let kept: Vec<&str> = text
        .lines()
        .enumerate()
        .filter(|(index, _)| !doomed.iter().any(|(start, end)| (*start..=*end).contains(index)))
        .map(|(_, line)| line)
        .collect();

    let mut rewritten = kept.join(ending);
    if text.ends_with('\n') && !rewritten.is_empty() {
        rewritten.push_str(ending);
    }
    (rewritten, true)
}

/// Append a directive block and command line for `new`.
///
/// Trailing whitespace is trimmed first and exactly one blank line separates
/// the new block from earlier content.
pub fn append_command(text: &str, new: &NewCommand) -> Result<String, CatalogueError> {
    let name = new.command_name.trim();
    let group = new.group_name.trim();
    let description = new.description.trim();
    let command = new.command.trim();

    if name.is_empty() {
        return Err(CatalogueError::invalid_input("Missing command name parameter"));
    }
    if command.is_empty() {
        return Err(CatalogueError::invalid_input("Missing command parameter"));
    }
    for (field, value) in [("command name", name), ("group name", group), ("description", description), ("command", command)] {
        if value.contains(['\n', '\r']) {
            return Err(CatalogueError::invalid_input(format!("{field} must be a single line")));
        }
    }
    if command.starts_with('#') || command.starts_with('@') {
        return Err(CatalogueError::invalid_input("command must not start with '#' or '@'"));
    }

    let ending = line_ending(text);
    let mut block = vec![format!("@name {name}")];
    if !group.is_empty() {
        block.push(format!("@group {group}"));
    }
    if !description.is_empty() {
        block.push(format!("@description {description}"));
    }
    block.push(command.to_string());

    let existing = text.trim_end();
    let mut appended = String::with_capacity(existing.len() + 128);
    if !existing.is_empty() {
        appended.push_str(existing);
        appended.push_str(ending);
        appended.push_str(ending);
    }
    appended.push_str(&block.join(ending));
    appended.push_str(ending);
    Ok(appended)
}
