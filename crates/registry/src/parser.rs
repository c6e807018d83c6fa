//! Catalogue text parser.
//!
//! Lines are classified after trimming:
//!
//! - blank or `#` lines separate blocks and drop any pending directives;
//! - `@keyword value` lines are directives (`@name`, `@group`,
//!   `@description`/`@desc`); unknown keywords are skipped but keep the block
//!   contiguous;
//! - anything else is a command template that consumes the pending block.
//!
//! A directive repeated inside one block overwrites the earlier one, so the
//! line closest to the command wins.

use runny_template::parse_variables;
use runny_types::Command;

/// A command line located in catalogue text, with its resolved directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedCommand<'a> {
    /// Index of the command line in `text.lines()`
    pub line_index: usize,
    /// Index of the first directive line of the preceding block; equals
    /// `line_index` when the command has no directives
    pub block_start: usize,
    pub name: &'a str,
    pub group: &'a str,
    pub description: &'a str,
    /// Trimmed command template
    pub command: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directive<'a> {
    Name(&'a str),
    Group(&'a str),
    Description(&'a str),
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line<'a> {
    Separator,
    Directive(Directive<'a>),
    Command(&'a str),
}

#[derive(Debug, Default)]
struct PendingBlock<'a> {
    start: Option<usize>,
    name: &'a str,
    group: &'a str,
    description: &'a str,
}

impl<'a> PendingBlock<'a> {
    fn apply(&mut self, index: usize, directive: Directive<'a>) {
        self.start.get_or_insert(index);
        match directive {
            Directive::Name(value) => self.name = value,
            Directive::Group(value) => self.group = value,
            Directive::Description(value) => self.description = value,
            Directive::Unknown => {}
        }
    }
}

fn classify(raw: &str) -> Line<'_> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return Line::Separator;
    }
    let Some(directive) = line.strip_prefix('@') else {
        return Line::Command(line);
    };

    let (keyword, value) = match directive.find(char::is_whitespace) {
        Some(split) => (&directive[..split], directive[split..].trim()),
        None => (directive, ""),
    };
    let directive = match keyword {
        "name" => Directive::Name(value),
        "group" => Directive::Group(value),
        "description" | "desc" => Directive::Description(value),
        _ => Directive::Unknown,
    };
    Line::Directive(directive)
}

/// Locate every command line in `text` in file order.
pub fn scan_catalogue(text: &str) -> Vec<ScannedCommand<'_>> {
    let mut commands = Vec::new();
    let mut pending = PendingBlock::default();

    for (index, raw) in text.lines().enumerate() {
        match classify(raw) {
            Line::Separator => pending = PendingBlock::default(),
            Line::Directive(directive) => pending.apply(index, directive),
            Line::Command(command) => {
                let block = std::mem::take(&mut pending);
                commands.push(ScannedCommand {
                    line_index: index,
                    block_start: block.start.unwrap_or(index),
                    name: block.name,
                    group: block.group,
                    description: block.description,
                    command,
                });
            }
        }
    }

    commands
}

/// Parse catalogue text into commands with their variables extracted.
pub fn parse_catalogue(text: &str) -> Vec<Command> {
    scan_catalogue(text)
        .into_iter()
        .map(|scanned| {
            Command::new(
                scanned.name,
                scanned.group,
                scanned.description,
                scanned.command,
                parse_variables(scanned.command),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_attach_to_the_next_command() {
        let text = "# header\n@name List\n@group Files\n@desc Show files\nls ${Path:path=/home}\n";
        let commands = parse_catalogue(text);
        assert_eq!(commands.len(), 1);
        let command = &commands[0];
        assert_eq!(command.name, "List");
        assert_eq!(command.group, "Files");
        assert_eq!(command.description, "Show files");
        assert_eq!(command.command, "ls ${Path:path=/home}");
        assert_eq!(command.variables.len(), 1);
        assert_eq!(command.variables[0].default, "/home");
    }

    #[test]
    fn blank_or_comment_lines_reset_pending_directives() {
        let text = "@name Orphan\n\nuptime\n@name Commented\n# note\nwhoami\n";
        let commands = parse_catalogue(text);
        assert_eq!(commands.len(), 2);
        assert!(commands.iter().all(|command| command.name.is_empty()));
    }

    #[test]
    fn closest_repeated_directive_wins() {
        let commands = parse_catalogue("@name First\n@name Second\ndate\n");
        assert_eq!(commands[0].name, "Second");
    }

    #[test]
    fn unknown_directives_are_skipped_without_breaking_the_block() {
        let commands = parse_catalogue("@name Disk\n@owner ops\n@description Usage\ndf -h\n");
        assert_eq!(commands[0].name, "Disk");
        assert_eq!(commands[0].description, "Usage");
    }

    #[test]
    fn lines_are_trimmed_and_crlf_is_accepted() {
        let commands = parse_catalogue("  @name  Spaced Out  \r\n\t echo hi \r\n");
        assert_eq!(commands[0].name, "Spaced Out");
        assert_eq!(commands[0].command, "echo hi");
    }

    #[test]
    fn consecutive_command_lines_do_not_share_directives() {
        let commands = parse_catalogue("@name Pair\nls\npwd\n");
        assert_eq!(commands[0].name, "Pair");
        assert_eq!(commands[1].name, "");
    }

    #[test]
    fn directive_keyword_needs_exact_match() {
        let commands = parse_catalogue("@namespace prod\n@name Real\nls\n");
        assert_eq!(commands[0].name, "Real");
        let commands = parse_catalogue("@named Wrong\nls\n");
        assert_eq!(commands[0].name, "");
    }

    #[test]
    fn scan_reports_block_ranges() {
        let text = "# c\n@name A\n@group G\nls\nuptime\n";
        let scanned = scan_catalogue(text);
        assert_eq!(scanned[0].block_start, 1);
        assert_eq!(scanned[0].line_index, 3);
        assert_eq!(scanned[1].block_start, 4);
        assert_eq!(scanned[1].line_index, 4);
    }
}
