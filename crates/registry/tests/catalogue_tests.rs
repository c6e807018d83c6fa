use std::fs;

use runny_registry::{CatalogueStore, DEFAULT_CATALOGUE, parse_catalogue, remove_command};
use runny_types::NewCommand;

#[test]
fn remove_then_parse_keeps_other_templates_intact() {
    let before = parse_catalogue(DEFAULT_CATALOGUE);

    let (rewritten, removed) = remove_command(DEFAULT_CATALOGUE, "echo", "echo ${Message=Hello World}");
    assert!(removed);

    let after = parse_catalogue(&rewritten);
    assert_eq!(after.len(), before.len() - 1);
    assert!(after.iter().all(|command| command.name != "echo"));

    let expected: Vec<_> = before.iter().filter(|command| command.name != "echo").collect();
    for (kept, original) in after.iter().zip(expected) {
        assert_eq!(kept, original);
    }
}

#[test]
fn remove_keeps_comment_block() {
    let (rewritten, _) = remove_command(DEFAULT_CATALOGUE, "List Files", "ls ${Path:path=/home}");
    assert!(rewritten.contains("# Examples:"));
    assert!(!rewritten.contains("@name List Files"));
    assert!(!rewritten.contains("@group Files & Directories"));
}

#[test]
fn store_round_trips_through_the_file() {
    let directory = tempfile::tempdir().expect("tempdir");
    let path = directory.path().join("commands.txt");
    let store = CatalogueStore::open(&path, true).expect("open");

    let added = store
        .add(&NewCommand {
            command_name: "Tail".into(),
            group_name: "Logs".into(),
            description: "Tail a log file".into(),
            command: "tail -n ${Lines:int=20} ${File[/var/log/syslog|*]}".into(),
        })
        .expect("add");
    assert_eq!(added.variables.len(), 2);

    let reopened = CatalogueStore::open(&path, true).expect("reopen");
    assert_eq!(*reopened.snapshot(), *store.snapshot());

    store.remove("Tail", "tail -n ${Lines:int=20} ${File[/var/log/syslog|*]}").expect("remove");
    let text = fs::read_to_string(&path).expect("read");
    assert!(!text.contains("Tail"));
    assert_eq!(parse_catalogue(&text).len(), 3);
}
