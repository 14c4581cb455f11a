//! Integration tests for generated usage and help text

use sen_command::{CommandConfig, CommandTree, FlagDecl, TextSource};

fn pad(n: usize) -> String {
    " ".repeat(n)
}

fn account_tree() -> CommandTree {
    CommandTree::new(
        CommandConfig::new("account")
            .description("Perform operations on a user account.")
            .subcommand(
                CommandConfig::new("create")
                    .alias("new")
                    .description("Create a user account.")
                    .flag("name", FlagDecl::string().alias("n").description("Account display name"))
                    .flag("phone", FlagDecl::string().alias("p").description("Account phone number")),
            )
            .subcommand(CommandConfig::new("delete")),
    )
    .unwrap()
}

#[test]
fn test_usage_lists_path_and_aliases() {
    let tree = account_tree();
    let create = tree.find(tree.root(), "create").unwrap();
    let delete = tree.find(tree.root(), "delete").unwrap();

    assert_eq!(
        tree.usage(create),
        "account create <new>  [OPTIONS]\n\n  Create a user account."
    );
    assert_eq!(tree.usage(delete), "account delete [OPTIONS]");
    assert_eq!(tree.command_root(delete), "account delete");
}

#[test]
fn test_description_falls_back_to_usage() {
    let tree = account_tree();
    let delete = tree.find(tree.root(), "delete").unwrap();

    assert_eq!(tree.description(delete), "account delete [OPTIONS]");
}

#[test]
fn test_flag_help_layout() {
    let tree = account_tree();
    let create = tree.find(tree.root(), "create").unwrap();

    let expected = format!(
        "account create <new>  [OPTIONS]\n\
         \n\
         \x20 Create a user account.\n\
         \n\
         Options:\n\
         \n\
         \x20 -name [-n]{tab} : Account display name\n\
         \x20 -phone [-p]{tab} : Account phone number\n",
        tab = pad(4)
    );
    assert_eq!(tree.help(create), expected);
}

#[test]
fn test_subcommand_help_layout() {
    let tree = account_tree();

    let expected = format!(
        "account [OPTIONS]\n\
         \n\
         \x20 Perform operations on a user account.\n\
         \n\
         Options:\n\
         \n\
         \x20 create: {tab}  Create a user account.  Aliases: new.\n\
         \x20 delete: {tab}  account delete [OPTIONS] \n",
        tab = pad(4)
    );
    assert_eq!(tree.help(tree.root()), expected);
}

#[test]
fn test_long_descriptions_wrap() {
    let tree = CommandTree::new(
        CommandConfig::new("report").table_width(40).flag(
            "format",
            FlagDecl::string()
                .alias("f")
                .description("Output format for the rendered report table"),
        ),
    )
    .unwrap();

    // "  -format [-f]\t" is 15 characters; one tab adds 4 more, plus 2
    let indent = pad(21);
    let expected = format!(
        "report [OPTIONS]\n\
         \n\
         Options:\n\
         \n\
         \x20 -format [-f]{tab} : Output format for\n\
         {indent}the rendered report\n\
         {indent}table\n",
        tab = pad(4)
    );
    assert_eq!(tree.help(tree.root()), expected);
}

#[test]
fn test_tab_width_cascades_to_descendants() {
    let mut tree = account_tree();
    let create = tree.find(tree.root(), "create").unwrap();

    tree.set_tab_width(tree.root(), 2).unwrap();
    assert!(tree.help(create).contains(&format!("  -name [-n]{} : ", pad(2))));

    // A node's own value wins over its ancestors'
    tree.set_tab_width(create, 6).unwrap();
    tree.set_tab_width(tree.root(), 1).unwrap();
    assert!(tree.help(create).contains(&format!("  -name [-n]{} : ", pad(6))));
    assert!(tree.help(tree.root()).contains(&format!("  create: {}  ", pad(1))));
}

#[test]
fn test_table_width_cascades_to_descendants() {
    let mut tree = account_tree();
    let create = tree.find(tree.root(), "create").unwrap();
    assert!(tree.help(create).contains(" : Account display name\n"));

    // "  -name [-n]\t" leaves 30 - 18 = 12 columns for the description
    tree.set_table_width(tree.root(), 30).unwrap();
    assert_eq!(tree.table_width(create), 30);
    let expected = format!(
        "  -name [-n]{tab} : Account\n{indent}display\n{indent}name\n",
        tab = pad(4),
        indent = pad(18)
    );
    assert!(tree.help(create).contains(&expected));
}

#[test]
fn test_cascade_reaches_nodes_attached_later() {
    let mut tree = account_tree();
    let root = tree.root();
    tree.set_tab_width(root, 3).unwrap();

    let user = tree.create(CommandConfig::new("user").subcommand(CommandConfig::new("list"))).unwrap();
    let list = tree.find(user, "list").unwrap();
    assert_eq!(tree.tab_width(list), 4);

    tree.attach(root, user).unwrap();
    assert_eq!(tree.tab_width(list), 3);
    assert_eq!(tree.command_root(list), "account user list");
}

#[test]
fn test_custom_usage_and_help() {
    let mut tree = account_tree();
    let create = tree.find(tree.root(), "create").unwrap();

    tree.set_usage(create, Some("create <email> [OPTIONS]".into()))
        .unwrap();
    assert_eq!(tree.usage(create), "create <email> [OPTIONS]");
    assert!(tree.help(create).starts_with("create <email> [OPTIONS]\n\nOptions:"));

    // Custom usage also feeds the parent's listing when there is no description
    let delete = tree.find(tree.root(), "delete").unwrap();
    tree.set_usage(delete, Some(TextSource::dynamic(|| "delete <id>".to_string())))
        .unwrap();
    assert!(tree.help(tree.root()).contains("  delete: "));
    assert!(tree.help(tree.root()).contains("  delete <id> \n"));

    tree.set_help(create, Some("Creates things.".into())).unwrap();
    assert_eq!(tree.help(create), "Creates things.");

    tree.set_help(create, None).unwrap();
    assert!(tree.help(create).contains("Options:"));
}

#[test]
fn test_help_has_no_blank_line_runs() {
    let tree = CommandTree::new(
        CommandConfig::new("notes").description("Line one.\n\n\n\nLine two."),
    )
    .unwrap();

    let help = tree.help(tree.root());
    assert!(!help.contains("\n\n\n"));
    assert!(help.ends_with('\n'));
    assert!(!help.ends_with("\n\n"));
    assert!(!help.contains('\t'));
}

#[test]
fn test_removed_subcommand_leaves_help() {
    let mut tree = account_tree();
    let root = tree.root();
    tree.remove_named(root, "create");

    let help = tree.help(root);
    assert!(!help.contains("create"));
    assert!(help.contains("  delete: "));
}
