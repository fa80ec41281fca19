//! Grouping of visible commands by category and deterministic ordering.

use std::{cmp::Reverse, collections::BTreeMap};

use crate::{
    help::{CategoryOrder, render::help_line},
    registry::{CommandId, CommandNode, CommandRegistry},
};

/// Heading used for commands registered without a category.
pub const NO_CATEGORY: &str = "No Category";

/// One category of the visible command set, commands already ordered.
#[derive(Debug)]
pub struct CategoryBlock<'a> {
    pub name: String,
    pub commands: Vec<&'a CommandNode>,
}

impl CategoryBlock<'_> {
    /// Newline-joined help lines, as they appear in the message.
    pub fn render(&self, prefix: &str) -> String {
        self.commands
            .iter()
            .map(|node| help_line(prefix, node))
            .collect::<Vec<String>>()
            .join("\n")
    }
}

/// Partitions `visible` by category and orders the result.
///
/// Commands inside a category are ordered case-insensitively by qualified
/// name. Categories follow `order`; both policies fall back to the category
/// name so equal keys always come out the same way.
pub fn group_commands<'a, R: CommandRegistry + ?Sized>(
    registry: &'a R,
    visible: &[CommandId],
    prefix: &str,
    order: CategoryOrder,
) -> Vec<CategoryBlock<'a>> {
    let mut by_category: BTreeMap<String, Vec<&'a CommandNode>> = BTreeMap::new();
    for id in visible {
        let Some(node) = registry.node(*id) else {
            continue;
        };
        let category = node.category().unwrap_or(NO_CATEGORY).to_owned();
        by_category.entry(category).or_default().push(node);
    }

    let mut blocks: Vec<CategoryBlock<'a>> = by_category
        .into_iter()
        .map(|(name, mut commands)| {
            commands.sort_by_cached_key(|node| {
                (
                    node.qualified_name().to_lowercase(),
                    node.qualified_name().to_owned(),
                )
            });
            CategoryBlock { name, commands }
        })
        .collect();

    match order {
        CategoryOrder::Alphabetical => {
            blocks.sort_by_cached_key(|block| (block.name.to_lowercase(), block.name.clone()));
        }
        CategoryOrder::Length => {
            blocks.sort_by_cached_key(|block| {
                (
                    Reverse(block.render(prefix).chars().count()),
                    block.name.to_lowercase(),
                    block.name.clone(),
                )
            });
        }
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CommandSpec, Registry};

    fn create_test_registry(commands: &[(&str, Option<&str>, &str)]) -> Registry {
        let mut registry = Registry::new();
        let root = registry.root();
        for (name, category, help) in commands {
            let mut spec = CommandSpec::new(name).help(help);
            if let Some(category) = category {
                spec = spec.category(category);
            }
            registry.register(root, spec).unwrap();
        }
        registry
    }

    fn layout(blocks: &[CategoryBlock]) -> Vec<(String, Vec<String>)> {
        blocks
            .iter()
            .map(|block| {
                (
                    block.name.clone(),
                    block
                        .commands
                        .iter()
                        .map(|n| n.qualified_name().to_owned())
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn test_commands_sorted_case_insensitively() {
        let registry = create_test_registry(&[
            ("zeta", Some("Misc"), ""),
            ("Beta", Some("Misc"), ""),
            ("alpha", Some("Misc"), ""),
        ]);

        let blocks = group_commands(
            &registry,
            &registry.top_level(),
            "!pb ",
            CategoryOrder::Alphabetical,
        );
        assert_eq!(
            layout(&blocks),
            vec![(
                "Misc".to_owned(),
                vec!["alpha".to_owned(), "Beta".to_owned(), "zeta".to_owned()]
            )]
        );
    }

    #[test]
    fn test_alphabetical_category_order() {
        let registry = create_test_registry(&[
            ("vote", Some("misc"), ""),
            ("get", Some("Profiles"), ""),
            ("help", Some("Help"), ""),
            ("loose", None, ""),
        ]);

        let blocks = group_commands(
            &registry,
            &registry.top_level(),
            "!pb ",
            CategoryOrder::Alphabetical,
        );
        let names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Help", "misc", "No Category", "Profiles"]);
    }

    #[test]
    fn test_length_category_order() {
        let registry = create_test_registry(&[
            ("a", Some("Short"), ""),
            ("b", Some("Long"), "A rather long description"),
            ("c", Some("Long"), ""),
            ("d", Some("Medium"), "Some description"),
        ]);

        let blocks = group_commands(
            &registry,
            &registry.top_level(),
            "!pb ",
            CategoryOrder::Length,
        );
        let names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Long", "Medium", "Short"]);
    }

    #[test]
    fn test_length_ties_break_by_name() {
        let registry = create_test_registry(&[
            ("bbb", Some("Zoo"), ""),
            ("aaa", Some("alpha"), ""),
            ("ccc", Some("Mid"), ""),
        ]);

        let blocks = group_commands(
            &registry,
            &registry.top_level(),
            "!pb ",
            CategoryOrder::Length,
        );
        let names: Vec<&str> = blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "Mid", "Zoo"]);
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let registry = create_test_registry(&[
            ("x", Some("One"), "same"),
            ("y", Some("Two"), "same"),
            ("z", Some("Three"), "same"),
        ]);
        let mut visible = registry.top_level();

        let first = layout(&group_commands(&registry, &visible, "!pb ", CategoryOrder::Length));
        visible.reverse();
        let second = layout(&group_commands(&registry, &visible, "!pb ", CategoryOrder::Length));
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input_gives_no_blocks() {
        let registry = create_test_registry(&[("vote", Some("Misc"), "")]);

        assert!(group_commands(&registry, &[], "!pb ", CategoryOrder::Length).is_empty());
    }

    #[test]
    fn test_render_block() {
        let registry = create_test_registry(&[
            ("vote", Some("Misc"), "Gives you a vote link"),
            ("invite", Some("Misc"), ""),
        ]);

        let blocks = group_commands(
            &registry,
            &registry.top_level(),
            "!pb ",
            CategoryOrder::Length,
        );
        assert_eq!(
            blocks[0].render("!pb "),
            "!pb invite\n!pb vote - *Gives you a vote link*"
        );
    }
}
