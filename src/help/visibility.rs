//! Filtering of commands down to what an actor may see and run.

use log::trace;

use crate::{
    help::ActorContext,
    registry::{CommandId, CommandRegistry},
};

/// Keeps the candidates that are enabled, not hidden and invocable by `actor`.
///
/// Input order is preserved and nothing is sorted here. Cooldowns are not
/// consulted: listing a command must never consume a use of it.
pub fn filter_visible<R: CommandRegistry + ?Sized>(
    registry: &R,
    candidates: &[CommandId],
    actor: &ActorContext,
) -> Vec<CommandId> {
    let mut visible: Vec<CommandId> = Vec::with_capacity(candidates.len());

    for &id in candidates {
        let Some(node) = registry.node(id) else {
            continue;
        };

        if !node.is_enabled() || node.is_hidden() || !registry.can_invoke(id, actor) {
            trace!("hide `{}` from {}", node.qualified_name(), actor.user_id);
            continue;
        }
        // keep the first occurrence of repeated candidates
        if visible.contains(&id) {
            continue;
        }

        visible.push(id);
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        help::Surface,
        registry::{CapabilityCheck, CommandSpec, Registry},
    };

    fn actor(surface: Surface, is_owner: bool) -> ActorContext {
        ActorContext {
            user_id: "@alice:example.com".to_owned(),
            surface,
            prefix: "!pb ".to_owned(),
            is_owner,
        }
    }

    fn create_test_registry() -> Registry {
        let mut registry = Registry::new();
        let root = registry.root();
        for spec in [
            CommandSpec::new("vote"),
            CommandSpec::new("echo").hidden(),
            CommandSpec::new("perks").disabled(),
            CommandSpec::new("clear").capability(CapabilityCheck::RoomOnly),
            CommandSpec::new("stats"),
        ] {
            registry.register(root, spec).unwrap();
        }
        registry
    }

    fn names(registry: &Registry, ids: &[CommandId]) -> Vec<String> {
        ids.iter()
            .map(|id| registry.node(*id).unwrap().qualified_name().to_owned())
            .collect()
    }

    #[test]
    fn test_filter_drops_hidden_disabled_and_forbidden() {
        let registry = create_test_registry();
        let candidates = registry.top_level();

        let visible = filter_visible(&registry, &candidates, &actor(Surface::Private, false));
        assert_eq!(names(&registry, &visible), vec!["vote", "stats"]);
    }

    #[test]
    fn test_filter_depends_on_actor() {
        let registry = create_test_registry();
        let candidates = registry.top_level();

        let visible = filter_visible(
            &registry,
            &candidates,
            &actor(Surface::room("!room:example.com"), true),
        );
        assert_eq!(
            names(&registry, &visible),
            vec!["vote", "clear", "stats"]
        );
    }

    #[test]
    fn test_filter_matches_predicate_exactly() {
        let registry = create_test_registry();
        let candidates = registry.top_level();

        for actor in [
            actor(Surface::Private, false),
            actor(Surface::Private, true),
            actor(Surface::room("!room:example.com"), false),
            actor(Surface::room("!room:example.com"), true),
        ] {
            let visible = filter_visible(&registry, &candidates, &actor);
            for id in &candidates {
                let node = registry.node(*id).unwrap();
                let qualifies =
                    node.is_enabled() && !node.is_hidden() && registry.can_invoke(*id, &actor);
                assert_eq!(visible.contains(id), qualifies, "{}", node.qualified_name());
            }
        }
    }

    #[test]
    fn test_filter_sees_runtime_flag_changes() {
        let registry = create_test_registry();
        let candidates = registry.top_level();
        let actor = actor(Surface::Private, false);

        registry.find("vote").unwrap().set_hidden(true);
        registry.find("perks").unwrap().set_enabled(true);

        let visible = filter_visible(&registry, &candidates, &actor);
        assert_eq!(names(&registry, &visible), vec!["perks", "stats"]);
    }

    #[test]
    fn test_filter_removes_duplicates() {
        let registry = create_test_registry();
        let vote = registry.find("vote").unwrap().id();

        let visible = filter_visible(&registry, &[vote, vote], &actor(Surface::Private, false));
        assert_eq!(visible, vec![vote]);
    }
}
