use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, RoleActionDefinition, owns_action,
};
use crate::registry::ActionRegistry;
use crate::state::{PlayerId, Session};

/// Whether `actor` may use `action` right now.
///
/// The actor must exist and be alive (death triggers excepted), own the
/// action through a living role or a gift, not be feared tonight (night
/// actions), hold a grant (death triggers), have uses left, and pass the
/// action's own availability rule.
pub fn is_action_available(
    session: &Session,
    registry: &ActionRegistry,
    actor: PlayerId,
    action: ActionId,
) -> bool {
    let Some(role_action) = registry.get(action) else {
        return false;
    };
    let def = role_action.definition();
    let Some(player) = session.player(actor) else {
        return false;
    };

    if def.timing != ActionTiming::DeathTrigger && !player.is_alive() {
        return false;
    }
    if !owns_action(def, session, player) {
        return false;
    }
    match def.timing {
        ActionTiming::Night if session.night.is_feared(actor, session.day) => return false,
        ActionTiming::DeathTrigger
            if session.night.death_trigger_grants.get(&actor) != Some(&action) =>
        {
            return false;
        }
        _ => {}
    }
    if let Some(limit) = def.limit()
        && session.night.usage_count(actor, action) >= limit
    {
        return false;
    }
    role_action.is_available(session, actor)
}

/// Every action `actor` could use right now, in priority order.
pub fn available_actions<'r>(
    session: &Session,
    registry: &'r ActionRegistry,
    actor: PlayerId,
) -> Vec<&'r RoleActionDefinition> {
    registry
        .definitions()
        .into_iter()
        .filter(|def| def.id != ActionId::DeathResolution)
        .filter(|def| is_action_available(session, registry, actor, def.id))
        .collect()
}

/// Targets `actor` may pick for `action`, given tonight's carried effects.
pub fn eligible_targets(
    session: &Session,
    registry: &ActionRegistry,
    actor: PlayerId,
    action: ActionId,
) -> Vec<PlayerId> {
    let Some(role_action) = registry.get(action) else {
        return Vec::new();
    };
    let alive = session.alive_ids();
    let carried: &ActionExecutionResult = &session.night.carried;
    role_action.eligible_targets(session, actor, &alive, carried)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use crate::state::{GameStep, Player};

    fn create_test_session() -> Session {
        let mut session = Session::new(3, 1).with_players([
            Player::new(1, [Role::Werewolf]),
            Player::new(2, [Role::Witch]),
            Player::new(3, [Role::Hunter]),
            Player::new(4, [Role::Villager]),
            Player::new(5, [Role::Seer, Role::Guard]),
        ]);
        session.day = 1;
        session.step = GameStep::Night;
        session
    }

    fn ids(defs: Vec<&RoleActionDefinition>) -> Vec<ActionId> {
        defs.into_iter().map(|def| def.id).collect()
    }

    #[test]
    fn dual_role_player_only_uses_living_role() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        assert_eq!(
            ids(available_actions(&session, &registry, 5)),
            vec![ActionId::GuardProtect, ActionId::SeerCheck]
        );

        session.player_mut(5).unwrap().mark_dead();
        assert_eq!(
            ids(available_actions(&session, &registry, 5)),
            vec![ActionId::GuardProtect]
        );
    }

    #[test]
    fn used_potion_is_no_longer_available() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        session.night.record_usage(2, ActionId::WitchPoison);

        assert!(!is_action_available(&session, &registry, 2, ActionId::WitchPoison));
        assert!(is_action_available(&session, &registry, 2, ActionId::WitchAntidote));
    }

    #[test]
    fn feared_player_cannot_act_tonight() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        session.night.fear_targets.insert(1, 2);

        assert!(available_actions(&session, &registry, 2).is_empty());
        session.day = 2;
        assert!(!available_actions(&session, &registry, 2).is_empty());
    }

    #[test]
    fn death_trigger_needs_a_grant() {
        let registry = ActionRegistry::with_builtin_actions();
        let mut session = create_test_session();
        session.player_mut(3).unwrap().mark_dead();
        assert!(!is_action_available(&session, &registry, 3, ActionId::HunterRevenge));

        session
            .night
            .death_trigger_grants
            .insert(3, ActionId::HunterRevenge);
        assert!(is_action_available(&session, &registry, 3, ActionId::HunterRevenge));
    }

    #[test]
    fn villager_and_unknown_players_have_nothing() {
        let registry = ActionRegistry::with_builtin_actions();
        let session = create_test_session();
        assert!(available_actions(&session, &registry, 4).is_empty());
        assert!(available_actions(&session, &registry, 42).is_empty());
    }
}
