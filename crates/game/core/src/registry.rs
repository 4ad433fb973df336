//! Action registry: id → action implementation and definition.
//!
//! Built once at startup and shared read-only afterwards; nothing mutates it
//! while a night runs, so it needs no locking.
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::action::{ActionId, ActionTiming, RoleAction, RoleActionDefinition, kinds};
use crate::role::Role;

#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: BTreeMap<ActionId, Arc<dyn RoleAction>>,
}

impl ActionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in action.
    pub fn with_builtin_actions() -> Self {
        let mut registry = Self::new();
        for action in kinds::builtin() {
            registry.register_boxed(action);
        }
        registry
    }

    /// Registers `action`, replacing any previous action with the same id.
    pub fn register(&mut self, action: impl RoleAction + 'static) -> &mut Self {
        self.actions.insert(action.id(), Arc::new(action));
        self
    }

    fn register_boxed(&mut self, action: Box<dyn RoleAction>) {
        self.actions.insert(action.id(), Arc::from(action));
    }

    pub fn get(&self, id: ActionId) -> Option<&Arc<dyn RoleAction>> {
        self.actions.get(&id)
    }

    pub fn definition(&self, id: ActionId) -> Option<&RoleActionDefinition> {
        self.actions.get(&id).map(|action| action.definition())
    }

    /// Resolution priority; `None` for ids with no registered action.
    pub fn priority(&self, id: ActionId) -> Option<i32> {
        self.definition(id).map(|def| def.priority)
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.actions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Definitions ordered by priority, ties by id.
    pub fn definitions(&self) -> Vec<&RoleActionDefinition> {
        let mut defs: Vec<_> = self.actions.values().map(|a| a.definition()).collect();
        defs.sort_by_key(|def| (def.priority, def.id));
        defs
    }

    /// Actions a role owns in its own right (gifts excluded).
    pub fn actions_for_role(&self, role: Role) -> Vec<&RoleActionDefinition> {
        self.definitions()
            .into_iter()
            .filter(|def| def.is_owned_by(role))
            .collect()
    }

    /// Night actions a role owns.
    pub fn night_actions_for_role(&self, role: Role) -> Vec<&RoleActionDefinition> {
        self.actions_for_role(role)
            .into_iter()
            .filter(|def| matches!(def.timing, ActionTiming::Night | ActionTiming::Anytime))
            .collect()
    }
}

impl core::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn builtin_registry_covers_every_executable_action() {
        let registry = ActionRegistry::with_builtin_actions();
        for id in ActionId::iter() {
            if id == ActionId::GhostRiderReflect {
                assert!(!registry.contains(id), "reflect is a history-only record");
            } else {
                assert!(registry.contains(id), "{id} should be registered");
            }
        }
    }

    #[test]
    fn wolf_kill_is_shared_by_the_pack() {
        let registry = ActionRegistry::with_builtin_actions();
        for role in [
            Role::Werewolf,
            Role::WolfKing,
            Role::WolfBrother,
            Role::WolfYoungerBrother,
            Role::Nightmare,
        ] {
            assert!(
                registry
                    .actions_for_role(role)
                    .iter()
                    .any(|def| def.id == ActionId::WerewolfKill),
                "{role} should own the wolf kill"
            );
        }
        assert!(registry.actions_for_role(Role::Villager).is_empty());
        assert!(registry.actions_for_role(Role::GhostRider).is_empty());
    }

    #[test]
    fn definitions_are_priority_ordered() {
        let registry = ActionRegistry::with_builtin_actions();
        let defs = registry.definitions();
        assert_eq!(defs.first().map(|d| d.id), Some(ActionId::NightmareFear));
        assert_eq!(defs.last().map(|d| d.id), Some(ActionId::DeathResolution));
        assert_eq!(registry.priority(ActionId::GhostRiderReflect), None);
    }

    #[test]
    fn witch_owns_both_potions() {
        let registry = ActionRegistry::with_builtin_actions();
        let ids: Vec<_> = registry
            .night_actions_for_role(Role::Witch)
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![ActionId::WitchAntidote, ActionId::WitchPoison]);
        assert!(registry.night_actions_for_role(Role::Hunter).is_empty());
    }
}
