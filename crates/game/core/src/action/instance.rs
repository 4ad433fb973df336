//! One actor's concrete attempt to use an action this phase.
use crate::action::ActionId;
use crate::config::SKIP_TARGET_ID;
use crate::role::Role;
use crate::state::PlayerId;

/// Lifecycle of an action instance.
///
/// `Pending → Acting → {Submitted | Skipped} → Processed`. A direct submission
/// may jump from `Pending` to `Submitted`/`Skipped`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionStatus {
    /// Prompted, nothing chosen yet.
    Pending,
    /// Action chosen, target not yet confirmed.
    Acting,
    Submitted,
    Skipped,
    /// Executed; frozen from here on.
    Processed,
}

impl ActionStatus {
    /// Terminal statuses count as "already acted" for this phase.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Submitted | Self::Skipped | Self::Processed)
    }

    pub const fn can_transition_to(self, next: ActionStatus) -> bool {
        use ActionStatus::*;
        matches!(
            (self, next),
            (Pending, Pending | Acting | Submitted | Skipped)
                | (Acting, Pending | Acting | Submitted | Skipped)
                | (Submitted | Skipped, Processed)
        )
    }
}

/// Who put the instance into its current state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SubmissionSource {
    Player,
    Judge,
    System,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoleActionInstance {
    pub actor: PlayerId,
    /// Actor's role when the instance was created; `None` for engine-made records.
    pub actor_role: Option<Role>,
    pub action_id: Option<ActionId>,
    pub targets: Vec<PlayerId>,
    pub submitted_by: SubmissionSource,
    pub status: ActionStatus,
}

impl RoleActionInstance {
    pub fn new(actor: PlayerId, actor_role: Option<Role>, source: SubmissionSource) -> Self {
        Self {
            actor,
            actor_role,
            action_id: None,
            targets: Vec::new(),
            submitted_by: source,
            status: ActionStatus::Pending,
        }
    }

    /// An already-decided instance, used for engine-made and rebuilt records.
    pub fn decided(
        actor: PlayerId,
        actor_role: Option<Role>,
        action: ActionId,
        targets: Vec<PlayerId>,
        source: SubmissionSource,
    ) -> Self {
        let status = if targets.contains(&SKIP_TARGET_ID) {
            ActionStatus::Skipped
        } else {
            ActionStatus::Submitted
        };
        Self {
            actor,
            actor_role,
            action_id: Some(action),
            targets,
            submitted_by: source,
            status,
        }
    }

    /// Moves to `next` if the lifecycle allows it.
    ///
    /// Returns `false` and leaves the status untouched otherwise.
    pub fn transition(&mut self, next: ActionStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }

    pub fn is_skip(&self) -> bool {
        self.targets.contains(&SKIP_TARGET_ID)
    }

    /// First real (non-skip) target.
    pub fn first_target(&self) -> Option<PlayerId> {
        self.targets
            .iter()
            .copied()
            .find(|target| *target != SKIP_TARGET_ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_rejects_backwards_moves() {
        let mut inst = RoleActionInstance::new(2, Some(Role::Seer), SubmissionSource::Player);

        assert!(inst.transition(ActionStatus::Acting));
        assert!(inst.transition(ActionStatus::Submitted));
        assert!(!inst.transition(ActionStatus::Pending));
        assert!(inst.transition(ActionStatus::Processed));
        assert!(!inst.transition(ActionStatus::Submitted));
        assert_eq!(inst.status, ActionStatus::Processed);
    }

    #[test]
    fn decided_with_skip_sentinel_is_skipped() {
        let inst = RoleActionInstance::decided(
            4,
            None,
            ActionId::WitchPoison,
            vec![SKIP_TARGET_ID],
            SubmissionSource::System,
        );
        assert_eq!(inst.status, ActionStatus::Skipped);
        assert_eq!(inst.first_target(), None);
    }
}
