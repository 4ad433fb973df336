//! Group votes for collective actions (the pack's kill).
//!
//! Each electorate member casts at most one vote; a later vote replaces the
//! earlier one. Members who never voted count as skips once the phase closes.
//! Skips never win unless everyone skipped, in which case no instance is
//! produced. Ties are broken uniformly at random through the injected
//! [`RngOracle`].
use std::collections::BTreeMap;

use thiserror::Error;

use crate::action::{ActionId, RoleActionInstance, SubmissionSource};
use crate::config::SKIP_TARGET_ID;
use crate::env::RngOracle;
use crate::error::{ErrorSeverity, GameError};
use crate::state::{PlayerId, Session};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupVote {
    pub voter: PlayerId,
    /// May be [`SKIP_TARGET_ID`].
    pub target: PlayerId,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VoteError {
    #[error("no vote is open for {0}")]
    NotOpen(ActionId),

    #[error("player {0} is not part of this vote")]
    NotInElectorate(PlayerId),

    #[error("the vote is already closed")]
    AlreadyResolved,

    #[error("player {0} cannot be voted for")]
    IneligibleTarget(PlayerId),
}

impl GameError for VoteError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotOpen(_) | Self::AlreadyResolved => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::NotOpen(_) | Self::AlreadyResolved => "wrong_phase",
            Self::NotInElectorate(_) => "not_available",
            Self::IneligibleTarget(_) => "rule_violation",
        }
    }
}

/// Vote bookkeeping for one collective action.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupActionState {
    pub action_id: ActionId,
    pub electorate: Vec<PlayerId>,
    pub votes: Vec<GroupVote>,
    pub resolved: bool,
}

impl GroupActionState {
    pub fn new(action_id: ActionId, electorate: Vec<PlayerId>) -> Self {
        Self {
            action_id,
            electorate,
            votes: Vec::new(),
            resolved: false,
        }
    }

    /// Records or replaces `voter`'s vote.
    ///
    /// `eligible` lists the valid non-skip targets.
    pub fn submit_vote(
        &mut self,
        voter: PlayerId,
        target: PlayerId,
        eligible: &[PlayerId],
    ) -> Result<(), VoteError> {
        if self.resolved {
            return Err(VoteError::AlreadyResolved);
        }
        if !self.electorate.contains(&voter) {
            return Err(VoteError::NotInElectorate(voter));
        }
        if target != SKIP_TARGET_ID && !eligible.contains(&target) {
            return Err(VoteError::IneligibleTarget(target));
        }

        match self.votes.iter_mut().find(|vote| vote.voter == voter) {
            Some(existing) => existing.target = target,
            None => self.votes.push(GroupVote { voter, target }),
        }
        Ok(())
    }

    pub fn has_voted(&self, voter: PlayerId) -> bool {
        self.votes.iter().any(|vote| vote.voter == voter)
    }

    pub fn all_voted(&self) -> bool {
        self.electorate.iter().all(|member| self.has_voted(*member))
    }

    pub fn has_real_votes(&self) -> bool {
        self.votes.iter().any(|vote| vote.target != SKIP_TARGET_ID)
    }

    /// Records a skip for every member who has not voted.
    pub fn fill_skips(&mut self) {
        let missing: Vec<PlayerId> = self
            .electorate
            .iter()
            .copied()
            .filter(|member| !self.has_voted(*member))
            .collect();
        self.votes.extend(missing.into_iter().map(|voter| GroupVote {
            voter,
            target: SKIP_TARGET_ID,
        }));
    }

    /// Non-skip vote counts per target.
    pub fn tally(&self) -> BTreeMap<PlayerId, usize> {
        let mut counts = BTreeMap::new();
        for vote in self.votes.iter().filter(|v| v.target != SKIP_TARGET_ID) {
            *counts.entry(vote.target).or_insert(0) += 1;
        }
        counts
    }

    /// Winning target, if any. Ties are broken with `rng` and `seed`.
    ///
    /// Does not touch the resolved flag, so a lost outcome can be recomputed.
    pub fn outcome(&self, rng: &dyn RngOracle, seed: u64) -> Option<PlayerId> {
        let counts = self.tally();
        let top = counts.values().copied().max()?;
        let leaders: Vec<PlayerId> = counts
            .into_iter()
            .filter(|(_, count)| *count == top)
            .map(|(target, _)| target)
            .collect();
        match leaders.as_slice() {
            [single] => Some(*single),
            _ => rng.pick_index(seed, leaders.len()).map(|idx| leaders[idx]),
        }
    }

    /// Closes the vote and builds the collective instance.
    ///
    /// Missing votes become skips first. The instance is attributed to the
    /// first alive electorate member and submitted by the system. Returns
    /// `None` when nobody voted for a real target.
    pub fn resolve(
        &mut self,
        session: &Session,
        rng: &dyn RngOracle,
        seed: u64,
    ) -> Option<RoleActionInstance> {
        self.fill_skips();
        self.resolved = true;
        self.to_instance(session, rng, seed)
    }

    /// Builds the collective instance from the current votes without closing.
    pub fn to_instance(
        &self,
        session: &Session,
        rng: &dyn RngOracle,
        seed: u64,
    ) -> Option<RoleActionInstance> {
        let target = self.outcome(rng, seed)?;
        let representative = self
            .electorate
            .iter()
            .copied()
            .find(|member| session.is_alive(*member))?;
        let role = session
            .player(representative)
            .and_then(|player| player.primary_role());
        Some(RoleActionInstance::decided(
            representative,
            role,
            self.action_id,
            vec![target],
            SubmissionSource::System,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionStatus;
    use crate::env::PcgRng;
    use crate::role::Role;
    use crate::state::Player;

    /// Always picks the same slot.
    struct FixedRng(u32);

    impl RngOracle for FixedRng {
        fn next_u32(&self, _seed: u64) -> u32 {
            self.0
        }
    }

    fn create_test_session() -> Session {
        Session::new(1, 5).with_players([
            Player::new(1, [Role::Werewolf]),
            Player::new(2, [Role::Werewolf]),
            Player::new(3, [Role::WolfKing]),
            Player::new(4, [Role::Seer]),
            Player::new(5, [Role::Villager]),
        ])
    }

    fn create_test_vote() -> GroupActionState {
        GroupActionState::new(ActionId::WerewolfKill, vec![1, 2, 3])
    }

    const ELIGIBLE: &[PlayerId] = &[4, 5];

    #[test]
    fn majority_wins() {
        let session = create_test_session();
        let mut vote = create_test_vote();
        vote.submit_vote(1, 4, ELIGIBLE).unwrap();
        vote.submit_vote(2, 4, ELIGIBLE).unwrap();
        vote.submit_vote(3, SKIP_TARGET_ID, ELIGIBLE).unwrap();

        let inst = vote.resolve(&session, &PcgRng, 0).unwrap();

        assert_eq!(inst.targets, vec![4]);
        assert_eq!(inst.actor, 1);
        assert_eq!(inst.submitted_by, SubmissionSource::System);
        assert_eq!(inst.status, ActionStatus::Submitted);
        assert!(vote.resolved);
    }

    #[test]
    fn tie_is_broken_among_leaders_never_skip() {
        let session = create_test_session();
        for slot in 0..4 {
            let mut vote = create_test_vote();
            vote.submit_vote(1, 4, ELIGIBLE).unwrap();
            vote.submit_vote(2, 5, ELIGIBLE).unwrap();

            let inst = vote.resolve(&session, &FixedRng(slot), 0).unwrap();
            let expected = if slot % 2 == 0 { 4 } else { 5 };
            assert_eq!(inst.targets, vec![expected]);
        }
    }

    #[test]
    fn all_skip_produces_nothing() {
        let session = create_test_session();
        let mut vote = create_test_vote();
        vote.submit_vote(1, SKIP_TARGET_ID, ELIGIBLE).unwrap();

        assert!(vote.resolve(&session, &PcgRng, 0).is_none());
        assert_eq!(vote.votes.len(), 3);
    }

    #[test]
    fn revote_replaces_previous_vote() {
        let mut vote = create_test_vote();
        vote.submit_vote(1, 4, ELIGIBLE).unwrap();
        vote.submit_vote(1, 5, ELIGIBLE).unwrap();

        assert_eq!(vote.votes, vec![GroupVote { voter: 1, target: 5 }]);
    }

    #[test]
    fn rejects_outsiders_closed_votes_and_bad_targets() {
        let session = create_test_session();
        let mut vote = create_test_vote();

        assert_eq!(
            vote.submit_vote(4, 5, ELIGIBLE),
            Err(VoteError::NotInElectorate(4))
        );
        assert_eq!(
            vote.submit_vote(1, 2, ELIGIBLE),
            Err(VoteError::IneligibleTarget(2))
        );

        vote.resolve(&session, &PcgRng, 0);
        assert_eq!(
            vote.submit_vote(1, 4, ELIGIBLE),
            Err(VoteError::AlreadyResolved)
        );
    }

    #[test]
    fn representative_skips_dead_members() {
        let mut session = create_test_session();
        session.player_mut(1).unwrap().mark_dead();
        let mut vote = create_test_vote();
        vote.submit_vote(2, 5, ELIGIBLE).unwrap();

        let inst = vote.resolve(&session, &PcgRng, 0).unwrap();
        assert_eq!(inst.actor, 2);
    }
}
