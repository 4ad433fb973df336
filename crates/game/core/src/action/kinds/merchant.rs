//! Merchant trades. A merchant trades once per game; the partner receives a
//! single-use gifted action, unless the partner is a wolf, in which case the
//! merchant dies.
use crate::action::kinds::{reject_self, target_of};
use crate::action::{
    ActionExecutionResult, ActionId, ActionTiming, DeathCause, ExecuteError, RoleAction,
    RoleActionDefinition, RoleActionInstance, ValidationError, is_skip, validate_defaults,
};
use crate::config::NightConfig;
use crate::role::Role;
use crate::state::{PlayerId, Session};

const TRADE_IDS: [ActionId; 3] = [
    ActionId::DarkMerchantTradeSeer,
    ActionId::DarkMerchantTradePoison,
    ActionId::MiracleMerchantTradeGuard,
];

const TRADE_SEER: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::DarkMerchantTradeSeer,
    NightConfig::MERCHANT_TRADE_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::DarkMerchant])
.usage_limit(1);

const TRADE_POISON: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::DarkMerchantTradePoison,
    NightConfig::MERCHANT_TRADE_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::DarkMerchant])
.usage_limit(1);

const TRADE_GUARD: RoleActionDefinition = RoleActionDefinition::new(
    ActionId::MiracleMerchantTradeGuard,
    NightConfig::MERCHANT_TRADE_PRIORITY,
    ActionTiming::Night,
)
.owned_by(&[Role::MiracleMerchant])
.usage_limit(1);

#[derive(Debug, Clone, Copy)]
pub struct MerchantTrade {
    def: &'static RoleActionDefinition,
    gift: ActionId,
}

impl MerchantTrade {
    pub const fn seer() -> Self {
        Self {
            def: &TRADE_SEER,
            gift: ActionId::MerchantSeerCheck,
        }
    }

    pub const fn poison() -> Self {
        Self {
            def: &TRADE_POISON,
            gift: ActionId::MerchantPoison,
        }
    }

    pub const fn guard() -> Self {
        Self {
            def: &TRADE_GUARD,
            gift: ActionId::MerchantGuardProtect,
        }
    }

    pub const fn gift(&self) -> ActionId {
        self.gift
    }

    /// Whether `actor` already traded, or has a trade pending tonight.
    ///
    /// A pending instance of `replacing` is ignored, since an override
    /// swaps it out rather than adding a second trade.
    fn has_traded(session: &Session, actor: PlayerId, replacing: Option<ActionId>) -> bool {
        let used = TRADE_IDS
            .iter()
            .any(|id| session.night.usage_count(actor, *id) > 0);
        let pending = session.night.instances_for(actor).any(|inst| {
            inst.action_id
                .is_some_and(|id| id.is_merchant_trade() && Some(id) != replacing)
                && inst.status.is_terminal()
                && !inst.is_skip()
        });
        used || pending
    }
}

impl RoleAction for MerchantTrade {
    fn definition(&self) -> &RoleActionDefinition {
        self.def
    }

    fn eligible_targets(
        &self,
        _session: &Session,
        actor: PlayerId,
        alive: &[PlayerId],
        _accumulated: &ActionExecutionResult,
    ) -> Vec<PlayerId> {
        alive.iter().copied().filter(|id| *id != actor).collect()
    }

    fn validate(
        &self,
        session: &Session,
        actor: PlayerId,
        targets: &[PlayerId],
    ) -> Result<(), ValidationError> {
        validate_defaults(self.def, session, actor, targets)?;
        reject_self(actor, targets)?;
        if !is_skip(targets) && Self::has_traded(session, actor, Some(self.def.id)) {
            return Err(ValidationError::Rule("merchant has already traded"));
        }
        Ok(())
    }

    fn is_available(&self, session: &Session, actor: PlayerId) -> bool {
        !Self::has_traded(session, actor, None)
    }

    fn execute(
        &self,
        session: &mut Session,
        instance: &RoleActionInstance,
        mut accumulated: ActionExecutionResult,
    ) -> Result<ActionExecutionResult, ExecuteError> {
        let target = target_of(instance)?;
        if session.player(target).is_none() {
            return Err(ExecuteError::MissingTarget {
                action: self.def.id,
                target,
            });
        }
        if session.is_wolf(target) {
            accumulated.add_death(DeathCause::TradedWithWolf, instance.actor);
        } else {
            session
                .night
                .gifted_actions
                .entry(target)
                .or_default()
                .insert(self.gift);
        }
        Ok(accumulated)
    }
}
