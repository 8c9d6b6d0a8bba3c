//! Per-actor swipe state: recorded decisions and the cooldown window.
//!
//! Each actor owns one [`ActorSwipes`] slot behind a [`tokio::sync::Mutex`].
//! Holding the slot makes the cooldown check-and-set and the duplicate
//! check a single serialized step for that actor, while different actors
//! never contend.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};

use super::{SwipeDecision, SwipeDirection, UserId};
use crate::error::GatewayError;

/// Result of admitting a swipe against an actor's slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// A new decision was recorded and the cooldown charged.
    Recorded(SwipeDecision),
    /// An unsure decision was replaced; no cooldown charged.
    Redecided(SwipeDecision),
    /// The pair was already decided; the prior decision is returned
    /// unchanged and no cooldown is charged.
    Duplicate(SwipeDecision),
}

impl Admission {
    /// The decision now on record for the pair.
    #[must_use]
    pub const fn decision(&self) -> &SwipeDecision {
        match self {
            Self::Recorded(d) | Self::Redecided(d) | Self::Duplicate(d) => d,
        }
    }
}

/// Swipe state of a single actor.
#[derive(Debug, Default)]
pub struct ActorSwipes {
    next_eligible_at: Option<DateTime<Utc>>,
    decisions: HashMap<UserId, SwipeDecision>,
}

impl ActorSwipes {
    /// Earliest instant the next swipe will be accepted, if a cooldown is
    /// running.
    #[must_use]
    pub const fn next_eligible_at(&self) -> Option<DateTime<Utc>> {
        self.next_eligible_at
    }

    /// Decision recorded for `target`, if any.
    #[must_use]
    pub fn decision_for(&self, target: UserId) -> Option<&SwipeDecision> {
        self.decisions.get(&target)
    }

    /// Checks the cooldown, then records, replaces or deduplicates the swipe.
    ///
    /// The cooldown is checked first: any swipe inside the window is refused
    /// with nothing recorded, even one that would be a duplicate.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Cooldown`] when `now` is before the end of the
    /// current window.
    pub fn admit(
        &mut self,
        actor: UserId,
        target: UserId,
        direction: SwipeDirection,
        now: DateTime<Utc>,
        cooldown: Duration,
    ) -> Result<Admission, GatewayError> {
        if let Some(next) = self.next_eligible_at
            && now < next
        {
            let remaining = (next - now).num_milliseconds().max(1);
            return Err(GatewayError::Cooldown {
                retry_after_ms: u64::try_from(remaining).unwrap_or(u64::MAX),
            });
        }

        let decision = SwipeDecision {
            actor_id: actor,
            target_id: target,
            direction,
            decided_at: now,
        };

        match self.decisions.get(&target) {
            Some(prior)
                if prior.direction == SwipeDirection::Unsure
                    && direction != SwipeDirection::Unsure =>
            {
                self.decisions.insert(target, decision.clone());
                Ok(Admission::Redecided(decision))
            }
            Some(prior) => Ok(Admission::Duplicate(prior.clone())),
            None => {
                self.decisions.insert(target, decision.clone());
                self.next_eligible_at = Some(now + cooldown);
                Ok(Admission::Recorded(decision))
            }
        }
    }

    /// Decisions still marked unsure, oldest first.
    #[must_use]
    pub fn unsure(&self) -> Vec<SwipeDecision> {
        let mut out: Vec<SwipeDecision> = self
            .decisions
            .values()
            .filter(|d| d.direction == SwipeDirection::Unsure)
            .cloned()
            .collect();
        out.sort_by_key(|d| d.decided_at);
        out
    }

    /// Targets with a final (like or pass) decision.
    #[must_use]
    pub fn decided_targets(&self) -> HashSet<UserId> {
        self.decisions
            .values()
            .filter(|d| d.direction != SwipeDirection::Unsure)
            .map(|d| d.target_id)
            .collect()
    }

    /// Number of recorded decisions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    /// Returns `true` if the actor never swiped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }
}

/// All actors' swipe slots.
#[derive(Debug, Default)]
pub struct SwipeLedger {
    actors: RwLock<HashMap<UserId, Arc<Mutex<ActorSwipes>>>>,
}

impl SwipeLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the actor's slot, creating it on first use.
    pub async fn slot(&self, actor: UserId) -> Arc<Mutex<ActorSwipes>> {
        if let Some(slot) = self.actors.read().await.get(&actor) {
            return Arc::clone(slot);
        }
        let mut map = self.actors.write().await;
        Arc::clone(map.entry(actor).or_default())
    }

    /// Returns the actor's slot only if the actor has swiped before.
    pub async fn existing_slot(&self, actor: UserId) -> Option<Arc<Mutex<ActorSwipes>>> {
        self.actors.read().await.get(&actor).cloned()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn cooldown() -> Duration {
        Duration::seconds(30)
    }

    #[test]
    fn first_swipe_is_recorded_and_starts_cooldown() {
        let mut slot = ActorSwipes::default();
        let (actor, target, now) = (UserId::new(), UserId::new(), Utc::now());
        let result = slot.admit(actor, target, SwipeDirection::Like, now, cooldown());
        assert!(matches!(result, Ok(Admission::Recorded(_))));
        assert_eq!(slot.next_eligible_at(), Some(now + cooldown()));
    }

    #[test]
    fn swipe_inside_window_is_refused() {
        let mut slot = ActorSwipes::default();
        let (actor, now) = (UserId::new(), Utc::now());
        let _ = slot.admit(actor, UserId::new(), SwipeDirection::Pass, now, cooldown());
        let later = now + Duration::seconds(10);
        let result = slot.admit(actor, UserId::new(), SwipeDirection::Like, later, cooldown());
        let Err(GatewayError::Cooldown { retry_after_ms }) = result else {
            panic!("expected cooldown");
        };
        assert_eq!(retry_after_ms, 20_000);
        assert_eq!(slot.len(), 1);
    }

    #[test]
    fn same_target_inside_window_is_cooldown_not_duplicate() {
        let mut slot = ActorSwipes::default();
        let (actor, target, now) = (UserId::new(), UserId::new(), Utc::now());
        let _ = slot.admit(actor, target, SwipeDirection::Like, now, cooldown());
        let result = slot.admit(actor, target, SwipeDirection::Like, now, cooldown());
        assert!(matches!(result, Err(GatewayError::Cooldown { .. })));
        assert_eq!(slot.len(), 1);
    }

    #[test]
    fn duplicate_after_window_returns_prior_without_charge() {
        let mut slot = ActorSwipes::default();
        let (actor, target, now) = (UserId::new(), UserId::new(), Utc::now());
        let _ = slot.admit(actor, target, SwipeDirection::Pass, now, cooldown());
        let later = now + Duration::seconds(31);
        let Ok(Admission::Duplicate(prior)) =
            slot.admit(actor, target, SwipeDirection::Like, later, cooldown())
        else {
            panic!("expected duplicate");
        };
        assert_eq!(prior.direction, SwipeDirection::Pass);
        assert_eq!(prior.decided_at, now);
        assert_eq!(slot.next_eligible_at(), Some(now + cooldown()));
    }

    #[test]
    fn unsure_can_be_redecided_without_charge() {
        let mut slot = ActorSwipes::default();
        let (actor, target, now) = (UserId::new(), UserId::new(), Utc::now());
        let _ = slot.admit(actor, target, SwipeDirection::Unsure, now, cooldown());
        assert_eq!(slot.unsure().len(), 1);

        let later = now + Duration::seconds(31);
        let result = slot.admit(actor, target, SwipeDirection::Like, later, cooldown());
        assert!(matches!(result, Ok(Admission::Redecided(_))));
        assert!(slot.unsure().is_empty());
        assert_eq!(slot.next_eligible_at(), Some(now + cooldown()));
        assert!(slot.decided_targets().contains(&target));
    }

    #[test]
    fn unsure_twice_is_duplicate() {
        let mut slot = ActorSwipes::default();
        let (actor, target, now) = (UserId::new(), UserId::new(), Utc::now());
        let _ = slot.admit(actor, target, SwipeDirection::Unsure, now, cooldown());
        let later = now + Duration::seconds(31);
        let result = slot.admit(actor, target, SwipeDirection::Unsure, later, cooldown());
        assert!(matches!(result, Ok(Admission::Duplicate(_))));
    }

    #[tokio::test]
    async fn slot_is_shared_per_actor() {
        let ledger = SwipeLedger::new();
        let actor = UserId::new();
        let a = ledger.slot(actor).await;
        let b = ledger.slot(actor).await;
        assert!(Arc::ptr_eq(&a, &b));
        assert!(ledger.existing_slot(UserId::new()).await.is_none());
    }
}
