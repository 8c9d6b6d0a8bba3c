//! Swipe admission: validation, cooldown, deduplication, then matching.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::match_engine::MatchEngine;
use crate::domain::{
    Admission, DomainEvent, EventBus, Match, SwipeDecision, SwipeDirection, SwipeLedger,
    UserDirectory, UserId,
};
use crate::error::GatewayError;

/// Result of an accepted swipe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SwipeOutcome {
    /// The decision on record for the pair.
    pub decision: SwipeDecision,
    /// `true` if this request recorded or replaced a decision.
    pub accepted: bool,
    /// `true` if the pair had already been decided; nothing changed.
    pub duplicate: bool,
    /// `true` if an unsure decision was replaced.
    pub redecision: bool,
    /// The match for the pair, when one exists after this request.
    pub matched: Option<Match>,
}

/// Entry point for swipes.
///
/// Admission runs under the actor's swipe slot; the slot is released
/// before a like is forwarded to the [`MatchEngine`], so an actor's swipe
/// never waits on another pair's lock.
#[derive(Debug, Clone)]
pub struct SwipeService {
    directory: Arc<UserDirectory>,
    ledger: Arc<SwipeLedger>,
    match_engine: Arc<MatchEngine>,
    event_bus: EventBus,
    cooldown: chrono::Duration,
}

impl SwipeService {
    /// Creates the service with the given cooldown window.
    #[must_use]
    pub fn new(
        directory: Arc<UserDirectory>,
        ledger: Arc<SwipeLedger>,
        match_engine: Arc<MatchEngine>,
        event_bus: EventBus,
        cooldown: std::time::Duration,
    ) -> Self {
        Self {
            directory,
            ledger,
            match_engine,
            event_bus,
            cooldown: chrono::Duration::from_std(cooldown)
                .unwrap_or_else(|_| chrono::Duration::seconds(i64::from(u32::MAX))),
        }
    }

    /// Returns the match engine.
    #[must_use]
    pub fn match_engine(&self) -> &Arc<MatchEngine> {
        &self.match_engine
    }

    /// Attempts a swipe at server time `now`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Validation`] for a self-swipe.
    /// - [`GatewayError::UserNotFound`] for an unknown actor or target.
    /// - [`GatewayError::Banned`] if the actor is banned.
    /// - [`GatewayError::Cooldown`] inside the actor's cooldown window.
    pub async fn attempt_swipe(
        &self,
        actor: UserId,
        target: UserId,
        direction: SwipeDirection,
        now: DateTime<Utc>,
    ) -> Result<SwipeOutcome, GatewayError> {
        if actor == target {
            return Err(GatewayError::Validation(
                "a user cannot swipe on themselves".to_string(),
            ));
        }
        let _ = self.directory.get(actor).await?;
        let _ = self.directory.get(target).await?;
        self.directory.ensure_active(actor).await?;

        let admission = {
            let slot = self.ledger.slot(actor).await;
            let mut swipes = slot.lock().await;
            swipes.admit(actor, target, direction, now, self.cooldown)?
        };

        let (decision, duplicate, redecision) = match admission {
            Admission::Recorded(d) => (d, false, false),
            Admission::Redecided(d) => (d, false, true),
            Admission::Duplicate(d) => (d, true, false),
        };

        if !duplicate {
            let _ = self.event_bus.publish(DomainEvent::SwipeRecorded {
                actor_id: actor,
                target_id: target,
                direction: decision.direction,
                redecision,
                timestamp: decision.decided_at,
            });
            tracing::debug!(%actor, %target, direction = decision.direction.as_str(), redecision, "swipe recorded");
        }

        let matched = match (decision.direction, duplicate) {
            (SwipeDirection::Like, false) => self
                .match_engine
                .register_like(actor, target, now)
                .await?
                .into_match(),
            (SwipeDirection::Like, true) => self.match_engine.match_for(actor, target).await,
            _ => None,
        };

        Ok(SwipeOutcome {
            decision,
            accepted: !duplicate,
            duplicate,
            redecision,
            matched,
        })
    }

    /// Decisions the actor left unsure, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] for an unknown actor.
    pub async fn unsure_decisions(&self, actor: UserId) -> Result<Vec<SwipeDecision>, GatewayError> {
        let _ = self.directory.get(actor).await?;
        let Some(slot) = self.ledger.existing_slot(actor).await else {
            return Ok(Vec::new());
        };
        let swipes = slot.lock().await;
        Ok(swipes.unsure())
    }

    /// Next instant the actor may swipe, or `None` if they may swipe now.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] for an unknown actor.
    pub async fn cooldown(
        &self,
        actor: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, GatewayError> {
        let _ = self.directory.get(actor).await?;
        let Some(slot) = self.ledger.existing_slot(actor).await else {
            return Ok(None);
        };
        let next = slot.lock().await.next_eligible_at();
        Ok(next.filter(|at| *at > now))
    }

    /// Targets the actor liked or passed.
    pub async fn decided_targets(&self, actor: UserId) -> HashSet<UserId> {
        match self.ledger.existing_slot(actor).await {
            Some(slot) => slot.lock().await.decided_targets(),
            None => HashSet::new(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::user::tests::profile;
    use crate::domain::{ConversationStore, Preferences, Sex, User};
    use std::time::Duration;

    struct Fixture {
        service: SwipeService,
        directory: Arc<UserDirectory>,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(UserDirectory::new());
        let conversations = Arc::new(ConversationStore::new(1000));
        let bus = EventBus::new(256);
        let engine = Arc::new(MatchEngine::new(
            Arc::clone(&directory),
            conversations,
            bus.clone(),
        ));
        let service = SwipeService::new(
            Arc::clone(&directory),
            Arc::new(SwipeLedger::new()),
            engine,
            bus,
            Duration::from_secs(30),
        );
        Fixture { service, directory }
    }

    async fn add_user(directory: &UserDirectory, name: &str) -> UserId {
        let Ok(user) = User::register(
            profile(name, 30, Sex::Woman),
            Preferences::default(),
            Utc::now(),
        ) else {
            panic!("valid user");
        };
        let Ok(id) = directory.insert(user).await else {
            panic!("insert");
        };
        id
    }

    #[tokio::test]
    async fn self_swipe_is_invalid() {
        let fx = fixture();
        let a = add_user(&fx.directory, "Ana").await;
        let result = fx.service.attempt_swipe(a, a, SwipeDirection::Like, Utc::now()).await;
        assert!(matches!(result, Err(GatewayError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let fx = fixture();
        let a = add_user(&fx.directory, "Ana").await;
        let result = fx
            .service
            .attempt_swipe(a, UserId::new(), SwipeDirection::Like, Utc::now())
            .await;
        assert!(matches!(result, Err(GatewayError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn banned_actor_is_refused() {
        let fx = fixture();
        let a = add_user(&fx.directory, "Ana").await;
        let b = add_user(&fx.directory, "Bo").await;
        let Ok(lock) = fx.directory.get(a).await else {
            panic!("user");
        };
        lock.write().await.banned = true;
        let result = fx.service.attempt_swipe(a, b, SwipeDirection::Pass, Utc::now()).await;
        assert!(matches!(result, Err(GatewayError::Banned(_))));
    }

    #[tokio::test]
    async fn cooldown_blocks_second_swipe() {
        let fx = fixture();
        let a = add_user(&fx.directory, "Ana").await;
        let b = add_user(&fx.directory, "Bo").await;
        let c = add_user(&fx.directory, "Cy").await;
        let now = Utc::now();

        let Ok(first) = fx.service.attempt_swipe(a, b, SwipeDirection::Like, now).await else {
            panic!("first swipe accepted");
        };
        assert!(first.accepted);
        assert!(first.matched.is_none());

        let later = now + chrono::Duration::seconds(5);
        let result = fx.service.attempt_swipe(a, c, SwipeDirection::Like, later).await;
        let Err(GatewayError::Cooldown { retry_after_ms }) = result else {
            panic!("expected cooldown");
        };
        assert_eq!(retry_after_ms, 25_000);

        let Ok(next) = fx.service.cooldown(a, later).await else {
            panic!("cooldown query");
        };
        assert_eq!(next, Some(now + chrono::Duration::seconds(30)));
        assert!(fx.service.decided_targets(a).await.contains(&b));
        assert!(!fx.service.decided_targets(a).await.contains(&c));
    }

    #[tokio::test]
    async fn mutual_likes_report_match_to_both() {
        let fx = fixture();
        let a = add_user(&fx.directory, "Ana").await;
        let b = add_user(&fx.directory, "Bo").await;
        let now = Utc::now();

        let Ok(first) = fx.service.attempt_swipe(a, b, SwipeDirection::Like, now).await else {
            panic!("like accepted");
        };
        assert!(first.matched.is_none());
        let Ok(second) = fx.service.attempt_swipe(b, a, SwipeDirection::Like, now).await else {
            panic!("like accepted");
        };
        let Some(created) = second.matched else {
            panic!("second like completes the match");
        };

        let retry = now + chrono::Duration::seconds(31);
        let Ok(again) = fx.service.attempt_swipe(a, b, SwipeDirection::Like, retry).await else {
            panic!("duplicate accepted");
        };
        assert!(again.duplicate);
        assert!(!again.accepted);
        assert_eq!(again.matched, Some(created));
    }

    #[tokio::test]
    async fn unsure_then_like_forms_match() {
        let fx = fixture();
        let a = add_user(&fx.directory, "Ana").await;
        let b = add_user(&fx.directory, "Bo").await;
        let now = Utc::now();

        let _ = fx.service.attempt_swipe(b, a, SwipeDirection::Like, now).await;
        let _ = fx.service.attempt_swipe(a, b, SwipeDirection::Unsure, now).await;
        let Ok(unsure) = fx.service.unsure_decisions(a).await else {
            panic!("unsure list");
        };
        assert_eq!(unsure.len(), 1);

        let later = now + chrono::Duration::seconds(30);
        let Ok(outcome) = fx.service.attempt_swipe(a, b, SwipeDirection::Like, later).await else {
            panic!("re-decision accepted");
        };
        assert!(outcome.redecision);
        assert!(outcome.matched.is_some());
        let Ok(unsure) = fx.service.unsure_decisions(a).await else {
            panic!("unsure list");
        };
        assert!(unsure.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_swipes_by_one_actor_admit_exactly_one() {
        let fx = fixture();
        let actor = add_user(&fx.directory, "Ana").await;
        let mut targets = Vec::new();
        for i in 0..8 {
            targets.push(add_user(&fx.directory, &format!("T{i}")).await);
        }
        let now = Utc::now();
        let handles: Vec<_> = targets
            .into_iter()
            .map(|target| {
                let service = fx.service.clone();
                tokio::spawn(async move {
                    service
                        .attempt_swipe(actor, target, SwipeDirection::Pass, now)
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        let mut cooled = 0;
        for handle in handles {
            match handle.await {
                Ok(Ok(_)) => accepted += 1,
                Ok(Err(GatewayError::Cooldown { .. })) => cooled += 1,
                other => panic!("unexpected result: {other:?}"),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(cooled, 7);
    }
}
