//! Match formation: turns mutual likes into exactly one match per pair.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use crate::domain::{ConversationStore, DomainEvent, EventBus, Match, PairKey, UserDirectory, UserId};
use crate::error::GatewayError;

/// What registering a like did to the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// This like completed the pair; a match and conversation were created.
    Created(Match),
    /// The pair was already matched.
    AlreadyMatched(Match),
    /// Waiting for the other user's like.
    Pending,
    /// Both likes are present but one of the users is banned.
    Suppressed,
}

impl MatchOutcome {
    /// The match on record for the pair, if any.
    #[must_use]
    pub fn into_match(self) -> Option<Match> {
        match self {
            Self::Created(m) | Self::AlreadyMatched(m) => Some(m),
            Self::Pending | Self::Suppressed => None,
        }
    }
}

#[derive(Debug, Default)]
struct PairSlot {
    likes: HashSet<UserId>,
    matched: Option<Match>,
}

/// Per-pair like bookkeeping and match creation.
///
/// # Concurrency
///
/// Each unordered pair has one [`Mutex`]-guarded slot. Both users' likes
/// for that pair go through the same slot, so the check-and-create is a
/// single critical section and at most one match is ever formed. Distinct
/// pairs never contend.
#[derive(Debug)]
pub struct MatchEngine {
    pairs: RwLock<HashMap<PairKey, Arc<Mutex<PairSlot>>>>,
    by_user: RwLock<HashMap<UserId, Vec<Match>>>,
    directory: Arc<UserDirectory>,
    conversations: Arc<ConversationStore>,
    event_bus: EventBus,
}

impl MatchEngine {
    /// Creates an engine with no likes recorded.
    #[must_use]
    pub fn new(
        directory: Arc<UserDirectory>,
        conversations: Arc<ConversationStore>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            pairs: RwLock::new(HashMap::new()),
            by_user: RwLock::new(HashMap::new()),
            directory,
            conversations,
            event_bus,
        }
    }

    async fn slot(&self, key: PairKey) -> Arc<Mutex<PairSlot>> {
        if let Some(slot) = self.pairs.read().await.get(&key) {
            return Arc::clone(slot);
        }
        let mut map = self.pairs.write().await;
        Arc::clone(map.entry(key).or_default())
    }

    /// Records `actor`'s like of `target` and forms the match when the
    /// reverse like is already present.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] if either user vanished from
    /// the directory.
    pub async fn register_like(
        &self,
        actor: UserId,
        target: UserId,
        now: DateTime<Utc>,
    ) -> Result<MatchOutcome, GatewayError> {
        let key = PairKey::new(actor, target);
        let slot = self.slot(key).await;
        let mut pair = slot.lock().await;

        if let Some(existing) = &pair.matched {
            return Ok(MatchOutcome::AlreadyMatched(existing.clone()));
        }

        pair.likes.insert(actor);
        if !pair.likes.contains(&target) {
            return Ok(MatchOutcome::Pending);
        }

        if self.directory.is_banned(actor).await? || self.directory.is_banned(target).await? {
            tracing::debug!(%actor, %target, "match suppressed for banned user");
            return Ok(MatchOutcome::Suppressed);
        }

        let conversation_id = self.conversations.create(key, now).await;
        let created = Match {
            conversation_id,
            users: key,
            created_at: now,
        };
        pair.matched = Some(created.clone());
        pair.likes.clear();

        {
            let mut index = self.by_user.write().await;
            index.entry(key.low).or_default().push(created.clone());
            index.entry(key.high).or_default().push(created.clone());
        }
        drop(pair);

        let _ = self.event_bus.publish(DomainEvent::MatchCreated {
            conversation_id,
            user_a: key.low,
            user_b: key.high,
            timestamp: now,
        });

        tracing::info!(%conversation_id, user_a = %key.low, user_b = %key.high, "match created");
        Ok(MatchOutcome::Created(created))
    }

    /// The match between two users, if one exists.
    pub async fn match_for(&self, a: UserId, b: UserId) -> Option<Match> {
        let slot = self.pairs.read().await.get(&PairKey::new(a, b)).cloned()?;
        let pair = slot.lock().await;
        pair.matched.clone()
    }

    /// All matches of a user, newest first.
    pub async fn matches_for(&self, user: UserId) -> Vec<Match> {
        let mut matches = self
            .by_user
            .read()
            .await
            .get(&user)
            .cloned()
            .unwrap_or_default();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matches
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::user::tests::profile;
    use crate::domain::{Preferences, Sex, User};

    struct Fixture {
        engine: Arc<MatchEngine>,
        directory: Arc<UserDirectory>,
        conversations: Arc<ConversationStore>,
        bus: EventBus,
    }

    fn fixture() -> Fixture {
        let directory = Arc::new(UserDirectory::new());
        let conversations = Arc::new(ConversationStore::new(1000));
        let bus = EventBus::new(256);
        let engine = Arc::new(MatchEngine::new(
            Arc::clone(&directory),
            Arc::clone(&conversations),
            bus.clone(),
        ));
        Fixture {
            engine,
            directory,
            conversations,
            bus,
        }
    }

    async fn add_user(directory: &UserDirectory, name: &str) -> UserId {
        let Ok(user) = User::register(
            profile(name, 30, Sex::NonBinary),
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
    async fn one_sided_like_is_pending() {
        let fx = fixture();
        let a = add_user(&fx.directory, "Ana").await;
        let b = add_user(&fx.directory, "Bo").await;
        let outcome = fx.engine.register_like(a, b, Utc::now()).await;
        assert!(matches!(outcome, Ok(MatchOutcome::Pending)));
        assert!(fx.engine.match_for(a, b).await.is_none());
    }

    #[tokio::test]
    async fn mutual_like_creates_match_and_conversation() {
        let fx = fixture();
        let a = add_user(&fx.directory, "Ana").await;
        let b = add_user(&fx.directory, "Bo").await;
        let mut rx = fx.bus.subscribe();

        let _ = fx.engine.register_like(a, b, Utc::now()).await;
        let Ok(MatchOutcome::Created(created)) = fx.engine.register_like(b, a, Utc::now()).await
        else {
            panic!("expected match");
        };
        assert_eq!(created.users, PairKey::new(a, b));
        assert!(fx.conversations.get(created.conversation_id).await.is_ok());
        assert_eq!(fx.engine.matches_for(a).await, vec![created.clone()]);
        assert_eq!(fx.engine.matches_for(b).await, vec![created.clone()]);

        let Ok(DomainEvent::MatchCreated { conversation_id, .. }) = rx.recv().await else {
            panic!("expected match event");
        };
        assert_eq!(conversation_id, created.conversation_id);

        let again = fx.engine.register_like(a, b, Utc::now()).await;
        assert!(matches!(again, Ok(MatchOutcome::AlreadyMatched(m)) if m == created));
    }

    #[tokio::test]
    async fn banned_user_suppresses_match() {
        let fx = fixture();
        let a = add_user(&fx.directory, "Ana").await;
        let b = add_user(&fx.directory, "Bo").await;
        let Ok(lock) = fx.directory.get(b).await else {
            panic!("user");
        };
        lock.write().await.banned = true;

        let _ = fx.engine.register_like(a, b, Utc::now()).await;
        let outcome = fx.engine.register_like(b, a, Utc::now()).await;
        assert!(matches!(outcome, Ok(MatchOutcome::Suppressed)));
        assert!(fx.conversations.is_empty().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_mutual_likes_form_exactly_one_match() {
        for _ in 0..20 {
            let fx = fixture();
            let a = add_user(&fx.directory, "Ana").await;
            let b = add_user(&fx.directory, "Bo").await;

            let (left, right) = tokio::join!(
                tokio::spawn({
                    let engine = Arc::clone(&fx.engine);
                    async move { engine.register_like(a, b, Utc::now()).await }
                }),
                tokio::spawn({
                    let engine = Arc::clone(&fx.engine);
                    async move { engine.register_like(b, a, Utc::now()).await }
                }),
            );
            let (Ok(Ok(left)), Ok(Ok(right))) = (left, right) else {
                panic!("both likes should succeed");
            };

            let created = [&left, &right]
                .iter()
                .filter(|o| matches!(o, MatchOutcome::Created(_)))
                .count();
            assert_eq!(created, 1);
            assert_eq!(fx.conversations.len().await, 1);
            assert!(fx.engine.match_for(a, b).await.is_some());
        }
    }
}
