//! Profile service: registration, profile edits, and the discovery deck.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use super::swipe_service::SwipeService;
use crate::domain::{
    DomainEvent, EventBus, Preferences, Profile, ProfileUpdate, User, UserDirectory, UserId,
};
use crate::error::GatewayError;

/// One entry of a user's discovery deck.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CandidateCard {
    /// Candidate id (swipe target).
    pub user_id: UserId,
    /// Candidate's public profile.
    pub profile: Profile,
    /// Great-circle distance, when both users shared a location.
    pub distance_km: Option<f64>,
    /// Interests the viewer and the candidate have in common.
    pub shared_interests: Vec<String>,
}

/// Front for the [`UserDirectory`].
#[derive(Debug, Clone)]
pub struct ProfileService {
    directory: Arc<UserDirectory>,
    swipes: SwipeService,
    event_bus: EventBus,
}

impl ProfileService {
    /// Creates a new `ProfileService`.
    #[must_use]
    pub fn new(directory: Arc<UserDirectory>, swipes: SwipeService, event_bus: EventBus) -> Self {
        Self {
            directory,
            swipes,
            event_bus,
        }
    }

    /// Registers a new user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for an invalid profile or
    /// preferences.
    pub async fn register(
        &self,
        profile: Profile,
        preferences: Preferences,
    ) -> Result<User, GatewayError> {
        let now = Utc::now();
        let user = User::register(profile, preferences, now)?;
        let snapshot = user.clone();
        let user_id = self.directory.insert(user).await?;

        let _ = self.event_bus.publish(DomainEvent::UserRegistered {
            user_id,
            timestamp: now,
        });
        tracing::info!(%user_id, "user registered");
        Ok(snapshot)
    }

    /// Returns the user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] if the user does not exist.
    pub async fn get_profile(&self, user_id: UserId) -> Result<User, GatewayError> {
        self.directory.snapshot(user_id).await
    }

    /// Applies a partial profile update.
    ///
    /// # Errors
    ///
    /// [`GatewayError::UserNotFound`], or [`GatewayError::Validation`] for an
    /// empty or invalid update (the user is left unchanged).
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<User, GatewayError> {
        if update.is_empty() {
            return Err(GatewayError::Validation(
                "update contains no fields".to_string(),
            ));
        }
        let lock = self.directory.get(user_id).await?;
        let mut user = lock.write().await;
        user.apply_update(update, Utc::now())?;
        tracing::debug!(%user_id, "profile updated");
        Ok(user.clone())
    }

    /// Builds the discovery deck for `viewer`: active users who pass the
    /// viewer's preferences and were not yet liked or passed, nearest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] for an unknown viewer.
    pub async fn candidates(
        &self,
        viewer_id: UserId,
        limit: usize,
    ) -> Result<Vec<CandidateCard>, GatewayError> {
        let viewer = self.directory.snapshot(viewer_id).await?;
        let decided = self.swipes.decided_targets(viewer_id).await;
        let max_distance = f64::from(viewer.preferences.max_distance_km);

        let mut deck: Vec<CandidateCard> = self
            .directory
            .all()
            .await
            .into_iter()
            .filter(|c| c.id != viewer_id && !c.banned && !decided.contains(&c.id))
            .filter(|c| viewer.preferences.admits(&c.profile))
            .filter_map(|c| {
                let distance_km = match (&viewer.profile.location, &c.profile.location) {
                    (Some(mine), Some(theirs)) => Some(mine.distance_km(theirs)),
                    _ => None,
                };
                if distance_km.is_some_and(|d| d > max_distance) {
                    return None;
                }
                Some(CandidateCard {
                    user_id: c.id,
                    shared_interests: viewer.profile.shared_interests(&c.profile),
                    profile: c.profile,
                    distance_km,
                })
            })
            .collect();

        deck.sort_by(|a, b| match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.shared_interests.len().cmp(&a.shared_interests.len()),
        });
        deck.truncate(limit);
        Ok(deck)
    }
}
