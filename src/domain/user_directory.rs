//! Concurrent user storage with per-user fine-grained locking.
//!
//! [`UserDirectory`] is the authoritative identity/profile store for the
//! core: profile attributes, strike count and the ban flag all live here.
//! Each user is individually protected by a [`tokio::sync::RwLock`], so
//! profile edits and strike updates on different users never contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{User, UserId};
use crate::error::GatewayError;

/// Central store for all registered users.
///
/// # Concurrency
///
/// - Reads of the same user are concurrent.
/// - Writes to different users are concurrent.
/// - Writes to the same user are serialized.
#[derive(Debug)]
pub struct UserDirectory {
    users: RwLock<HashMap<UserId, Arc<RwLock<User>>>>,
}

impl UserDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a freshly registered user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] if a user with the same id
    /// already exists (should never happen with UUID v4).
    pub async fn insert(&self, user: User) -> Result<UserId, GatewayError> {
        let user_id = user.id;
        let mut map = self.users.write().await;
        if map.contains_key(&user_id) {
            return Err(GatewayError::Validation(format!(
                "user {user_id} already exists"
            )));
        }
        map.insert(user_id, Arc::new(RwLock::new(user)));
        Ok(user_id)
    }

    /// Returns the per-user lock.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] if no such user exists.
    pub async fn get(&self, user_id: UserId) -> Result<Arc<RwLock<User>>, GatewayError> {
        let map = self.users.read().await;
        map.get(&user_id)
            .cloned()
            .ok_or(GatewayError::UserNotFound(*user_id.as_uuid()))
    }

    /// Returns a point-in-time copy of a user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] if no such user exists.
    pub async fn snapshot(&self, user_id: UserId) -> Result<User, GatewayError> {
        let lock = self.get(user_id).await?;
        let user = lock.read().await;
        Ok(user.clone())
    }

    /// Returns the user's ban flag.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UserNotFound`] if no such user exists.
    pub async fn is_banned(&self, user_id: UserId) -> Result<bool, GatewayError> {
        let lock = self.get(user_id).await?;
        let banned = lock.read().await.banned;
        Ok(banned)
    }

    /// Fails with [`GatewayError::Banned`] if the user is banned.
    ///
    /// # Errors
    ///
    /// [`GatewayError::UserNotFound`] or [`GatewayError::Banned`].
    pub async fn ensure_active(&self, user_id: UserId) -> Result<(), GatewayError> {
        if self.is_banned(user_id).await? {
            return Err(GatewayError::Banned(*user_id.as_uuid()));
        }
        Ok(())
    }

    /// Returns copies of every user.
    pub async fn all(&self) -> Vec<User> {
        let locks: Vec<Arc<RwLock<User>>> = self.users.read().await.values().cloned().collect();
        let mut users = Vec::with_capacity(locks.len());
        for lock in locks {
            users.push(lock.read().await.clone());
        }
        users
    }

    /// Returns the number of registered users.
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Returns `true` if nobody is registered.
    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::new()
    }
}
