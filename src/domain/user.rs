//! User aggregate: profile, discovery preferences, and moderation standing.
//!
//! Profiles have an explicit schema with required and optional fields.
//! Validation happens once at the boundary ([`Profile::validate`],
//! [`Preferences::validate`]) so the rest of the core can rely on the
//! invariants without re-checking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::UserId;
use super::geo;
use crate::error::GatewayError;

/// Minimum age accepted on a profile and in preferences.
pub const MIN_AGE: u8 = 18;
/// Maximum age accepted on a profile and in preferences.
pub const MAX_AGE: u8 = 120;

const MAX_NAME_CHARS: usize = 50;
const MAX_BIO_CHARS: usize = 500;
const MAX_INTERESTS: usize = 20;
const MAX_INTEREST_CHARS: usize = 40;
const MAX_PHOTOS: usize = 6;
const MAX_DISTANCE_KM: u32 = 20_000;

/// Self-declared sex shown on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    /// Man.
    Man,
    /// Woman.
    Woman,
    /// Non-binary.
    NonBinary,
}

/// Which profiles a user wants to see in discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InterestedIn {
    /// Only men.
    Men,
    /// Only women.
    Women,
    /// Everybody.
    #[default]
    Everyone,
}

impl InterestedIn {
    /// Returns `true` if a profile of the given sex passes this filter.
    #[must_use]
    pub const fn accepts(self, sex: Sex) -> bool {
        match self {
            Self::Everyone => true,
            Self::Men => matches!(sex, Sex::Man),
            Self::Women => matches!(sex, Sex::Woman),
        }
    }
}

/// Resolved location attached to a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    /// Human readable place name (e.g. `"Lisbon, PT"`).
    pub label: String,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Location {
    /// Great-circle distance to another location in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        geo::haversine_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// Public profile attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u8,
    /// Self-declared sex.
    pub sex: Sex,
    /// Free-form biography.
    #[serde(default)]
    pub bio: Option<String>,
    /// Interest tags.
    #[serde(default)]
    pub interests: Vec<String>,
    /// Photo URLs, first one is the cover.
    #[serde(default)]
    pub photos: Vec<String>,
    /// Where the user lives.
    #[serde(default)]
    pub location: Option<Location>,
}

impl Profile {
    /// Checks every field against the profile schema.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] naming the first offending field.
    pub fn validate(&self) -> Result<(), GatewayError> {
        let name_len = self.name.trim().chars().count();
        if name_len == 0 || name_len > MAX_NAME_CHARS {
            return Err(invalid(format!(
                "name must be 1-{MAX_NAME_CHARS} characters"
            )));
        }
        if !(MIN_AGE..=MAX_AGE).contains(&self.age) {
            return Err(invalid(format!("age must be {MIN_AGE}-{MAX_AGE}")));
        }
        if let Some(bio) = &self.bio
            && bio.chars().count() > MAX_BIO_CHARS
        {
            return Err(invalid(format!("bio exceeds {MAX_BIO_CHARS} characters")));
        }
        if self.interests.len() > MAX_INTERESTS {
            return Err(invalid(format!("at most {MAX_INTERESTS} interests allowed")));
        }
        if self.interests.iter().any(|i| {
            let len = i.trim().chars().count();
            len == 0 || len > MAX_INTEREST_CHARS
        }) {
            return Err(invalid(format!(
                "each interest must be 1-{MAX_INTEREST_CHARS} characters"
            )));
        }
        if self.photos.len() > MAX_PHOTOS {
            return Err(invalid(format!("at most {MAX_PHOTOS} photos allowed")));
        }
        if self.photos.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid("photo URLs must not be empty".to_string()));
        }
        if let Some(loc) = &self.location {
            if !(-90.0..=90.0).contains(&loc.latitude) {
                return Err(invalid("latitude must be within [-90, 90]".to_string()));
            }
            if !(-180.0..=180.0).contains(&loc.longitude) {
                return Err(invalid("longitude must be within [-180, 180]".to_string()));
            }
        }
        Ok(())
    }

    /// Interests shared with another profile, compared case-insensitively.
    #[must_use]
    pub fn shared_interests(&self, other: &Self) -> Vec<String> {
        self.interests
            .iter()
            .filter(|mine| {
                other
                    .interests
                    .iter()
                    .any(|theirs| theirs.trim().eq_ignore_ascii_case(mine.trim()))
            })
            .cloned()
            .collect()
    }
}

/// Discovery preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Preferences {
    /// Youngest age to show.
    pub min_age: u8,
    /// Oldest age to show.
    pub max_age: u8,
    /// Search radius in kilometres.
    pub max_distance_km: u32,
    /// Sex filter.
    #[serde(default)]
    pub interested_in: InterestedIn,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            min_age: MIN_AGE,
            max_age: 99,
            max_distance_km: 100,
            interested_in: InterestedIn::Everyone,
        }
    }
}

impl Preferences {
    /// Checks the preference ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] when the age range is inverted or
    /// out of bounds, or the distance is outside `1..=20000` km.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.min_age < MIN_AGE || self.max_age > MAX_AGE || self.min_age > self.max_age {
            return Err(invalid(format!(
                "age range must satisfy {MIN_AGE} <= min_age <= max_age <= {MAX_AGE}"
            )));
        }
        if self.max_distance_km == 0 || self.max_distance_km > MAX_DISTANCE_KM {
            return Err(invalid(format!(
                "max_distance_km must be 1-{MAX_DISTANCE_KM}"
            )));
        }
        Ok(())
    }

    /// Returns `true` if the candidate profile passes the age and sex filters.
    #[must_use]
    pub fn admits(&self, candidate: &Profile) -> bool {
        (self.min_age..=self.max_age).contains(&candidate.age)
            && self.interested_in.accepts(candidate.sex)
    }
}

/// Partial update applied by `PATCH /users/{id}`.
///
/// `bio` and `location` use a nested `Option`: absent leaves the field
/// untouched, `null` clears it.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New age.
    #[serde(default)]
    pub age: Option<u8>,
    /// New sex.
    #[serde(default)]
    pub sex: Option<Sex>,
    /// New biography (`null` clears it).
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub bio: Option<Option<String>>,
    /// Replacement interest list.
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    /// Replacement photo list.
    #[serde(default)]
    pub photos: Option<Vec<String>>,
    /// New location (`null` clears it).
    #[serde(default, with = "double_option")]
    #[schema(value_type = Option<Location>)]
    pub location: Option<Option<Location>>,
    /// Replacement preferences.
    #[serde(default)]
    pub preferences: Option<Preferences>,
}

impl ProfileUpdate {
    /// Returns `true` if the update would not change anything.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.age.is_none()
            && self.sex.is_none()
            && self.bio.is_none()
            && self.interests.is_none()
            && self.photos.is_none()
            && self.location.is_none()
            && self.preferences.is_none()
    }
}

/// A registered user as held by the directory.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    /// Immutable identifier.
    pub id: UserId,
    /// Public profile.
    pub profile: Profile,
    /// Discovery preferences.
    pub preferences: Preferences,
    /// Moderation strikes recorded so far.
    pub strikes: u32,
    /// Sticky ban flag.
    pub banned: bool,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
    /// Last profile or standing change.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a user after validating profile and preferences.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] if either part is invalid.
    pub fn register(
        profile: Profile,
        preferences: Preferences,
        now: DateTime<Utc>,
    ) -> Result<Self, GatewayError> {
        profile.validate()?;
        preferences.validate()?;
        Ok(Self {
            id: UserId::new(),
            profile,
            preferences,
            strikes: 0,
            banned: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update. The merged profile is validated before
    /// anything is written, so a rejected update leaves the user unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] if the merged result is invalid.
    pub fn apply_update(
        &mut self,
        update: ProfileUpdate,
        now: DateTime<Utc>,
    ) -> Result<(), GatewayError> {
        let mut profile = self.profile.clone();
        if let Some(name) = update.name {
            profile.name = name;
        }
        if let Some(age) = update.age {
            profile.age = age;
        }
        if let Some(sex) = update.sex {
            profile.sex = sex;
        }
        if let Some(bio) = update.bio {
            profile.bio = bio;
        }
        if let Some(interests) = update.interests {
            profile.interests = interests;
        }
        if let Some(photos) = update.photos {
            profile.photos = photos;
        }
        if let Some(location) = update.location {
            profile.location = location;
        }
        let preferences = update.preferences.unwrap_or_else(|| self.preferences.clone());

        profile.validate()?;
        preferences.validate()?;

        self.profile = profile;
        self.preferences = preferences;
        self.updated_at = now;
        Ok(())
    }
}

fn invalid(message: String) -> GatewayError {
    GatewayError::Validation(message)
}

/// Distinguishes a missing field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}
