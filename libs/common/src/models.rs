//! Records exchanged with the hosted provider

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use uuid::Uuid;

/// Opaque row identifier.
///
/// The provider returns either integers or strings depending on the table
/// definition; both are kept as text and written back in their original shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn as_integer(&self) -> Option<i64> {
        self.0
            .parse::<i64>()
            .ok()
            .filter(|number| number.to_string() == self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_integer(), other.as_integer()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_integer() {
            Some(number) => serializer.serialize_i64(number),
            None => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(number) => RecordId::from(number),
            Raw::Text(text) => RecordId(text),
        })
    }
}

/// Image row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: RecordId,
    pub url: String,
    #[serde(default)]
    pub image_description: Option<String>,
}

impl ImageRecord {
    /// Trimmed description, empty when absent
    pub fn description(&self) -> &str {
        self.image_description.as_deref().map(str::trim).unwrap_or("")
    }
}

/// Caption row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionRecord {
    pub id: RecordId,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_id: Option<RecordId>,
}

/// A vote is either up or down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteValue {
    Up,
    Down,
}

impl VoteValue {
    pub fn as_i16(self) -> i16 {
        match self {
            VoteValue::Up => 1,
            VoteValue::Down => -1,
        }
    }
}

impl TryFrom<i16> for VoteValue {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteValue::Up),
            -1 => Ok(VoteValue::Down),
            other => Err(format!("vote value must be 1 or -1, got {other}")),
        }
    }
}

impl Serialize for VoteValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i16(self.as_i16())
    }
}

impl<'de> Deserialize<'de> for VoteValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i16::deserialize(deserializer)?;
        VoteValue::try_from(raw).map_err(serde::de::Error::custom)
    }
}

/// Stored vote, one per (profile, caption)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub profile_id: Uuid,
    pub caption_id: RecordId,
    pub vote_value: VoteValue,
    pub created_datetime_utc: DateTime<Utc>,
    pub modified_datetime_utc: Option<DateTime<Utc>>,
}

/// Upsert payload keyed on (profile_id, caption_id)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoteUpsert {
    pub profile_id: Uuid,
    pub caption_id: RecordId,
    pub vote_value: VoteValue,
    pub created_datetime_utc: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_datetime_utc: Option<DateTime<Utc>>,
}

impl VoteUpsert {
    /// Build the payload for a vote cast at `now`.
    ///
    /// Every payload carries the creation timestamp. Overwriting a vote the
    /// caller already knows about adds the modification timestamp.
    pub fn new(
        profile_id: Uuid,
        caption_id: RecordId,
        vote_value: VoteValue,
        has_existing_vote: bool,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            profile_id,
            caption_id,
            vote_value,
            created_datetime_utc: now,
            modified_datetime_utc: has_existing_vote.then_some(now),
        }
    }
}

/// Signed-in user identity as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

impl AuthUser {
    /// Label used when showing who is signed in
    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or("Logged in")
    }
}

/// Session issued by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}
