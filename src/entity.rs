use crate::error::{ChatError, ChatResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Online,
    Offline,
    Away,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Presence::Online => "online",
            Presence::Offline => "offline",
            Presence::Away => "away",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub status: Presence,
    pub last_seen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_emoji: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>, status: Presence) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            avatar: "/placeholder.svg?height=40&width=40".to_string(),
            status,
            last_seen: "just now".to_string(),
            bio: None,
            custom_status: None,
            status_emoji: None,
        }
    }

    /// Merge the provided fields of `update` into this user.
    pub fn apply(&mut self, update: ProfileUpdate) {
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(bio) = update.bio {
            self.bio = Some(bio);
        }
        if let Some(custom_status) = update.custom_status {
            self.custom_status = Some(custom_status);
        }
        if let Some(status_emoji) = update.status_emoji {
            self.status_emoji = Some(status_emoji);
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.id)
    }
}

/// Partial profile record. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub custom_status: Option<String>,
    #[serde(default)]
    pub status_emoji: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.bio.is_none()
            && self.custom_status.is_none()
            && self.status_emoji.is_none()
    }

    /// Parse a `field=value` pair as typed in the console.
    pub fn parse_field(input: &str) -> ChatResult<Self> {
        let (field, value) = input
            .split_once('=')
            .ok_or_else(|| ChatError::InvalidCommand(format!("expected field=value, got {input:?}")))?;
        let value = value.trim().to_string();
        let mut update = Self::default();
        match field.trim() {
            "username" | "name" => update.username = Some(value),
            "bio" => update.bio = Some(value),
            "status" | "customStatus" => update.custom_status = Some(value),
            "emoji" | "statusEmoji" => update.status_emoji = Some(value),
            other => return Err(ChatError::InvalidCommand(format!("unknown profile field {other:?}"))),
        }
        Ok(update)
    }
}

/// Contacts plus the local user's own profile.
#[derive(Debug, Clone)]
pub struct Directory {
    me: User,
    contacts: Vec<User>,
}

impl Directory {
    pub fn new(me: User, contacts: Vec<User>) -> Self {
        Self { me, contacts }
    }

    pub fn me(&self) -> &User {
        &self.me
    }

    pub fn contacts(&self) -> &[User] {
        &self.contacts
    }

    pub fn contact(&self, id: &str) -> ChatResult<&User> {
        self.contacts
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ChatError::UnknownContact(id.to_string()))
    }

    /// Case-insensitive substring match on username, in directory order.
    pub fn search(&self, query: &str) -> Vec<&User> {
        let query = query.trim().to_lowercase();
        self.contacts
            .iter()
            .filter(|c| query.is_empty() || c.username.to_lowercase().contains(&query))
            .collect()
    }

    pub fn update_profile(&mut self, update: ProfileUpdate) -> &User {
        if !update.is_empty() {
            self.me.apply(update);
            info!("Profile updated for {}", self.me);
        }
        &self.me
    }
}
