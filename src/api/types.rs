//! Wire types for the simulation API.
//!
//! Every endpoint answers with a JSON object, never a bare value, so fields
//! can be added on the server without breaking the dashboard.

use serde::{Deserialize, Serialize};

pub type UserId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalCount {
    pub total_users: u64,
}

/// Deltas produced by one simulated day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayReport {
    pub new_users: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_users: Option<u64>,
    pub new_friendships: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_friendships: Option<u64>,
    /// Interactions that happened during the day
    pub total_interactions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomUser {
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interest {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    Unspecified,
}

impl Gender {
    pub fn glyph(self) -> &'static str {
        match self {
            Gender::Male => "♂",
            Gender::Female => "♀",
            Gender::Unspecified => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub first_name: String,
    pub surname: String,
    #[serde(default)]
    pub gender: String,
    /// Base64 PNG
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub interests: Vec<Interest>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname).trim().to_string()
    }

    pub fn gender(&self) -> Gender {
        match self.gender.trim() {
            "M" | "m" => Gender::Male,
            "F" | "f" => Gender::Female,
            _ => Gender::Unspecified,
        }
    }

    pub fn has_avatar(&self) -> bool {
        self.avatar_url.as_deref().is_some_and(|a| !a.is_empty())
    }
}

/// Reduced profile used when rendering lists of users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleProfile {
    pub user_id: UserId,
    pub first_name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl SimpleProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.surname).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendIds {
    pub friends: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendations {
    pub recommendations: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchProfilesRequest<'a> {
    pub ids: &'a [UserId],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchProfiles {
    pub profiles: Vec<SimpleProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingStatus {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
