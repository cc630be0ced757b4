//! The catalogue endpoints a client can browse.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A collection exposed under `/api/v1/<name>/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Books,
    Quizzes,
    Assignments,
    Subscriptions,
    Institutes,
    Notifications,
    Ai,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Books,
        Resource::Quizzes,
        Resource::Assignments,
        Resource::Subscriptions,
        Resource::Institutes,
        Resource::Notifications,
        Resource::Ai,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Resource::Books => "books",
            Resource::Quizzes => "quizzes",
            Resource::Assignments => "assignments",
            Resource::Subscriptions => "subscriptions",
            Resource::Institutes => "institutes",
            Resource::Notifications => "notifications",
            Resource::Ai => "ai",
        }
    }

    /// Path of the collection, e.g. `/api/v1/books/`.
    pub fn path(self) -> String {
        format!("/api/v1/{}/", self.name())
    }

    /// Path of one item, e.g. `/api/v1/books/42/`.
    pub fn item_path(self, id: impl fmt::Display) -> String {
        format!("/api/v1/{}/{id}/", self.name())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resource {0:?}")]
pub struct UnknownResource(pub String);

impl FromStr for Resource {
    type Err = UnknownResource;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Resource::ALL
            .into_iter()
            .find(|r| r.name() == wanted)
            .ok_or_else(|| UnknownResource(s.to_string()))
    }
}
