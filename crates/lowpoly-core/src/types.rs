use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cycle::CycleAction;

// ---------------------------------------------------------------------------
// CycleMetadata
// ---------------------------------------------------------------------------

/// The engine's durable register: ids of the posts published by each action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleMetadata {
    #[serde(default)]
    pub theme_voting_post_id: Option<String>,
    #[serde(default)]
    pub voting_post_id: Option<String>,
    #[serde(default)]
    pub theme_post_id: Option<String>,
    #[serde(default)]
    pub monthly_winner_post_id: Option<String>,
}

impl CycleMetadata {
    /// Apply a partial update. Fields left `None` in `update` are untouched.
    pub fn apply(&mut self, update: &MetadataUpdate) {
        if let Some(id) = &update.theme_voting_post_id {
            self.theme_voting_post_id = Some(id.clone());
        }
        if let Some(id) = &update.voting_post_id {
            self.voting_post_id = Some(id.clone());
        }
        if let Some(id) = &update.theme_post_id {
            self.theme_post_id = Some(id.clone());
        }
        if let Some(id) = &update.monthly_winner_post_id {
            self.monthly_winner_post_id = Some(id.clone());
        }
    }
}

/// A partial write to [`CycleMetadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_voting_post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_post_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_winner_post_id: Option<String>,
}

impl MetadataUpdate {
    pub fn theme_voting(id: impl Into<String>) -> Self {
        Self {
            theme_voting_post_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn voting(id: impl Into<String>) -> Self {
        Self {
            voting_post_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn theme(id: impl Into<String>) -> Self {
        Self {
            theme_post_id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn monthly_winner(id: impl Into<String>) -> Self {
        Self {
            monthly_winner_post_id: Some(id.into()),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Submissions and votes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Forum post id of the entry.
    pub id: String,
    pub title: String,
    /// Direct image link, `None` when resolution failed.
    #[serde(default)]
    pub image: Option<String>,
    pub author: String,
    pub source_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub user_id: String,
    pub submission_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedSubmission {
    #[serde(flatten)]
    pub submission: Submission,
    pub score: u32,
}

// ---------------------------------------------------------------------------
// RunStamp
// ---------------------------------------------------------------------------

/// Ledger entry written after the engine finishes an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStamp {
    pub action: CycleAction,
    pub date: NaiveDate,
}
