//! Core data models for nerofea.
//!
//! These types are shared across all nerofea crates and represent the core
//! domain entities: topics, notes, wiki-links, attachments, and the practice
//! question catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =============================================================================
// TOPIC TYPES
// =============================================================================

/// A user-defined folder grouping notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub id: Uuid,
    pub title: String,
    pub user_id: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Request to create a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTopicRequest {
    pub title: String,
    pub user_id: String,
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A user-authored rich-text document belonging to a topic.
///
/// `content` is HTML and may embed `[[Title]]` link tokens that are resolved
/// into [`NoteLink`] edges on every save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub topic_id: Uuid,
    pub title: String,
    pub content: String,
    pub user_id: String,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

/// Request to create a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub topic_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub user_id: String,
}

/// Partial update of a note. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    pub topic_id: Option<Uuid>,
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Filters for listing notes.
#[derive(Debug, Clone, Default)]
pub struct ListNotesRequest {
    pub topic_id: Option<Uuid>,
    pub user_id: Option<String>,
}

// =============================================================================
// LINK TYPES
// =============================================================================

/// A directed edge between two notes, derived from `[[Title]]` tokens.
///
/// Edges are ephemeral: the full outgoing set of a note is recomputed on
/// every save of that note. Self-links and cycles are permitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteLink {
    pub id: Uuid,
    pub source_note_id: Uuid,
    pub target_note_id: Uuid,
    pub user_id: String,
    pub created_at_utc: DateTime<Utc>,
}

/// Graph node in the knowledge-graph payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: Uuid,
    pub name: String,
}

/// Graph edge in the knowledge-graph payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: Uuid,
    pub target: Uuid,
}

/// Knowledge graph assembled from notes and their resolved links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphEdge>,
}

// =============================================================================
// ATTACHMENT TYPES
// =============================================================================

/// Metadata row for an uploaded file. The bytes live in blob storage under
/// `storage_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub note_id: Uuid,
    pub user_id: String,
    pub file_name: String,
    pub storage_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// QUESTION CATALOG
// =============================================================================

/// Practice-problem difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Learning-value weight used by the study-plan allocator.
    pub fn weight(self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 2.0,
            Difficulty::Hard => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Easy" | "easy" => Ok(Difficulty::Easy),
            "Medium" | "medium" => Ok(Difficulty::Medium),
            "Hard" | "hard" => Ok(Difficulty::Hard),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown difficulty: {}",
                other
            ))),
        }
    }
}

/// A practice problem from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    /// Ordinal within the catalog, stable across refetches.
    pub number: i32,
    pub title: String,
    pub difficulty: Difficulty,
    pub topic: String,
    pub estimated_minutes: i32,
    pub url: Option<String>,
    /// Suggested week in the default grind ordering, when present.
    pub week: Option<i32>,
}

// =============================================================================
// STUDY PLAN PERSISTENCE
// =============================================================================

/// Saved summary row of a generated study plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlanRecord {
    pub id: Uuid,
    pub user_id: String,
    pub weeks: i32,
    pub hours_per_week: i32,
    pub difficulties: Vec<String>,
    pub total_questions: i32,
    pub total_minutes: i32,
    pub created_at_utc: DateTime<Utc>,
}

/// Request to persist a plan summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveStudyPlanRequest {
    pub user_id: String,
    pub weeks: i32,
    pub hours_per_week: i32,
    pub difficulties: Vec<String>,
    pub total_questions: i32,
    pub total_minutes: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_difficulty_round_trip() {
        for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(d.as_str().parse::<Difficulty>().unwrap(), d);
        }
    }

    #[test]
    fn test_difficulty_parse_lowercase() {
        assert_eq!("easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
    }

    #[test]
    fn test_difficulty_parse_unknown() {
        assert!("Impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_difficulty_weights_monotonic() {
        assert!(Difficulty::Easy.weight() < Difficulty::Medium.weight());
        assert!(Difficulty::Medium.weight() < Difficulty::Hard.weight());
    }

    #[test]
    fn test_difficulty_serializes_as_pascal_case() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "\"Medium\"");
    }
}
