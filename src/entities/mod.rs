use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// --- PostgreSQL Enums ---
#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[sqlx(type_name = "content_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ContentStatus {
    /// `completed` and `failed` admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl Display for ContentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(sqlx::Type, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[sqlx(type_name = "source_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    Url,
}

/// What a caller hands to `Orchestrator::submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ContentSource {
    Text(String),
    Url(String),
}

impl ContentSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Text(_) => SourceKind::Text,
            Self::Url(_) => SourceKind::Url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insights {
    pub summary: String,
    /// Ordered by relevance, no duplicates.
    pub keywords: Vec<String>,
}

/// A submitted piece of content and everything the pipeline learned about it.
///
/// `status == Completed` implies `insights.is_some()` and no error;
/// `status == Failed` implies `error_message.is_some()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: Uuid,
    pub source_kind: SourceKind,
    pub source_url: Option<String>,
    /// Written once: at creation for text sources, by extraction for URLs.
    pub raw_text: Option<String>,
    pub status: ContentStatus,
    pub insights: Option<Insights>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// A fresh `pending` item for the given source.
    pub fn pending(source: &ContentSource) -> Self {
        let now = Utc::now();
        let (source_url, raw_text) = match source {
            ContentSource::Text(text) => (None, Some(text.clone())),
            ContentSource::Url(url) => (Some(url.clone()), None),
        };
        Self {
            id: Uuid::new_v4(),
            source_kind: source.kind(),
            source_url,
            raw_text,
            status: ContentStatus::Pending,
            insights: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }
}
