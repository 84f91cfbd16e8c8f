use crate::entities::{ContentItem, ContentSource, ContentStatus, Insights, SourceKind};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// Persistence for content items, keyed by id.
///
/// Every mutating call reports whether a row was changed so callers can tell
/// a lost compare-and-set from a successful write.
#[async_trait]
pub trait ContentStore: Send + Sync + 'static {
    /// Insert a new `pending` item for `source`.
    async fn create(&self, source: &ContentSource) -> Result<ContentItem>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>>;

    /// `pending -> processing`. Returns false when the item is in any other state.
    async fn begin_processing(&self, id: Uuid) -> Result<bool>;

    /// Set status and error message. Never moves an item out of a terminal state.
    async fn update_status(
        &self,
        id: Uuid,
        status: ContentStatus,
        error_message: Option<&str>,
    ) -> Result<bool>;

    /// Raw text is written once; returns false if it was already set.
    async fn save_raw_text(&self, id: Uuid, text: &str) -> Result<bool>;

    /// Store insights and mark the item `completed` in one write.
    async fn save_insights(&self, id: Uuid, insights: &Insights) -> Result<bool>;

    /// Newest first.
    async fn list_recent(&self, limit: usize) -> Result<Vec<ContentItem>>;
}

/// Process-local store, used when no database is configured and in tests.
#[derive(Default)]
pub struct MemoryContentStore {
    items: DashMap<Uuid, ContentItem>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn create(&self, source: &ContentSource) -> Result<ContentItem> {
        let item = ContentItem::pending(source);
        self.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>> {
        Ok(self.items.get(&id).map(|entry| entry.value().clone()))
    }

    async fn begin_processing(&self, id: Uuid) -> Result<bool> {
        // get_mut holds the shard lock, which serializes writers on this id
        let Some(mut item) = self.items.get_mut(&id) else {
            return Ok(false);
        };
        if item.status != ContentStatus::Pending {
            return Ok(false);
        }
        item.status = ContentStatus::Processing;
        item.updated_at = Utc::now();
        Ok(true)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ContentStatus,
        error_message: Option<&str>,
    ) -> Result<bool> {
        let Some(mut item) = self.items.get_mut(&id) else {
            return Ok(false);
        };
        if item.status.is_terminal() {
            return Ok(false);
        }
        item.status = status;
        item.error_message = error_message.map(str::to_string);
        item.updated_at = Utc::now();
        Ok(true)
    }

    async fn save_raw_text(&self, id: Uuid, text: &str) -> Result<bool> {
        let Some(mut item) = self.items.get_mut(&id) else {
            return Ok(false);
        };
        if item.raw_text.is_some() {
            return Ok(false);
        }
        item.raw_text = Some(text.to_string());
        item.updated_at = Utc::now();
        Ok(true)
    }

    async fn save_insights(&self, id: Uuid, insights: &Insights) -> Result<bool> {
        let Some(mut item) = self.items.get_mut(&id) else {
            return Ok(false);
        };
        if item.status.is_terminal() {
            return Ok(false);
        }
        item.insights = Some(insights.clone());
        item.status = ContentStatus::Completed;
        item.error_message = None;
        item.updated_at = Utc::now();
        Ok(true)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ContentItem>> {
        let mut items: Vec<ContentItem> = self
            .items
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit);
        Ok(items)
    }
}

#[derive(FromRow)]
struct ContentRow {
    id: Uuid,
    source_kind: SourceKind,
    source_url: Option<String>,
    raw_text: Option<String>,
    status: ContentStatus,
    summary: Option<String>,
    keywords: Option<Vec<String>>,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContentRow> for ContentItem {
    fn from(row: ContentRow) -> Self {
        let insights = row.summary.map(|summary| Insights {
            summary,
            keywords: row.keywords.unwrap_or_default(),
        });
        Self {
            id: row.id,
            source_kind: row.source_kind,
            source_url: row.source_url,
            raw_text: row.raw_text,
            status: row.status,
            insights,
            error_message: row.error_message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, source_kind, source_url, raw_text, status, summary, keywords, \
                              error_message, created_at, updated_at";

/// Postgres-backed store over the `content_items` table.
#[derive(Clone)]
pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn create(&self, source: &ContentSource) -> Result<ContentItem> {
        let pending = ContentItem::pending(source);
        let row: ContentRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO content_items (id, source_kind, source_url, raw_text, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(pending.id)
        .bind(pending.source_kind)
        .bind(pending.source_url.as_deref())
        .bind(pending.raw_text.as_deref())
        .bind(ContentStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ContentItem>> {
        let row: Option<ContentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM content_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn begin_processing(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET status = 'processing', updated_at = now()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ContentStatus,
        error_message: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET status = $2, error_message = $3, updated_at = now()
            WHERE id = $1 AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(error_message)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn save_raw_text(&self, id: Uuid, text: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET raw_text = $2, updated_at = now()
            WHERE id = $1 AND raw_text IS NULL
            "#,
        )
        .bind(id)
        .bind(text)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn save_insights(&self, id: Uuid, insights: &Insights) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE content_items
            SET summary = $2,
                keywords = $3,
                status = 'completed',
                error_message = NULL,
                updated_at = now()
            WHERE id = $1 AND status NOT IN ('completed', 'failed')
            "#,
        )
        .bind(id)
        .bind(&insights.summary)
        .bind(insights.keywords.as_slice())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<ContentItem>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<ContentRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM content_items ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
