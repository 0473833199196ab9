// SQLite implementation of the KnowledgeStore trait.
//
// Tables:
// - knowledge: one row per (topic, category), keywords as a JSON array

use crate::core::knowledge::{
    EntrySource, KnowledgeEntry, KnowledgeError, KnowledgeStore, KnowledgeUpdate,
    NewKnowledgeEntry,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;

pub struct SqliteKnowledgeStore {
    pool: SqlitePool,
}

fn storage_err(e: impl std::fmt::Display) -> KnowledgeError {
    KnowledgeError::StorageError(e.to_string())
}

fn row_to_entry(row: &SqliteRow) -> Result<KnowledgeEntry, KnowledgeError> {
    let keywords_json: String = row.get("keywords");
    let keywords: Vec<String> = serde_json::from_str(&keywords_json).map_err(storage_err)?;
    let source: String = row.get("source");

    Ok(KnowledgeEntry {
        id: row.get("id"),
        topic: row.get("topic"),
        content: row.get("content"),
        category: row.get("category"),
        keywords,
        source: EntrySource::parse(&source),
    })
}

impl SqliteKnowledgeStore {
    /// Create the store on an existing pool and run migrations.
    pub async fn new(pool: SqlitePool) -> anyhow::Result<Self> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create tables.
    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'General',
                keywords TEXT NOT NULL DEFAULT '[]',
                source TEXT NOT NULL DEFAULT 'manual',
                updated_at TEXT NOT NULL,
                UNIQUE (topic, category)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_knowledge_category ON knowledge(category)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn upsert_with<'e, E>(
        executor: E,
        entry: NewKnowledgeEntry,
        source: EntrySource,
    ) -> Result<i64, KnowledgeError>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite> + 'e,
    {
        let keywords = serde_json::to_string(&entry.keywords).map_err(storage_err)?;

        let row = sqlx::query(
            r#"
            INSERT INTO knowledge (topic, content, category, keywords, source, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(topic, category) DO UPDATE SET
                content = excluded.content,
                keywords = excluded.keywords,
                source = excluded.source,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(entry.topic)
        .bind(entry.content)
        .bind(entry.category)
        .bind(keywords)
        .bind(source.as_str())
        .bind(Utc::now().to_rfc3339())
        .fetch_one(executor)
        .await
        .map_err(storage_err)?;

        Ok(row.get("id"))
    }
}

#[async_trait]
impl KnowledgeStore for SqliteKnowledgeStore {
    async fn list_all(&self) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let rows = sqlx::query(
            "SELECT id, topic, content, category, keywords, source FROM knowledge ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn by_category(&self, category: &str) -> Result<Vec<KnowledgeEntry>, KnowledgeError> {
        let rows = sqlx::query(
            r#"
            SELECT id, topic, content, category, keywords, source
            FROM knowledge
            WHERE category = ? COLLATE NOCASE
            ORDER BY topic
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        rows.iter().map(row_to_entry).collect()
    }

    async fn upsert(
        &self,
        entry: NewKnowledgeEntry,
        source: EntrySource,
    ) -> Result<i64, KnowledgeError> {
        Self::upsert_with(&self.pool, entry, source).await
    }

    async fn update(&self, id: i64, update: KnowledgeUpdate) -> Result<(), KnowledgeError> {
        let row = sqlx::query(
            "SELECT id, topic, content, category, keywords, source FROM knowledge WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?
        .ok_or(KnowledgeError::NotFound(id))?;

        let mut entry = row_to_entry(&row)?;
        update.apply_to(&mut entry);

        let clash = sqlx::query("SELECT id FROM knowledge WHERE topic = ? AND category = ? AND id != ?")
            .bind(&entry.topic)
            .bind(&entry.category)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_err)?;
        if clash.is_some() {
            return Err(KnowledgeError::Duplicate {
                topic: entry.topic,
                category: entry.category,
            });
        }

        let keywords = serde_json::to_string(&entry.keywords).map_err(storage_err)?;

        sqlx::query(
            r#"
            UPDATE knowledge
            SET topic = ?, content = ?, category = ?, keywords = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&entry.topic)
        .bind(&entry.content)
        .bind(&entry.category)
        .bind(keywords)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), KnowledgeError> {
        let result = sqlx::query("DELETE FROM knowledge WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        if result.rows_affected() == 0 {
            return Err(KnowledgeError::NotFound(id));
        }
        Ok(())
    }

    async fn replace_source(
        &self,
        source: EntrySource,
        entries: Vec<NewKnowledgeEntry>,
    ) -> Result<usize, KnowledgeError> {
        let mut tx = self.pool.begin().await.map_err(storage_err)?;

        sqlx::query("DELETE FROM knowledge WHERE source = ?")
            .bind(source.as_str())
            .execute(&mut *tx)
            .await
            .map_err(storage_err)?;

        let written = entries.len();
        for entry in entries {
            Self::upsert_with(&mut *tx, entry, source).await?;
        }

        tx.commit().await.map_err(storage_err)?;
        Ok(written)
    }

    async fn count(&self) -> Result<usize, KnowledgeError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM knowledge")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;

        let count: i64 = row.get("count");
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::sqlite;

    async fn memory_store() -> SqliteKnowledgeStore {
        let pool = sqlite::connect(":memory:").await.unwrap();
        SqliteKnowledgeStore::new(pool).await.unwrap()
    }

    fn entry(topic: &str, category: &str, keywords: &[&str]) -> NewKnowledgeEntry {
        NewKnowledgeEntry::new(topic, &format!("All about {}", topic), category, keywords)
    }

    #[tokio::test]
    async fn test_upsert_roundtrip_keeps_keywords() {
        let store = memory_store().await;

        let id = store
            .upsert(entry("Etosha National Park", "Tourism", &["etosha", "safari"]), EntrySource::Csv)
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, id);
        assert_eq!(all[0].keywords, vec!["etosha".to_string(), "safari".to_string()]);
        assert_eq!(all[0].source, EntrySource::Csv);
    }

    #[tokio::test]
    async fn test_upsert_conflict_updates_in_place() {
        let store = memory_store().await;

        let first = store
            .upsert(entry("Currency", "Practical", &["money"]), EntrySource::Fallback)
            .await
            .unwrap();
        let second = store
            .upsert(
                NewKnowledgeEntry::new("Currency", "Namibian Dollar (NAD)", "Practical", &["nad"]),
                EntrySource::Manual,
            )
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count().await.unwrap(), 1);
        let practical = store.by_category("practical").await.unwrap();
        assert_eq!(practical[0].content, "Namibian Dollar (NAD)");
        assert_eq!(practical[0].source, EntrySource::Manual);
    }

    #[tokio::test]
    async fn test_update_partial_fields() {
        let store = memory_store().await;
        let id = store
            .upsert(entry("Windhoek", "Geography", &["capital"]), EntrySource::Manual)
            .await
            .unwrap();

        store
            .update(
                id,
                KnowledgeUpdate {
                    content: Some("Windhoek is the capital.".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all[0].topic, "Windhoek");
        assert_eq!(all[0].content, "Windhoek is the capital.");
        assert_eq!(all[0].keywords, vec!["capital".to_string()]);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_topic_and_category() {
        let store = memory_store().await;
        store
            .upsert(entry("Currency", "Practical", &["nad"]), EntrySource::Manual)
            .await
            .unwrap();
        let money = store
            .upsert(entry("Money", "Practical", &["cash"]), EntrySource::Manual)
            .await
            .unwrap();

        let result = store
            .update(
                money,
                KnowledgeUpdate {
                    topic: Some("Currency".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(KnowledgeError::Duplicate { .. })));
        let topics: Vec<String> = store
            .by_category("Practical")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.topic)
            .collect();
        assert_eq!(topics, vec!["Currency", "Money"]);
    }

    #[tokio::test]
    async fn test_missing_ids_report_not_found() {
        let store = memory_store().await;

        assert!(matches!(store.delete(42).await, Err(KnowledgeError::NotFound(42))));
        assert!(matches!(
            store.update(42, KnowledgeUpdate::default()).await,
            Err(KnowledgeError::NotFound(42))
        ));
    }

    #[tokio::test]
    async fn test_replace_source_only_touches_that_source() {
        let store = memory_store().await;
        store
            .upsert(entry("Old sheet row", "Tourism", &[]), EntrySource::Csv)
            .await
            .unwrap();
        store
            .upsert(entry("Admin note", "Tourism", &[]), EntrySource::Manual)
            .await
            .unwrap();

        let written = store
            .replace_source(
                EntrySource::Csv,
                vec![
                    entry("Sossusvlei", "Tourism", &["dunes"]),
                    entry("Swakopmund", "Tourism", &["coast"]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(written, 2);
        let topics: Vec<String> = store
            .by_category("Tourism")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.topic)
            .collect();
        assert_eq!(topics, vec!["Admin note", "Sossusvlei", "Swakopmund"]);
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("eva.db");
        let path = path.to_string_lossy().to_string();

        {
            let pool = sqlite::connect(&path).await.unwrap();
            let store = SqliteKnowledgeStore::new(pool).await.unwrap();
            store
                .upsert(entry("Fish River Canyon", "Tourism", &["canyon"]), EntrySource::Manual)
                .await
                .unwrap();
        }

        let pool = sqlite::connect(&path).await.unwrap();
        let store = SqliteKnowledgeStore::new(pool).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
