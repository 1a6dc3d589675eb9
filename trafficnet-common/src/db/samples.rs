//! Sample collection queries
//!
//! Every mutation is a single `UPDATE ... WHERE blob_id = ? AND review_status IS NULL`,
//! so a record leaves the eligible pool exactly once and is never upserted.

use crate::db::init::is_valid_collection_name;
use crate::db::models::{LabelUpdate, ReviewProgress, ReviewStatus, SampleRecord};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

const SAMPLE_COLUMNS: &str =
    "blob_id, display_name, review_status, labels, reviewer, obstructed, reviewed_at";

/// Handle to one sample collection
#[derive(Clone, Debug)]
pub struct SampleStore {
    pool: SqlitePool,
    collection: String,
}

impl SampleStore {
    pub fn new(pool: SqlitePool, collection: impl Into<String>) -> Result<Self> {
        let collection = collection.into();
        if !is_valid_collection_name(&collection) {
            return Err(Error::Config(format!("Invalid collection name: {}", collection)));
        }
        Ok(Self { pool, collection })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Register a new, unreviewed sample
    pub async fn insert_sample(&self, blob_id: &str, display_name: Option<&str>) -> Result<()> {
        sqlx::query(&format!(
            "INSERT INTO {} (blob_id, display_name) VALUES (?, ?)",
            self.collection
        ))
        .bind(blob_id)
        .bind(display_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Draw one eligible record uniformly at random
    ///
    /// Returns `None` once every record has been reviewed.
    pub async fn random_unreviewed(&self) -> Result<Option<SampleRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE review_status IS NULL ORDER BY RANDOM() LIMIT 1",
            SAMPLE_COLUMNS, self.collection
        ))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| record_from_row(&row)).transpose()
    }

    pub async fn find_by_blob_id(&self, blob_id: &str) -> Result<Option<SampleRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM {} WHERE blob_id = ?",
            SAMPLE_COLUMNS, self.collection
        ))
        .bind(blob_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| record_from_row(&row)).transpose()
    }

    /// Write reviewer and nested label fields to one eligible record
    ///
    /// Returns the number of records updated (0 or 1).
    pub async fn apply_labels(&self, blob_id: &str, update: &LabelUpdate) -> Result<u64> {
        if update.fields.is_empty() {
            return Err(Error::InvalidInput("Label update has no fields".to_string()));
        }

        let json_paths = update
            .fields
            .iter()
            .map(|(path, _)| to_json_path(path))
            .collect::<Result<Vec<_>>>()?;

        let placeholders = ", ?, ?".repeat(json_paths.len());
        let sql = format!(
            "UPDATE {} SET labels = json_set(COALESCE(labels, '{{}}'){}), reviewer = ?, \
             review_status = ?, reviewed_at = ? \
             WHERE blob_id = ? AND review_status IS NULL",
            self.collection, placeholders
        );

        let mut query = sqlx::query(&sql);
        for (json_path, (_, value)) in json_paths.iter().zip(&update.fields) {
            query = query.bind(json_path.as_str()).bind(value.as_str());
        }
        let result = query
            .bind(update.reviewer.as_str())
            .bind(ReviewStatus::Labeled.as_str())
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(blob_id)
            .execute(&self.pool)
            .await?;

        debug!(blob_id = %blob_id, rows = result.rows_affected(), "Applied labels");
        Ok(result.rows_affected())
    }

    /// Mark one eligible record as permanently unusable; label fields are left untouched
    pub async fn mark_obstructed(&self, blob_id: &str, reviewer: Option<&str>) -> Result<u64> {
        let result = sqlx::query(&format!(
            "UPDATE {} SET obstructed = 1, review_status = ?, reviewed_at = ?, \
             reviewer = COALESCE(?, reviewer) \
             WHERE blob_id = ? AND review_status IS NULL",
            self.collection
        ))
        .bind(ReviewStatus::Obstructed.as_str())
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(reviewer)
        .bind(blob_id)
        .execute(&self.pool)
        .await?;

        debug!(blob_id = %blob_id, rows = result.rows_affected(), "Marked obstructed");
        Ok(result.rows_affected())
    }

    pub async fn review_progress(&self) -> Result<ReviewProgress> {
        let (total, labeled, obstructed): (i64, i64, i64) = sqlx::query_as(&format!(
            "SELECT COUNT(*), \
             COALESCE(SUM(CASE WHEN review_status = 'labeled' THEN 1 ELSE 0 END), 0), \
             COALESCE(SUM(CASE WHEN review_status = 'obstructed' THEN 1 ELSE 0 END), 0) \
             FROM {}",
            self.collection
        ))
        .fetch_one(&self.pool)
        .await?;

        Ok(ReviewProgress {
            total,
            labeled,
            obstructed,
        })
    }
}

/// `labels.congestion.leftLane` -> `$.congestion.leftLane`
fn to_json_path(field_path: &str) -> Result<String> {
    let rest = field_path
        .strip_prefix("labels.")
        .filter(|rest| {
            rest.split('.')
                .all(|key| !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        })
        .ok_or_else(|| Error::InvalidInput(format!("Invalid label path: {}", field_path)))?;
    Ok(format!("$.{}", rest))
}

fn record_from_row(row: &SqliteRow) -> Result<SampleRecord> {
    let labels: Option<String> = row.try_get("labels")?;
    let review_status: Option<String> = row.try_get("review_status")?;

    Ok(SampleRecord {
        blob_id: row.try_get("blob_id")?,
        display_name: row.try_get("display_name")?,
        review_status: review_status.as_deref().and_then(ReviewStatus::parse),
        labels: labels
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()?,
        reviewer: row.try_get("reviewer")?,
        obstructed: row.try_get("obstructed")?,
        reviewed_at: row.try_get("reviewed_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_paths() {
        assert_eq!(to_json_path("labels.precipitation").unwrap(), "$.precipitation");
        assert_eq!(
            to_json_path("labels.congestion.leftLane").unwrap(),
            "$.congestion.leftLane"
        );
        assert!(to_json_path("reviewer").is_err());
        assert!(to_json_path("labels.").is_err());
        assert!(to_json_path("labels.a..b").is_err());
        assert!(to_json_path("labels.a[0]").is_err());
    }
}
