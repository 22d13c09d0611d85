use shared::SLOT_COUNT;
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A validated household report ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubmission {
    pub house_id: String,
    pub images: [Option<String>; SLOT_COUNT],
    pub status: String,
}

#[derive(Clone)]
pub struct SubmissionRepository {
    pool: SqlitePool,
}

impl SubmissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS waste_segregation_data (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                house_id TEXT NOT NULL,
                image1 TEXT,
                image2 TEXT,
                image3 TEXT,
                status TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Inserts one report inside a transaction and returns its row id.
    ///
    /// On failure the transaction is rolled back before the error is returned.
    pub async fn insert(&self, submission: &NewSubmission) -> Result<i64, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let [image1, image2, image3] = &submission.images;
        let inserted = sqlx::query(
            r#"
            INSERT INTO waste_segregation_data (house_id, image1, image2, image3, status)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&submission.house_id)
        .bind(image1)
        .bind(image2)
        .bind(image3)
        .bind(&submission.status)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(result) => {
                tx.commit().await?;
                Ok(result.last_insert_rowid())
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    log::error!("Rollback failed: {:?}", rollback_err);
                }
                Err(e.into())
            }
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
