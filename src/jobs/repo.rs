use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::jobs::repo_types::{ApplicationRecord, ApplicationRow, NewApplication};

/// Persistence for application records. Every lookup is scoped by owner.
#[async_trait]
pub trait ApplicationRepo: Send + Sync {
    async fn insert(&self, app: NewApplication) -> anyhow::Result<ApplicationRecord>;
    /// Newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<ApplicationRecord>>;
    async fn find(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<Option<ApplicationRecord>>;
    /// Writes the mutable fields of `record`; `None` when no row matches its id and owner.
    async fn update(&self, record: &ApplicationRecord) -> anyhow::Result<Option<ApplicationRecord>>;
    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
}

const APPLICATION_COLUMNS: &str =
    "id, owner_id, role, company, location, status, link, notes, details, created_at, updated_at";

#[derive(Clone)]
pub struct PgApplicationRepo {
    db: PgPool,
}

impl PgApplicationRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ApplicationRepo for PgApplicationRepo {
    async fn insert(&self, app: NewApplication) -> anyhow::Result<ApplicationRecord> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            INSERT INTO applications (id, owner_id, role, company, location, status, link, notes, details)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(app.owner_id)
        .bind(&app.role)
        .bind(&app.company)
        .bind(&app.location)
        .bind(app.status.as_str())
        .bind(&app.link)
        .bind(&app.notes)
        .bind(Json(&app.opportunity))
        .fetch_one(&self.db)
        .await
        .context("insert application")?;
        ApplicationRecord::try_from(row)
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<ApplicationRecord>> {
        let rows = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            SELECT {APPLICATION_COLUMNS}
            FROM applications
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(owner_id)
        .fetch_all(&self.db)
        .await
        .context("list applications")?;
        rows.into_iter().map(ApplicationRecord::try_from).collect()
    }

    async fn find(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<Option<ApplicationRecord>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.db)
        .await
        .context("find application")?;
        row.map(ApplicationRecord::try_from).transpose()
    }

    async fn update(&self, record: &ApplicationRecord) -> anyhow::Result<Option<ApplicationRecord>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            UPDATE applications
            SET role = $3, company = $4, location = $5, status = $6,
                link = $7, notes = $8, details = $9, updated_at = now()
            WHERE id = $1 AND owner_id = $2
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(record.id)
        .bind(record.owner_id)
        .bind(&record.role)
        .bind(&record.company)
        .bind(&record.location)
        .bind(record.status.as_str())
        .bind(&record.link)
        .bind(&record.notes)
        .bind(Json(&record.opportunity))
        .fetch_optional(&self.db)
        .await
        .context("update application")?;
        row.map(ApplicationRecord::try_from).transpose()
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM applications WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.db)
            .await
            .context("delete application")?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
pub mod memory {
    use std::sync::Mutex;

    use time::OffsetDateTime;

    use super::*;

    #[derive(Default)]
    pub struct MemoryApplicationRepo {
        records: Mutex<Vec<ApplicationRecord>>,
    }

    #[async_trait]
    impl ApplicationRepo for MemoryApplicationRepo {
        async fn insert(&self, app: NewApplication) -> anyhow::Result<ApplicationRecord> {
            let now = OffsetDateTime::now_utc();
            let record = ApplicationRecord {
                id: Uuid::new_v4(),
                owner_id: app.owner_id,
                role: app.role,
                company: app.company,
                location: app.location,
                status: app.status,
                link: app.link,
                notes: app.notes,
                opportunity: app.opportunity,
                created_at: now,
                updated_at: now,
            };
            self.records.lock().unwrap().push(record.clone());
            Ok(record)
        }

        async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<ApplicationRecord>> {
            let records = self.records.lock().unwrap();
            // reversed insertion order keeps equal timestamps newest-first
            let mut out: Vec<_> = records
                .iter()
                .rev()
                .filter(|r| r.owner_id == owner_id)
                .cloned()
                .collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(out)
        }

        async fn find(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<Option<ApplicationRecord>> {
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .find(|r| r.id == id && r.owner_id == owner_id)
                .cloned())
        }

        async fn update(&self, record: &ApplicationRecord) -> anyhow::Result<Option<ApplicationRecord>> {
            let mut records = self.records.lock().unwrap();
            let Some(slot) = records
                .iter_mut()
                .find(|r| r.id == record.id && r.owner_id == record.owner_id)
            else {
                return Ok(None);
            };
            let created_at = slot.created_at;
            *slot = ApplicationRecord {
                created_at,
                updated_at: OffsetDateTime::now_utc(),
                ..record.clone()
            };
            Ok(Some(slot.clone()))
        }

        async fn delete(&self, owner_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
            let mut records = self.records.lock().unwrap();
            let before = records.len();
            records.retain(|r| !(r.id == id && r.owner_id == owner_id));
            Ok(records.len() != before)
        }
    }
}
