use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::AppError,
    jobs::{
        repo::ApplicationRepo,
        repo_types::{ApplicationRecord, ApplicationStatus, NewApplication},
    },
    search::types::SavedOpportunity,
};

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{0}")]
    Validation(String),
    #[error("Job not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<RecordError> for AppError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Validation(msg) => AppError::Validation(msg),
            RecordError::NotFound => AppError::not_found("Job not found"),
            RecordError::Store(e) => AppError::Internal(e),
        }
    }
}

/// Client-supplied record fields. Anything not named here is treated as an
/// extended opportunity field; unknown keys are dropped on decode.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationFields {
    pub role: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    /// Outer `None` when omitted, `Some(None)` for an explicit `null`.
    #[serde(default, deserialize_with = "present")]
    pub link: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
    #[serde(flatten)]
    pub extended: Map<String, Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

fn required(name: &str, value: Option<&str>) -> Result<String, RecordError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(RecordError::Validation(format!("{name} is required"))),
    }
}

fn parse_status(raw: &str) -> Result<ApplicationStatus, RecordError> {
    raw.trim()
        .parse()
        .map_err(|_| RecordError::Validation(format!("Invalid status: {raw}")))
}

fn decode_opportunity(map: Map<String, Value>) -> Result<SavedOpportunity, RecordError> {
    serde_json::from_value(Value::Object(map))
        .map_err(|e| RecordError::Validation(format!("Invalid job fields: {e}")))
}

/// Overlays `patch` onto `base` key by key; a `null` clears the key.
fn merge_extended(base: &SavedOpportunity, patch: Map<String, Value>) -> Result<SavedOpportunity, RecordError> {
    let mut merged = match serde_json::to_value(base).map_err(anyhow::Error::from)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in patch {
        if value.is_null() {
            merged.remove(&key);
        } else {
            merged.insert(key, value);
        }
    }
    decode_opportunity(merged)
}

#[derive(Clone)]
pub struct ApplicationService {
    repo: Arc<dyn ApplicationRepo>,
}

impl ApplicationService {
    pub fn new(repo: Arc<dyn ApplicationRepo>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, owner_id: Uuid, fields: ApplicationFields) -> Result<ApplicationRecord, RecordError> {
        let role = required("role", fields.role.as_deref())?;
        let company = required("company", fields.company.as_deref())?;
        let location = required("location", fields.location.as_deref())?;
        let status = match fields.status.as_deref() {
            Some(raw) => parse_status(raw)?,
            None => ApplicationStatus::default(),
        };
        let opportunity = decode_opportunity(fields.extended)?;

        let record = self
            .repo
            .insert(NewApplication {
                owner_id,
                role,
                company,
                location,
                status,
                link: fields.link.flatten(),
                notes: fields.notes.flatten(),
                opportunity,
            })
            .await?;
        info!(%owner_id, record_id = %record.id, status = %record.status, "application saved");
        Ok(record)
    }

    pub async fn list(&self, owner_id: Uuid) -> Result<Vec<ApplicationRecord>, RecordError> {
        let records = self.repo.list_by_owner(owner_id).await?;
        debug!(%owner_id, count = records.len(), "listed applications");
        Ok(records)
    }

    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<ApplicationRecord, RecordError> {
        self.repo.find(owner_id, id).await?.ok_or(RecordError::NotFound)
    }

    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        fields: ApplicationFields,
    ) -> Result<ApplicationRecord, RecordError> {
        let mut record = self.get(owner_id, id).await?;

        if fields.role.is_some() {
            record.role = required("role", fields.role.as_deref())?;
        }
        if fields.company.is_some() {
            record.company = required("company", fields.company.as_deref())?;
        }
        if fields.location.is_some() {
            record.location = required("location", fields.location.as_deref())?;
        }
        if let Some(raw) = fields.status.as_deref() {
            record.status = parse_status(raw)?;
        }
        if let Some(link) = fields.link {
            record.link = link;
        }
        if let Some(notes) = fields.notes {
            record.notes = notes;
        }
        if !fields.extended.is_empty() {
            record.opportunity = merge_extended(&record.opportunity, fields.extended)?;
        }

        let updated = self.repo.update(&record).await?.ok_or_else(|| {
            warn!(%owner_id, %id, "application vanished during update");
            RecordError::NotFound
        })?;
        info!(%owner_id, record_id = %id, status = %updated.status, "application updated");
        Ok(updated)
    }

    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), RecordError> {
        if !self.repo.delete(owner_id, id).await? {
            return Err(RecordError::NotFound);
        }
        info!(%owner_id, record_id = %id, "application deleted");
        Ok(())
    }
}
