use serde::Serialize;

use crate::jobs::repo_types::ApplicationRecord;

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<ApplicationRecord>,
}

#[derive(Debug, Serialize)]
pub struct JobResponse {
    pub message: &'static str,
    pub job: ApplicationRecord,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub item: ApplicationRecord,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
