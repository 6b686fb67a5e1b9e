use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded CV and the plain text extracted from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cv {
    pub id: String,
    pub file_name: String,
    pub content: String,
    pub uploaded_at: DateTime<Utc>,
    pub file_size: u64,
    pub file_type: String,
}

impl Cv {
    pub fn new(file_name: String, content: String, file_size: u64, file_type: String) -> Self {
        Self {
            id: new_cv_id(),
            file_name,
            content,
            uploaded_at: Utc::now(),
            file_size,
            file_type,
        }
    }
}

pub fn new_cv_id() -> String {
    format!("cv-{}", Uuid::new_v4())
}
