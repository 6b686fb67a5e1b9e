use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// A job posting the CV is measured against.
///
/// `id` and `created_at` are optional on the wire; `normalized` fills them in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobPosting {
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub preferred_skills: Vec<String>,
    pub required_experience: Option<String>,
    pub education_level: Option<String>,
    pub languages: Option<Vec<String>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl JobPosting {
    /// Rejects postings the UI form would not let through.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Job title is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(AppError::Validation(
                "Job description is required".to_string(),
            ));
        }
        if !self.required_skills.iter().any(|s| !s.trim().is_empty()) {
            return Err(AppError::Validation(
                "At least one required skill must be provided".to_string(),
            ));
        }
        Ok(())
    }

    /// Trims and de-duplicates skills (case-insensitive) and fills server-side defaults.
    pub fn normalized(mut self) -> Self {
        self.required_skills = dedup_skills(self.required_skills);
        self.preferred_skills = dedup_skills(self.preferred_skills);
        self.required_experience = non_blank(self.required_experience);
        self.education_level = non_blank(self.education_level);
        if self.id.as_deref().map_or(true, |id| id.trim().is_empty()) {
            self.id = Some(format!("job-{}", Uuid::new_v4()));
        }
        self.created_at.get_or_insert_with(Utc::now);
        self
    }

    pub fn id_or_default(&self) -> &str {
        self.id.as_deref().unwrap_or("job-posting")
    }
}

fn dedup_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(skills.len());
    let mut out = Vec::with_capacity(skills.len());
    for skill in skills {
        let trimmed = skill.trim();
        if trimmed.is_empty() {
            continue;
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(trimmed.to_string());
    }
    out
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
