//! Axum route handlers for the Analysis API.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::analysis::AnalysisResult;
use crate::models::cv::Cv;
use crate::models::job_posting::JobPosting;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzeRequest {
    pub cv_id: Option<String>,
    pub cv_content: Option<String>,
    pub file_name: Option<String>,
    pub job_posting: Option<JobPosting>,
}

/// POST /api/v1/analyze
///
/// Analyzes previously extracted CV text, optionally against a job posting.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    let cv_id = non_blank(request.cv_id);
    let content = non_blank(request.cv_content);
    let (Some(cv_id), Some(content)) = (cv_id, content) else {
        return Err(AppError::Validation("CV content is required".to_string()));
    };

    let posting = match request.job_posting {
        Some(posting) => {
            posting.validate()?;
            Some(posting.normalized())
        }
        None => None,
    };

    let analyzer = state.analyzer.as_ref().ok_or_else(|| {
        AppError::Configuration("Google API key is not configured".to_string())
    })?;

    let cv = Cv {
        id: cv_id,
        file_name: non_blank(request.file_name).unwrap_or_else(|| "uploaded-cv".to_string()),
        file_size: content.len() as u64,
        content,
        uploaded_at: Utc::now(),
        file_type: "text/plain".to_string(),
    };

    info!(
        cv_id = %cv.id,
        with_posting = posting.is_some(),
        "Analyzing CV"
    );

    let result = analyzer.analyze(&cv, posting.as_ref()).await?;
    Ok(Json(result))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
