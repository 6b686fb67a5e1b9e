use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Seniority bucket reported by the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceLevel {
    Junior,
    #[default]
    Mid,
    Senior,
    Expert,
    /// The model answered with something outside the four known levels.
    Unknown,
}

impl ExperienceLevel {
    /// Maps the model's free-form answer. A blank answer counts as `Mid`.
    pub fn from_ai(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "" | "mid" => ExperienceLevel::Mid,
            "junior" => ExperienceLevel::Junior,
            "senior" => ExperienceLevel::Senior,
            "expert" => ExperienceLevel::Expert,
            _ => ExperienceLevel::Unknown,
        }
    }
}

/// Result of analyzing one CV, optionally against a job posting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub cv_id: String,
    pub job_posting_id: String,
    pub overall_score: u8,
    pub skill_match_score: u8,
    pub experience_score: u8,
    pub education_score: u8,
    pub missing_skills: Vec<String>,
    pub matching_skills: Vec<String>,
    pub report: String,
    pub analyzed_at: DateTime<Utc>,
    pub details: AnalysisDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDetails {
    pub skill_analysis: SkillAnalysis,
    pub experience_analysis: ExperienceAnalysis,
    pub education_analysis: EducationAnalysis,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillAnalysis {
    pub required_matches: usize,
    pub preferred_matches: usize,
    pub total_required: usize,
    pub total_preferred: usize,
    pub missing_required: Vec<String>,
    pub missing_preferred: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceAnalysis {
    pub has_required_experience: bool,
    pub experience_level: ExperienceLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_experience: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationAnalysis {
    pub meets_education_requirement: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relevant_education: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_ai_known_levels_case_insensitive() {
        assert_eq!(ExperienceLevel::from_ai("Junior"), ExperienceLevel::Junior);
        assert_eq!(ExperienceLevel::from_ai(" SENIOR "), ExperienceLevel::Senior);
        assert_eq!(ExperienceLevel::from_ai("expert"), ExperienceLevel::Expert);
        assert_eq!(ExperienceLevel::from_ai("mid"), ExperienceLevel::Mid);
    }

    #[test]
    fn test_from_ai_blank_defaults_to_mid() {
        assert_eq!(ExperienceLevel::from_ai(""), ExperienceLevel::Mid);
    }

    #[test]
    fn test_from_ai_unrecognized_is_unknown() {
        assert_eq!(ExperienceLevel::from_ai("principal"), ExperienceLevel::Unknown);
    }

    #[test]
    fn test_experience_level_serializes_lowercase() {
        let json = serde_json::to_string(&ExperienceLevel::Senior).unwrap();
        assert_eq!(json, r#""senior""#);
    }
}
