//! Pluggable, trait-based CV analyzer.
//!
//! `AppState` holds an `Arc<dyn CvAnalyzer>`. The default backend is `LlmCvAnalyzer`;
//! tests swap in canned analyzers without touching the handlers.

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::analysis::ai_response::{parse_ai_response, AiAnalysisResponse};
use crate::analysis::prompts::{analysis_system, build_analysis_prompt};
use crate::analysis::scoring::{
    classify_skills, score_against_posting, score_general, skills_match,
};
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::analysis::{
    AnalysisDetails, AnalysisResult, EducationAnalysis, ExperienceAnalysis, ExperienceLevel,
    SkillAnalysis,
};
use crate::models::cv::Cv;
use crate::models::job_posting::JobPosting;

/// Job posting id reported when a CV is analyzed on its own.
pub const GENERAL_ANALYSIS_ID: &str = "cv-analysis";

/// Implement this to swap analysis backends without touching the route.
#[async_trait]
pub trait CvAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        cv: &Cv,
        posting: Option<&JobPosting>,
    ) -> Result<AnalysisResult, AppError>;
}

/// Sends the CV (and posting, if any) to the model and scores its reply.
pub struct LlmCvAnalyzer {
    llm: LlmClient,
    report_language: String,
}

impl LlmCvAnalyzer {
    pub fn new(llm: LlmClient, report_language: String) -> Self {
        Self {
            llm,
            report_language,
        }
    }
}

#[async_trait]
impl CvAnalyzer for LlmCvAnalyzer {
    async fn analyze(
        &self,
        cv: &Cv,
        posting: Option<&JobPosting>,
    ) -> Result<AnalysisResult, AppError> {
        let prompt = build_analysis_prompt(&cv.content, posting, &self.report_language);
        let text = self
            .llm
            .call_text(&prompt, &analysis_system())
            .await
            .map_err(|e| AppError::Llm(format!("CV analysis failed: {e}")))?;

        let reply = parse_ai_response(&text);
        let result = build_analysis_result(cv, posting, &reply);

        info!(
            cv_id = %cv.id,
            job_posting_id = %result.job_posting_id,
            model = %self.llm.model(),
            overall_score = result.overall_score,
            "CV analyzed"
        );
        Ok(result)
    }
}

/// Assembles the result from a decoded reply. Pure; no I/O.
pub fn build_analysis_result(
    cv: &Cv,
    posting: Option<&JobPosting>,
    reply: &AiAnalysisResponse,
) -> AnalysisResult {
    match posting {
        Some(posting) => result_against_posting(cv, posting, reply),
        None => general_result(cv, reply),
    }
}

fn result_against_posting(
    cv: &Cv,
    posting: &JobPosting,
    reply: &AiAnalysisResponse,
) -> AnalysisResult {
    let matching = &reply.analysis.skill_match.matching;
    if matching.is_empty() && !reply.extracted_data.skills.is_empty() {
        warn!(cv_id = %cv.id, "model returned no matching skills; skill score will be low");
    }

    let skill_analysis = classify_skills(matching, posting);
    let scores = score_against_posting(reply, &skill_analysis);
    let level = reply.experience_level();

    let missing_skills: Vec<String> = skill_analysis
        .missing_required
        .iter()
        .chain(skill_analysis.missing_preferred.iter())
        .cloned()
        .collect();

    let unlisted = unlisted_missing(&reply.analysis.skill_match.missing, &missing_skills);
    if !unlisted.is_empty() {
        debug!(
            cv_id = %cv.id,
            ?unlisted,
            "model reported missing skills that the posting match did not"
        );
    }

    AnalysisResult {
        cv_id: cv.id.clone(),
        job_posting_id: posting.id_or_default().to_string(),
        overall_score: scores.overall,
        skill_match_score: scores.skill_match,
        experience_score: scores.experience,
        education_score: scores.education,
        missing_skills,
        matching_skills: matching.clone(),
        report: reply.report.clone(),
        analyzed_at: Utc::now(),
        details: AnalysisDetails {
            skill_analysis,
            experience_analysis: experience_analysis(reply, level != ExperienceLevel::Junior),
            education_analysis: education_analysis(reply, reply.analysis.education_match),
        },
    }
}

fn general_result(cv: &Cv, reply: &AiAnalysisResponse) -> AnalysisResult {
    let scores = score_general(reply);

    AnalysisResult {
        cv_id: cv.id.clone(),
        job_posting_id: GENERAL_ANALYSIS_ID.to_string(),
        overall_score: scores.overall,
        skill_match_score: scores.skill_match,
        experience_score: scores.experience,
        education_score: scores.education,
        missing_skills: Vec::new(),
        matching_skills: reply.extracted_data.skills.clone(),
        report: reply.report.clone(),
        analyzed_at: Utc::now(),
        details: AnalysisDetails {
            skill_analysis: SkillAnalysis::default(),
            experience_analysis: experience_analysis(reply, true),
            education_analysis: education_analysis(reply, true),
        },
    }
}

/// Skills the model called missing that are absent from the computed missing list.
fn unlisted_missing<'a>(model_missing: &'a [String], computed: &[String]) -> Vec<&'a str> {
    model_missing
        .iter()
        .filter(|skill| !computed.iter().any(|m| skills_match(m, skill)))
        .map(String::as_str)
        .collect()
}

fn experience_analysis(reply: &AiAnalysisResponse, has_required: bool) -> ExperienceAnalysis {
    ExperienceAnalysis {
        has_required_experience: has_required,
        experience_level: reply.experience_level(),
        years_of_experience: reply.extracted_data.years_of_experience,
        relevant_experience: non_empty(&reply.extracted_data.experience),
    }
}

fn education_analysis(reply: &AiAnalysisResponse, meets: bool) -> EducationAnalysis {
    EducationAnalysis {
        meets_education_requirement: meets,
        education_level: non_empty(&reply.extracted_data.education_level),
        relevant_education: non_empty(&reply.extracted_data.education),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
