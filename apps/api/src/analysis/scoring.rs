//! Score aggregation: turns the model's structured reply into 0-100 scores.
//!
//! Pure functions only; no I/O. Overall score is a weighted average:
//! 50% skill match, 30% experience, 20% education.

use serde::{Deserialize, Serialize};

use crate::analysis::ai_response::AiAnalysisResponse;
use crate::models::analysis::{ExperienceLevel, SkillAnalysis};
use crate::models::job_posting::JobPosting;

/// Weights in percent; they sum to 100.
pub const SKILL_WEIGHT: u32 = 50;
pub const EXPERIENCE_WEIGHT: u32 = 30;
pub const EDUCATION_WEIGHT: u32 = 20;

/// Share of the skill score carried by required vs preferred skills.
const REQUIRED_SHARE: f64 = 70.0;
const PREFERRED_SHARE: f64 = 30.0;

/// Skill score when the posting lists no required skills.
pub const NEUTRAL_SKILL_SCORE: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub overall: u8,
    pub skill_match: u8,
    pub experience: u8,
    pub education: u8,
}

impl ScoreBreakdown {
    fn from_parts(skill_match: u8, experience: u8, education: u8) -> Self {
        Self {
            overall: overall_score(skill_match, experience, education),
            skill_match,
            experience,
            education,
        }
    }
}

/// Fuzzy skill comparison: case-insensitive containment in either direction.
/// "React" matches "React Native"; blank skills match nothing.
pub fn skills_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

pub fn experience_score(level: ExperienceLevel) -> u8 {
    match level {
        ExperienceLevel::Expert => 100,
        ExperienceLevel::Senior => 85,
        ExperienceLevel::Mid => 70,
        ExperienceLevel::Junior | ExperienceLevel::Unknown => 50,
    }
}

pub fn education_score(meets_requirement: bool) -> u8 {
    if meets_requirement {
        100
    } else {
        50
    }
}

/// `required/total_required * 70 + preferred/max(total_preferred, 1) * 30`, rounded.
pub fn skill_match_score(
    required_matches: usize,
    total_required: usize,
    preferred_matches: usize,
    total_preferred: usize,
) -> u8 {
    if total_required == 0 {
        return NEUTRAL_SKILL_SCORE;
    }
    let required = required_matches.min(total_required) as f64 / total_required as f64;
    let preferred = preferred_matches.min(total_preferred) as f64 / total_preferred.max(1) as f64;
    (required * REQUIRED_SHARE + preferred * PREFERRED_SHARE)
        .round()
        .clamp(0.0, 100.0) as u8
}

/// Weighted average of the three sub-scores, rounded half up.
pub fn overall_score(skill_match: u8, experience: u8, education: u8) -> u8 {
    let weighted = u32::from(skill_match) * SKILL_WEIGHT
        + u32::from(experience) * EXPERIENCE_WEIGHT
        + u32::from(education) * EDUCATION_WEIGHT;
    ((weighted + 50) / 100).min(100) as u8
}

/// Splits the posting's skills into matched and missing, given the skills the model
/// found in the CV.
pub fn classify_skills(cv_skills: &[String], posting: &JobPosting) -> SkillAnalysis {
    let (required_matches, missing_required) = partition(&posting.required_skills, cv_skills);
    let (preferred_matches, missing_preferred) = partition(&posting.preferred_skills, cv_skills);

    SkillAnalysis {
        required_matches,
        preferred_matches,
        total_required: posting.required_skills.len(),
        total_preferred: posting.preferred_skills.len(),
        missing_required,
        missing_preferred,
    }
}

fn partition(wanted: &[String], cv_skills: &[String]) -> (usize, Vec<String>) {
    let mut matched = 0;
    let mut missing = Vec::new();
    for skill in wanted {
        if cv_skills.iter().any(|have| skills_match(skill, have)) {
            matched += 1;
        } else {
            missing.push(skill.clone());
        }
    }
    (matched, missing)
}

/// Scores a reply against a posting, using an already computed skill classification.
pub fn score_against_posting(reply: &AiAnalysisResponse, skills: &SkillAnalysis) -> ScoreBreakdown {
    ScoreBreakdown::from_parts(
        skill_match_score(
            skills.required_matches,
            skills.total_required,
            skills.preferred_matches,
            skills.total_preferred,
        ),
        experience_score(reply.experience_level()),
        education_score(reply.analysis.education_match),
    )
}

/// Scores a reply when no posting was supplied. Skills and education count as fully met.
pub fn score_general(reply: &AiAnalysisResponse) -> ScoreBreakdown {
    ScoreBreakdown::from_parts(100, experience_score(reply.experience_level()), 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ai_response::{AiAnalysis, SkillMatch};

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn posting(required: &[&str], preferred: &[&str]) -> JobPosting {
        JobPosting {
            title: "Engineer".to_string(),
            description: "Build things".to_string(),
            required_skills: skills(required),
            preferred_skills: skills(preferred),
            ..Default::default()
        }
    }

    fn reply(matching: &[&str], level: &str, education_match: bool) -> AiAnalysisResponse {
        AiAnalysisResponse {
            analysis: AiAnalysis {
                skill_match: SkillMatch {
                    matching: skills(matching),
                    missing: vec![],
                },
                experience_level: level.to_string(),
                education_match,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_skills_match_is_case_insensitive_both_directions() {
        assert!(skills_match("react", "React Native"));
        assert!(skills_match("React Native", "REACT"));
        assert!(skills_match("PostgreSQL", "postgresql"));
        assert!(!skills_match("Java", "Rust"));
    }

    #[test]
    fn test_blank_skill_never_matches() {
        assert!(!skills_match("", "Rust"));
        assert!(!skills_match("Rust", "   "));
    }

    #[test]
    fn test_experience_score_table() {
        assert_eq!(experience_score(ExperienceLevel::Expert), 100);
        assert_eq!(experience_score(ExperienceLevel::Senior), 85);
        assert_eq!(experience_score(ExperienceLevel::Mid), 70);
        assert_eq!(experience_score(ExperienceLevel::Junior), 50);
        assert_eq!(experience_score(ExperienceLevel::Unknown), 50);
    }

    #[test]
    fn test_education_score() {
        assert_eq!(education_score(true), 100);
        assert_eq!(education_score(false), 50);
    }

    #[test]
    fn test_skill_score_no_required_is_neutral() {
        assert_eq!(skill_match_score(0, 0, 3, 3), NEUTRAL_SKILL_SCORE);
    }

    #[test]
    fn test_skill_score_all_required_and_preferred() {
        assert_eq!(skill_match_score(4, 4, 2, 2), 100);
    }

    #[test]
    fn test_skill_score_all_required_no_preferred_listed() {
        // Preferred share cannot be earned when the posting lists none.
        assert_eq!(skill_match_score(2, 2, 0, 0), 70);
    }

    #[test]
    fn test_skill_score_partial_rounds() {
        // 2/3 * 70 = 46.67 -> 47
        assert_eq!(skill_match_score(2, 3, 0, 1), 47);
        // 1/4 * 70 = 17.5 -> 18
        assert_eq!(skill_match_score(1, 4, 0, 2), 18);
    }

    #[test]
    fn test_skill_score_never_exceeds_100() {
        assert_eq!(skill_match_score(9, 2, 9, 1), 100);
    }

    #[test]
    fn test_overall_score_weights() {
        // 47*0.5 + 85*0.3 + 100*0.2 = 23.5 + 25.5 + 20 = 69
        assert_eq!(overall_score(47, 85, 100), 69);
        assert_eq!(overall_score(100, 100, 100), 100);
        assert_eq!(overall_score(0, 0, 0), 0);
    }

    #[test]
    fn test_overall_score_rounds_half_up() {
        // 51*0.5 + 50*0.3 + 50*0.2 = 25.5 + 15 + 10 = 50.5 -> 51
        assert_eq!(overall_score(51, 50, 50), 51);
    }

    #[test]
    fn test_classify_counts_required_skills_not_cv_skills() {
        // Two CV skills cover the same required skill; it counts once.
        let analysis = classify_skills(
            &skills(&["React", "React Native"]),
            &posting(&["React", "TypeScript"], &[]),
        );
        assert_eq!(analysis.required_matches, 1);
        assert_eq!(analysis.total_required, 2);
        assert_eq!(analysis.missing_required, vec!["TypeScript"]);
    }

    #[test]
    fn test_classify_matches_plus_missing_equals_total() {
        let p = posting(&["Rust", "Docker", "Kubernetes"], &["Kafka", "gRPC"]);
        let analysis = classify_skills(&skills(&["rust", "docker compose", "grpc"]), &p);
        assert_eq!(
            analysis.required_matches + analysis.missing_required.len(),
            analysis.total_required
        );
        assert_eq!(
            analysis.preferred_matches + analysis.missing_preferred.len(),
            analysis.total_preferred
        );
        assert_eq!(analysis.missing_required, vec!["Kubernetes"]);
        assert_eq!(analysis.missing_preferred, vec!["Kafka"]);
    }

    #[test]
    fn test_classify_with_no_cv_skills_marks_everything_missing() {
        let p = posting(&["Rust"], &["Go"]);
        let analysis = classify_skills(&[], &p);
        assert_eq!(analysis.required_matches, 0);
        assert_eq!(analysis.missing_required, vec!["Rust"]);
        assert_eq!(analysis.missing_preferred, vec!["Go"]);
    }

    #[test]
    fn test_score_against_posting_end_to_end() {
        let p = posting(&["Rust", "Docker", "Kubernetes"], &["Kafka"]);
        let r = reply(&["Rust", "docker"], "senior", true);
        let scores = score_against_posting(&r, &classify_skills(&r.analysis.skill_match.matching, &p));
        assert_eq!(scores.skill_match, 47);
        assert_eq!(scores.experience, 85);
        assert_eq!(scores.education, 100);
        assert_eq!(scores.overall, 69);
    }

    #[test]
    fn test_score_against_posting_junior_without_education() {
        let p = posting(&["Python"], &["Django"]);
        let r = reply(&["python", "django"], "junior", false);
        let scores = score_against_posting(&r, &classify_skills(&r.analysis.skill_match.matching, &p));
        assert_eq!(scores.skill_match, 100);
        // 100*0.5 + 50*0.3 + 50*0.2 = 75
        assert_eq!(scores.overall, 75);
    }

    #[test]
    fn test_score_general_uses_weighted_formula() {
        let scores = score_general(&reply(&[], "expert", false));
        assert_eq!(scores.skill_match, 100);
        assert_eq!(scores.education, 100);
        assert_eq!(scores.experience, 100);
        assert_eq!(scores.overall, 100);

        let scores = score_general(&reply(&[], "mid", false));
        // 50 + 21 + 20
        assert_eq!(scores.overall, 91);
    }

    #[test]
    fn test_all_scores_bounded() {
        for level in ["junior", "mid", "senior", "expert", "wizard", ""] {
            for edu in [true, false] {
                let r = reply(&["a"], level, edu);
                let s = score_against_posting(&r, &classify_skills(&skills(&["a"]), &posting(&["a"], &[])));
                for v in [s.overall, s.skill_match, s.experience, s.education] {
                    assert!(v <= 100);
                }
            }
        }
    }
}
