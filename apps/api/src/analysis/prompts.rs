// LLM prompt templates for CV analysis.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::models::job_posting::JobPosting;

pub const CV_ANALYSIS_ROLE: &str = "You are an experienced human-resources specialist \
    who screens CVs for hiring managers.";

/// CV analysis prompt. Placeholders: `{cv_content}`, `{job_section}`, `{matching_hint}`,
/// `{missing_hint}` and `{report_language}`.
pub const CV_ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the following CV in detail.

CV CONTENT:
{cv_content}
{job_section}
Return a JSON object with this EXACT schema:
{
  "extractedData": {
    "skills": ["skill1", "skill2"],
    "experience": "short description of the candidate's work experience",
    "education": "education summary",
    "educationLevel": "highest degree, e.g. Bachelor",
    "yearsOfExperience": 4,
    "summary": "two sentence summary of the candidate"
  },
  "analysis": {
    "skillMatch": {
      "matching": ["skills found in the CV{matching_hint}"],
      "missing": [{missing_hint}]
    },
    "experienceLevel": "junior|mid|senior|expert",
    "educationMatch": true
  },
  "report": "Detailed analysis report in {report_language}, 200-300 words, covering skills, experience level, education and an overall assessment."
}
"#;

const JOB_SECTION_TEMPLATE: &str = r#"
JOB POSTING:
Title: {title}
Description: {description}
Required skills: {required_skills}
Preferred skills: {preferred_skills}
Required experience: {required_experience}
Education level: {education_level}
"#;

/// System instruction sent with every analysis call.
pub fn analysis_system() -> String {
    format!("{CV_ANALYSIS_ROLE} {NO_INVENTION_INSTRUCTION} {JSON_ONLY_SYSTEM}")
}

/// Renders the analysis prompt, adding the job posting section when one is given.
pub fn build_analysis_prompt(
    cv_content: &str,
    posting: Option<&JobPosting>,
    report_language: &str,
) -> String {
    let (job_section, matching_hint, missing_hint) = match posting {
        Some(p) => (
            render_job_section(p),
            " that are relevant to the job posting",
            "\"job posting skills not found in the CV\"",
        ),
        None => (String::new(), "", ""),
    };

    fill_template(
        CV_ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("cv_content", cv_content),
            ("job_section", job_section.as_str()),
            ("matching_hint", matching_hint),
            ("missing_hint", missing_hint),
            ("report_language", report_language),
        ],
    )
}

fn render_job_section(posting: &JobPosting) -> String {
    let or_none = |s: Option<&str>| s.unwrap_or("not specified").to_string();
    let list = |skills: &[String]| {
        if skills.is_empty() {
            "none".to_string()
        } else {
            skills.join(", ")
        }
    };

    let required_skills = list(&posting.required_skills);
    let preferred_skills = list(&posting.preferred_skills);
    let required_experience = or_none(posting.required_experience.as_deref());
    let education_level = or_none(posting.education_level.as_deref());

    fill_template(
        JOB_SECTION_TEMPLATE,
        &[
            ("title", posting.title.trim()),
            ("description", posting.description.trim()),
            ("required_skills", required_skills.as_str()),
            ("preferred_skills", preferred_skills.as_str()),
            ("required_experience", required_experience.as_str()),
            ("education_level", education_level.as_str()),
        ],
    )
}

/// Replaces `{name}` placeholders in one pass. Inserted values are never rescanned,
/// so braces in CV or posting text come through verbatim. Unknown `{...}` is kept.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let hit = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (close, *value))
        });
        match hit {
            Some((close, value)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn posting() -> JobPosting {
        JobPosting {
            title: "Platform Engineer".to_string(),
            description: "Own our Kubernetes clusters".to_string(),
            required_skills: vec!["Kubernetes".to_string(), "Go".to_string()],
            preferred_skills: vec![],
            required_experience: Some("3+ years".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_prompt_without_posting_has_no_job_section() {
        let prompt = build_analysis_prompt("Jane Doe, Rust developer", None, "English");
        assert!(prompt.contains("Jane Doe, Rust developer"));
        assert!(!prompt.contains("JOB POSTING"));
        assert!(prompt.contains("report in English"));
        assert!(!prompt.contains("{job_section}"));
    }

    #[test]
    fn test_prompt_with_posting_lists_skills() {
        let prompt = build_analysis_prompt("cv text", Some(&posting()), "Turkish");
        assert!(prompt.contains("JOB POSTING"));
        assert!(prompt.contains("Required skills: Kubernetes, Go"));
        assert!(prompt.contains("Preferred skills: none"));
        assert!(prompt.contains("Required experience: 3+ years"));
        assert!(prompt.contains("Education level: not specified"));
        assert!(prompt.contains("Turkish"));
    }

    #[test]
    fn test_placeholders_in_cv_text_are_not_expanded() {
        let prompt = build_analysis_prompt("I like {report_language} templates", None, "German");
        assert!(prompt.contains("I like {report_language} templates"));
    }

    #[test]
    fn test_placeholders_in_posting_text_are_not_expanded() {
        let mut p = posting();
        p.title = "Lead {report_language} writer".to_string();
        p.description = "Paste {cv_content} and {description} here".to_string();
        p.required_skills = vec!["{title}".to_string()];

        let prompt = build_analysis_prompt("CV BODY", Some(&p), "German");
        assert!(prompt.contains("Title: Lead {report_language} writer"));
        assert!(prompt.contains("Description: Paste {cv_content} and {description} here"));
        assert!(prompt.contains("Required skills: {title}"));
        assert_eq!(prompt.matches("CV BODY").count(), 1);
    }

    #[test]
    fn test_fill_template_keeps_unknown_and_json_braces() {
        let filled = fill_template(r#"{"a": {x}, "b": {y}}"#, &[("x", "1")]);
        assert_eq!(filled, r#"{"a": 1, "b": {y}}"#);
    }

    #[test]
    fn test_no_template_placeholders_left() {
        let prompt = build_analysis_prompt("cv", Some(&posting()), "English");
        for placeholder in [
            "{job_section}",
            "{matching_hint}",
            "{missing_hint}",
            "{report_language}",
            "{title}",
            "{description}",
        ] {
            assert!(!prompt.contains(placeholder), "left over: {placeholder}");
        }
    }

    #[test]
    fn test_system_demands_json() {
        assert!(analysis_system().contains("valid JSON only"));
    }
}
