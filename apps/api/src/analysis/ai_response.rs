//! Lenient decoding of the model's analysis reply.
//!
//! The model is asked for a fixed JSON shape but routinely omits fields, sends `null`
//! or the wrong type, or wraps the object in markdown fences. Decoding never fails:
//! a bad field takes its default and only a reply that is not a JSON object becomes
//! [`AiAnalysisResponse::fallback`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::llm_client::strip_json_fences;
use crate::models::analysis::ExperienceLevel;

pub const DEFAULT_REPORT: &str = "Analysis completed.";
pub const FALLBACK_REPORT: &str = "The analysis could not be completed. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiAnalysisResponse {
    #[serde(deserialize_with = "lenient_object")]
    pub extracted_data: ExtractedData,
    #[serde(deserialize_with = "lenient_object")]
    pub analysis: AiAnalysis,
    #[serde(deserialize_with = "lenient_string")]
    pub report: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractedData {
    #[serde(deserialize_with = "string_list")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub experience: String,
    #[serde(deserialize_with = "lenient_string")]
    pub education: String,
    #[serde(deserialize_with = "lenient_string")]
    pub education_level: String,
    #[serde(deserialize_with = "lenient_years")]
    pub years_of_experience: Option<f32>,
    #[serde(deserialize_with = "lenient_string")]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiAnalysis {
    #[serde(deserialize_with = "lenient_object")]
    pub skill_match: SkillMatch,
    #[serde(deserialize_with = "lenient_string")]
    pub experience_level: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub education_match: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SkillMatch {
    #[serde(deserialize_with = "string_list")]
    pub matching: Vec<String>,
    #[serde(deserialize_with = "string_list")]
    pub missing: Vec<String>,
}

impl AiAnalysisResponse {
    /// Reply used when the model's text cannot be read at all.
    pub fn fallback() -> Self {
        Self {
            report: FALLBACK_REPORT.to_string(),
            ..Default::default()
        }
    }

    pub fn experience_level(&self) -> ExperienceLevel {
        ExperienceLevel::from_ai(&self.analysis.experience_level)
    }

    fn with_defaults(mut self) -> Self {
        if self.report.trim().is_empty() {
            self.report = DEFAULT_REPORT.to_string();
        }
        self
    }
}

/// Decodes the model's text. Never fails.
pub fn parse_ai_response(text: &str) -> AiAnalysisResponse {
    let cleaned = strip_json_fences(text);
    let cleaned = extract_json_object(cleaned).unwrap_or(cleaned);

    let value = match serde_json::from_str::<Value>(cleaned) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) => {
            warn!("AI response is not a JSON object, using fallback");
            return AiAnalysisResponse::fallback();
        }
        Err(e) => {
            warn!("AI response could not be decoded, using fallback: {e}");
            return AiAnalysisResponse::fallback();
        }
    };

    match serde_json::from_value::<AiAnalysisResponse>(value) {
        Ok(parsed) => parsed.with_defaults(),
        Err(e) => {
            warn!("AI response has an unexpected shape, using fallback: {e}");
            AiAnalysisResponse::fallback()
        }
    }
}

/// Narrows text to the outermost `{ ... }` when the model adds prose around it.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Nested objects: anything other than a JSON object becomes the default.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    })
}

/// Numbers and booleans are stringified; arrays, objects and `null` become "".
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    })
}

/// Accepts booleans, "true"/"yes"/"1" strings and non-zero numbers.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1"
        ),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    })
}

/// Accepts `null`, a list with stray non-string items, or a single comma-separated string.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        _ => Vec::new(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// Years may arrive as a number, a numeric string ("5", "5+"), or not at all.
fn lenient_years<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().map(|v| v as f32),
        Some(Value::String(s)) => s
            .trim()
            .trim_end_matches('+')
            .trim()
            .parse::<f32>()
            .ok(),
        _ => None,
    }
    .filter(|years| years.is_finite() && *years >= 0.0))
}
