//! Feedback parsing and validation.
//!
//! The model is asked for a specific JSON shape (see `prompts.rs`), but only
//! `overallScore` and `ATS` are checked. Everything else is stored verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Fields every accepted feedback object must carry.
pub const REQUIRED_FIELDS: [&str; 2] = ["overallScore", "ATS"];

/// Scored categories in the requested feedback shape, in display order.
pub const CATEGORIES: [&str; 5] = ["ATS", "toneAndStyle", "content", "structure", "skills"];

#[derive(Debug, Error, PartialEq)]
pub enum FeedbackError {
    #[error("response is not valid JSON: {0}")]
    Malformed(String),

    #[error("feedback is not a JSON object")]
    NotAnObject,

    #[error("feedback is missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

/// A feedback object that has passed the presence checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Feedback(Value);

impl TryFrom<Value> for Feedback {
    type Error = FeedbackError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let object = value.as_object().ok_or(FeedbackError::NotAnObject)?;
        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .into_iter()
            .filter(|field| object.get(*field).map_or(true, Value::is_null))
            .collect();
        if !missing.is_empty() {
            return Err(FeedbackError::MissingFields(missing));
        }
        Ok(Feedback(value))
    }
}

impl From<Feedback> for Value {
    fn from(feedback: Feedback) -> Self {
        feedback.0
    }
}

impl Feedback {
    pub fn overall_score(&self) -> Option<f64> {
        self.0.get("overallScore").and_then(Value::as_f64)
    }

    /// Score of a category such as `ATS` or `toneAndStyle`, when it is numeric.
    pub fn category_score(&self, category: &str) -> Option<f64> {
        self.0
            .get(category)
            .and_then(|c| c.get("score"))
            .and_then(Value::as_f64)
    }

    pub fn summary(&self) -> FeedbackSummary {
        FeedbackSummary {
            overall_score: self.overall_score(),
            categories: CATEGORIES
                .into_iter()
                .filter_map(|name| {
                    self.category_score(name).map(|score| CategorySummary {
                        name: name.to_string(),
                        score,
                        badge: ScoreBadge::for_score(score),
                    })
                })
                .collect(),
        }
    }
}

/// Parses fence-stripped model output into validated feedback.
pub fn parse_feedback(text: &str) -> Result<Feedback, FeedbackError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| FeedbackError::Malformed(e.to_string()))?;
    Feedback::try_from(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScoreBadge {
    #[serde(rename = "Strong")]
    Strong,
    #[serde(rename = "Good Start")]
    GoodStart,
    #[serde(rename = "Needs Work")]
    NeedsWork,
}

impl ScoreBadge {
    pub fn for_score(score: f64) -> Self {
        if score > 69.0 {
            ScoreBadge::Strong
        } else if score > 49.0 {
            ScoreBadge::GoodStart
        } else {
            ScoreBadge::NeedsWork
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub score: f64,
    pub badge: ScoreBadge,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummary {
    pub overall_score: Option<f64>,
    pub categories: Vec<CategorySummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_object_with_required_fields() {
        let feedback = parse_feedback(r#"{"overallScore": 72, "ATS": {"score": 65, "tips": []}}"#)
            .unwrap();
        assert_eq!(feedback.overall_score(), Some(72.0));
        assert_eq!(feedback.category_score("ATS"), Some(65.0));
    }

    #[test]
    fn test_rejects_missing_both_fields() {
        let err = parse_feedback(r#"{"summary": "looks fine"}"#).unwrap_err();
        assert_eq!(err, FeedbackError::MissingFields(vec!["overallScore", "ATS"]));
    }

    #[test]
    fn test_rejects_missing_one_field() {
        let err = parse_feedback(r#"{"overallScore": 50}"#).unwrap_err();
        assert_eq!(err, FeedbackError::MissingFields(vec!["ATS"]));
    }

    #[test]
    fn test_null_counts_as_missing() {
        let err = parse_feedback(r#"{"overallScore": null, "ATS": {}}"#).unwrap_err();
        assert_eq!(err, FeedbackError::MissingFields(vec!["overallScore"]));
    }

    #[test]
    fn test_zero_score_is_present() {
        assert!(parse_feedback(r#"{"overallScore": 0, "ATS": {"score": 0}}"#).is_ok());
    }

    #[test]
    fn test_rejects_non_object_json() {
        assert_eq!(parse_feedback("[1, 2]").unwrap_err(), FeedbackError::NotAnObject);
        assert_eq!(parse_feedback("\"text\"").unwrap_err(), FeedbackError::NotAnObject);
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            parse_feedback("Sorry, I cannot read this resume."),
            Err(FeedbackError::Malformed(_))
        ));
    }

    #[test]
    fn test_deserialize_runs_validation() {
        let ok: Result<Feedback, _> = serde_json::from_value(json!({"overallScore": 1, "ATS": 2}));
        assert!(ok.is_ok());
        let bad: Result<Feedback, _> = serde_json::from_value(json!({"ATS": 2}));
        assert!(bad.is_err());
    }

    #[test]
    fn test_serializes_as_the_original_object() {
        let raw = json!({"overallScore": 80, "ATS": {"score": 90, "tips": []}, "extra": true});
        let feedback = Feedback::try_from(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&feedback).unwrap(), raw);
    }

    #[test]
    fn test_score_badge_thresholds() {
        assert_eq!(ScoreBadge::for_score(70.0), ScoreBadge::Strong);
        assert_eq!(ScoreBadge::for_score(69.0), ScoreBadge::GoodStart);
        assert_eq!(ScoreBadge::for_score(50.0), ScoreBadge::GoodStart);
        assert_eq!(ScoreBadge::for_score(49.0), ScoreBadge::NeedsWork);
        assert_eq!(ScoreBadge::for_score(0.0), ScoreBadge::NeedsWork);
    }

    #[test]
    fn test_summary_skips_categories_without_numeric_score() {
        let feedback = Feedback::try_from(json!({
            "overallScore": 75,
            "ATS": {"score": 82, "tips": []},
            "toneAndStyle": {"score": "n/a"},
            "skills": {"score": 40, "tips": []}
        }))
        .unwrap();
        let summary = feedback.summary();
        assert_eq!(summary.overall_score, Some(75.0));
        let names: Vec<_> = summary.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ATS", "skills"]);
        assert_eq!(summary.categories[0].badge, ScoreBadge::Strong);
        assert_eq!(summary.categories[1].badge, ScoreBadge::NeedsWork);
        assert_eq!(
            serde_json::to_value(summary.categories[1].badge).unwrap(),
            json!("Needs Work")
        );
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let feedback = Feedback::try_from(json!({"overallScore": 64, "ATS": {"score": 55}})).unwrap();
        let value = serde_json::to_value(feedback.summary()).unwrap();
        assert_eq!(value["overallScore"], json!(64.0));
        assert!(value.get("overall_score").is_none());
        assert_eq!(value["categories"][0]["badge"], json!("Good Start"));
    }
}
