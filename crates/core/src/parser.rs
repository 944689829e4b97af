//! # Response Parser
//!
//! Converts the model's raw text into validated findings.
//!
//! The model is asked for a fixed JSON shape but is under no obligation to
//! comply: responses arrive as clean JSON, JSON wrapped in markdown fences,
//! JSON embedded in prose, or garbage. Parsing therefore never fails — it
//! extracts every record that validates against the schema and counts the
//! rest as discarded. Records are validated field by field; anything with
//! an unknown file path, an invalid enum value or an empty required field
//! is dropped, not coerced.
//!
//! Parsing is pure and deterministic: no I/O, no clock, identical input
//! yields identical output. That keeps it directly unit-testable against
//! fixed text fixtures.

use std::collections::HashSet;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::models::{
    clamp_score, IssueSeverity, SecurityIssue, Suggestion, SuggestionCategory, SuggestionSeverity,
};

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;

/// The component score used when the model omits one or reports something
/// that is not a number.
pub const DEFAULT_COMPONENT_SCORE: f64 = 50.0;

/// The model-reported component scores for one chunk, after clamping.
///
/// Only a candidate: the overall score is computed by the pipeline, never
/// taken from here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricsCandidate {
    /// Complexity score in `[0, 100]`
    pub complexity_score: f64,

    /// Maintainability score in `[0, 100]`
    pub maintainability_score: f64,
}

impl Default for MetricsCandidate {
    fn default() -> Self {
        Self {
            complexity_score: DEFAULT_COMPONENT_SCORE,
            maintainability_score: DEFAULT_COMPONENT_SCORE,
        }
    }
}

/// Everything the parser could extract from one model response.
#[derive(Debug, Clone, Default)]
pub struct ParsedFindings {
    /// Suggestions that passed validation
    pub suggestions: Vec<Suggestion>,

    /// Security issues that passed validation
    pub security_issues: Vec<SecurityIssue>,

    /// The clamped component scores, defaulted where missing
    pub metrics: MetricsCandidate,

    /// The model's brief assessment text, if it supplied one
    pub summary: Option<String>,

    /// The number of records that failed validation and were dropped
    pub discarded: usize,
}

/// The loose shape the payload is deserialized into before validation.
/// Every field is optional; validation happens afterwards, record by
/// record.
#[derive(Debug, Deserialize, Default)]
struct RawAnalysis {
    #[serde(default)]
    suggestions: Vec<Value>,

    #[serde(default)]
    security_issues: Vec<Value>,

    complexity_score: Option<Value>,

    maintainability_score: Option<Value>,

    overall_assessment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    file_path: Option<String>,
    line_number: Option<Value>,
    suggestion: Option<String>,
    category: Option<String>,
    severity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSecurityIssue {
    file_path: Option<String>,
    line_number: Option<Value>,
    issue_type: Option<String>,
    description: Option<String>,
    severity: Option<String>,
    recommendation: Option<String>,
}

/// Pulls the JSON payload candidates out of a raw model response.
///
/// Candidates are tried in order of specificity: a ```json fence, any
/// fence, then the outermost brace span. The first candidate that
/// deserializes wins.
fn payload_candidates(raw: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(start) = raw.find("```json") {
        let rest = &raw[start + "```json".len()..];
        if let Some(end) = rest.find("```") {
            candidates.push(rest[..end].trim().to_string());
        }
    }

    if let Some(start) = raw.find("```") {
        let rest = &raw[start + "```".len()..];
        if let Some(end) = rest.find("```") {
            candidates.push(rest[..end].trim().to_string());
        }
    }

    if let (Some(open), Some(close)) = (raw.find('{'), raw.rfind('}')) {
        if close > open {
            candidates.push(raw[open..=close].to_string());
        }
    }

    candidates
}

/// Interprets a score value the model reported.
///
/// Numbers are used directly, numeric strings are accepted, and anything
/// else falls back to [`DEFAULT_COMPONENT_SCORE`]. The result is always
/// clamped into `[0, 100]`.
fn extract_score(value: Option<&Value>) -> f64 {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match score {
        Some(s) if s.is_finite() => clamp_score(s),
        _ => DEFAULT_COMPONENT_SCORE,
    }
}

/// A non-empty trimmed string, or `None`.
fn required_text(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}

/// A line number if the model reported a usable one.
fn optional_line(value: Option<&Value>) -> Option<u64> {
    value.and_then(Value::as_u64)
}

fn validate_suggestion(value: Value, known_files: &HashSet<&str>) -> Option<Suggestion> {
    let raw: RawSuggestion = serde_json::from_value(value).ok()?;

    let file_path = required_text(raw.file_path)?;
    if !known_files.contains(file_path.as_str()) {
        return None;
    }

    let category = SuggestionCategory::from_str(raw.category.as_deref()?).ok()?;
    let severity = SuggestionSeverity::from_str(raw.severity.as_deref()?).ok()?;
    let suggestion = required_text(raw.suggestion)?;

    Some(Suggestion {
        file_path,
        line_number: optional_line(raw.line_number.as_ref()),
        category,
        severity,
        suggestion,
    })
}

fn validate_security_issue(value: Value, known_files: &HashSet<&str>) -> Option<SecurityIssue> {
    let raw: RawSecurityIssue = serde_json::from_value(value).ok()?;

    let file_path = required_text(raw.file_path)?;
    if !known_files.contains(file_path.as_str()) {
        return None;
    }

    let severity = IssueSeverity::from_str(raw.severity.as_deref()?).ok()?;
    let issue_type = required_text(raw.issue_type)?;
    let description = required_text(raw.description)?;
    let recommendation = required_text(raw.recommendation)?;

    Some(SecurityIssue {
        file_path,
        line_number: optional_line(raw.line_number.as_ref()),
        issue_type,
        severity,
        description,
        recommendation,
    })
}

/// Parses one raw model response against the files it was asked about.
///
/// # Arguments
///
/// * `raw_text` - The model's response, exactly as received
/// * `known_files` - The file paths the prompt covered; findings that
///   reference any other path are dropped
///
/// # Returns
///
/// The validated findings. When the whole payload is unextractable the
/// result is empty with `discarded == 1` (the payload itself counts as one
/// discarded record) and defaulted metrics.
pub fn parse(raw_text: &str, known_files: &[String]) -> ParsedFindings {
    let known: HashSet<&str> = known_files.iter().map(String::as_str).collect();

    let raw = payload_candidates(raw_text)
        .into_iter()
        .find_map(|candidate| serde_json::from_str::<RawAnalysis>(&candidate).ok());

    let Some(raw) = raw else {
        return ParsedFindings {
            discarded: 1,
            ..ParsedFindings::default()
        };
    };

    let mut findings = ParsedFindings {
        metrics: MetricsCandidate {
            complexity_score: extract_score(raw.complexity_score.as_ref()),
            maintainability_score: extract_score(raw.maintainability_score.as_ref()),
        },
        summary: required_text(raw.overall_assessment),
        ..ParsedFindings::default()
    };

    for value in raw.suggestions {
        match validate_suggestion(value, &known) {
            Some(suggestion) => findings.suggestions.push(suggestion),
            None => findings.discarded += 1,
        }
    }

    for value in raw.security_issues {
        match validate_security_issue(value, &known) {
            Some(issue) => findings.security_issues.push(issue),
            None => findings.discarded += 1,
        }
    }

    findings
}
