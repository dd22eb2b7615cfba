use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pre-screening verdict from the idea classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Searchable,
    Impossible,
    Ambiguous,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Searchable => "SEARCHABLE",
            Classification::Impossible => "IMPOSSIBLE",
            Classification::Ambiguous => "AMBIGUOUS",
        }
    }
}

/// Estimated implementation complexity of the idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Complexity {
    Low,
    Medium,
    High,
    VeryHigh,
}

/// Per-category web search queries supplied by the classifier.
/// The regional query is optional; its category is only searched when present.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebQueries {
    #[serde(default)]
    pub competitors: String,
    #[serde(default)]
    pub trends: String,
    #[serde(default)]
    pub technical: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional: Option<String>,
}

/// Output of the idea classifier: feasibility classification plus the search
/// queries that drive the evidence pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordExtraction {
    pub classification: Classification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
    #[serde(default)]
    pub github_queries: Vec<String>,
    #[serde(default)]
    pub web_queries: WebQueries,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub spdx_id: Option<String>,
}

/// A repository discovered by the code-host search, as validated at the API
/// boundary. `query_hits` counts how many distinct queries returned it;
/// `score` is assigned by the ranking engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubRepo {
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub pushed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readme_excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent_commit_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<HashMap<String, u64>>,
    #[serde(default = "default_query_hits")]
    pub query_hits: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

fn default_query_hits() -> u32 {
    1
}

/// Fixed set of web search categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebCategory {
    Competitors,
    Trends,
    Technical,
    Regional,
}

impl WebCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebCategory::Competitors => "competitors",
            WebCategory::Trends => "trends",
            WebCategory::Technical => "technical",
            WebCategory::Regional => "regional",
        }
    }
}

/// A single web search result after filtering and truncation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: f64,
    pub category: WebCategory,
}

/// Coarse verdict on how much prior-art evidence exists for the idea.
/// `Unknown` means the search infrastructure failed, which must never be
/// conflated with `Novel` ("searched and found nothing").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EcosystemSignal {
    Established,
    Emerging,
    Novel,
    Unknown,
}

impl EcosystemSignal {
    pub fn as_str(&self) -> &'static str {
        match self {
            EcosystemSignal::Established => "ESTABLISHED",
            EcosystemSignal::Emerging => "EMERGING",
            EcosystemSignal::Novel => "NOVEL",
            EcosystemSignal::Unknown => "UNKNOWN",
        }
    }
}

/// Result of the code-host search: the retained repo set and the signal
/// derived from the tier outcomes.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub repos: Vec<GithubRepo>,
    pub signal: EcosystemSignal,
}

/// Output of the ranking engine, ready to be embedded in the report prompt.
#[derive(Debug, Clone)]
pub struct RankedResults {
    pub repos: Vec<GithubRepo>,
    pub web: Vec<WebResult>,
    pub signal: EcosystemSignal,
    pub digest: String,
}

/// Analyze request body.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    pub idea: String,
}

/// Keep at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_serializes_screaming_case() {
        let json = serde_json::to_value(Classification::Searchable).unwrap();
        assert_eq!(json, "SEARCHABLE");
        let json = serde_json::to_value(Complexity::VeryHigh).unwrap();
        assert_eq!(json, "VERY_HIGH");
    }

    #[test]
    fn test_signal_round_trips() {
        for signal in [
            EcosystemSignal::Established,
            EcosystemSignal::Emerging,
            EcosystemSignal::Novel,
            EcosystemSignal::Unknown,
        ] {
            let json = serde_json::to_string(&signal).unwrap();
            let back: EcosystemSignal = serde_json::from_str(&json).unwrap();
            assert_eq!(back, signal);
            assert_eq!(json.trim_matches('"'), signal.as_str());
        }
    }

    #[test]
    fn test_repo_deserializes_from_search_payload() {
        // Shape of a GitHub search API item; ranking fields must default.
        let json = r#"{
            "full_name": "user/repo",
            "html_url": "https://github.com/user/repo",
            "description": "a tool",
            "stargazers_count": 42,
            "language": "Rust",
            "topics": ["cli"],
            "pushed_at": "2025-06-01T00:00:00Z",
            "created_at": "2024-01-01T00:00:00Z",
            "license": {"spdx_id": "MIT"},
            "open_issues_count": 3
        }"#;
        let repo: GithubRepo = serde_json::from_str(json).unwrap();
        assert_eq!(repo.query_hits, 1);
        assert!(repo.score.is_none());
        assert!(repo.readme_excerpt.is_none());
        assert_eq!(repo.stargazers_count, 42);
    }

    #[test]
    fn test_extraction_tolerates_missing_optionals() {
        let json = r#"{
            "classification": "IMPOSSIBLE",
            "reason": "physics"
        }"#;
        let extraction: KeywordExtraction = serde_json::from_str(json).unwrap();
        assert_eq!(extraction.classification, Classification::Impossible);
        assert!(extraction.github_queries.is_empty());
        assert!(extraction.web_queries.regional.is_none());
    }

    #[test]
    fn test_truncate_chars_unicode_safe() {
        let s = "아이디어 🌍 검증";
        let out = truncate_chars(s, 6);
        assert_eq!(out.chars().count(), 6);
        assert!(s.starts_with(&out));
    }

    #[test]
    fn test_truncate_chars_short_input() {
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
