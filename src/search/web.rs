//! Web evidence aggregation across fixed search categories.
//!
//! Each category (competitors, trends, technical, optional regional) runs as
//! an independent Tavily call with its own tuned parameters. Failed
//! categories degrade to empty; only a total wipeout is an error.

use anyhow::{bail, Result};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::TavilyConfig;
use crate::fetch::{fetch_with_retry, RetryConfig};
use crate::models::{truncate_chars, WebCategory, WebQueries, WebResult};

const MIN_RELEVANCE: f64 = 0.5;
const CONTENT_CHARS: usize = 500;

const COMPETITOR_DOMAINS: [&str; 4] = [
    "producthunt.com",
    "g2.com",
    "alternativeto.net",
    "techcrunch.com",
];

// ─── Boundary types ──────────────────────────────────────

#[derive(Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    topic: &'a str,
    search_depth: &'a str,
    max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_domains: Option<&'a [&'a str]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_range: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    include_answer: Option<&'a str>,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyItem>,
}

#[derive(Deserialize)]
struct TavilyItem {
    #[serde(default)]
    title: String,
    url: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    score: f64,
}

// ─── Per-category calls ──────────────────────────────────

async fn search_category(
    client: &reqwest::Client,
    config: &TavilyConfig,
    category: WebCategory,
    query: &str,
) -> Result<Vec<WebResult>> {
    let api_key = config.api_key.as_deref().unwrap_or_default();
    let body = match category {
        WebCategory::Competitors => TavilyRequest {
            api_key,
            query,
            topic: "general",
            search_depth: "advanced",
            max_results: 8,
            include_domains: Some(&COMPETITOR_DOMAINS),
            time_range: None,
            include_answer: None,
        },
        WebCategory::Trends => TavilyRequest {
            api_key,
            query,
            topic: "news",
            search_depth: "basic",
            max_results: 8,
            include_domains: None,
            time_range: Some("month"),
            include_answer: None,
        },
        WebCategory::Technical => TavilyRequest {
            api_key,
            query,
            topic: "general",
            search_depth: "basic",
            max_results: 5,
            include_domains: None,
            time_range: None,
            include_answer: Some("basic"),
        },
        WebCategory::Regional => TavilyRequest {
            api_key,
            query,
            topic: "general",
            search_depth: "basic",
            max_results: 5,
            include_domains: None,
            time_range: None,
            include_answer: None,
        },
    };

    let req = client
        .post(format!("{}/search", config.base_url))
        .json(&body);
    let resp = fetch_with_retry(req, &RetryConfig::default()).await?;
    if !resp.status().is_success() {
        bail!("web search returned {}", resp.status());
    }
    let parsed: TavilyResponse = resp.json().await?;
    Ok(to_web_results(parsed.results, category))
}

/// Drop weak matches and clamp content length.
fn to_web_results(items: Vec<TavilyItem>, category: WebCategory) -> Vec<WebResult> {
    items
        .into_iter()
        .filter(|item| item.score > MIN_RELEVANCE)
        .map(|item| WebResult {
            title: item.title,
            url: item.url,
            content: truncate_chars(&item.content, CONTENT_CHARS),
            score: item.score,
            category,
        })
        .collect()
}

/// Deduplicate by URL (first category in the fixed order wins) and sort by
/// relevance, best first.
fn merge_and_sort(category_results: Vec<Vec<WebResult>>) -> Vec<WebResult> {
    let mut seen = HashSet::new();
    let mut merged: Vec<WebResult> = category_results
        .into_iter()
        .flatten()
        .filter(|result| seen.insert(result.url.clone()))
        .collect();
    merged.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    merged
}

// ─── Public entry point ──────────────────────────────────

/// Run all applicable category searches concurrently and merge them.
///
/// A missing API key means web search was never attempted: that degrades to
/// an empty result, not an outage. Returns `Err` only when every category
/// call failed, so the orchestrator can tell "no web evidence" apart from
/// "web search was down".
pub async fn search_web(
    client: &reqwest::Client,
    config: &TavilyConfig,
    queries: &WebQueries,
) -> Result<Vec<WebResult>> {
    if config.api_key.is_none() {
        tracing::warn!("web search API key not configured, skipping web evidence");
        return Ok(Vec::new());
    }

    let mut calls: Vec<(WebCategory, &str)> = vec![
        (WebCategory::Competitors, queries.competitors.as_str()),
        (WebCategory::Trends, queries.trends.as_str()),
        (WebCategory::Technical, queries.technical.as_str()),
    ];
    if let Some(regional) = queries.regional.as_deref() {
        if !regional.is_empty() {
            calls.push((WebCategory::Regional, regional));
        }
    }

    let futures = calls
        .into_iter()
        .map(|(category, query)| async move {
            (category, search_category(client, config, category, query).await)
        });

    let mut category_results = Vec::new();
    let mut succeeded = 0usize;
    for (category, result) in join_all(futures).await {
        match result {
            Ok(results) => {
                succeeded += 1;
                category_results.push(results);
            }
            Err(e) => {
                tracing::warn!("web search category {} failed: {e:#}", category.as_str());
            }
        }
    }

    if succeeded == 0 {
        bail!("all web search categories failed");
    }

    Ok(merge_and_sort(category_results))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(url: &str, score: f64) -> TavilyItem {
        TavilyItem {
            title: format!("title {url}"),
            url: url.to_string(),
            content: "content".to_string(),
            score,
        }
    }

    #[test]
    fn test_relevance_filter_is_strict() {
        let results = to_web_results(
            vec![item("a", 0.9), item("b", 0.5), item("c", 0.51)],
            WebCategory::Trends,
        );
        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        // 0.5 exactly is dropped.
        assert_eq!(urls, vec!["a", "c"]);
    }

    #[test]
    fn test_content_truncated() {
        let long = TavilyItem {
            title: "t".into(),
            url: "u".into(),
            content: "x".repeat(2000),
            score: 0.8,
        };
        let results = to_web_results(vec![long], WebCategory::Technical);
        assert_eq!(results[0].content.chars().count(), CONTENT_CHARS);
    }

    #[test]
    fn test_merge_dedups_by_url_first_wins() {
        let competitors = to_web_results(vec![item("dup", 0.7)], WebCategory::Competitors);
        let trends = to_web_results(vec![item("dup", 0.95), item("other", 0.6)], WebCategory::Trends);
        let merged = merge_and_sort(vec![competitors, trends]);
        assert_eq!(merged.len(), 2);
        let dup = merged.iter().find(|r| r.url == "dup").unwrap();
        assert_eq!(dup.category, WebCategory::Competitors);
        assert_eq!(dup.score, 0.7);
    }

    #[test]
    fn test_merge_sorts_by_score_desc() {
        let merged = merge_and_sort(vec![to_web_results(
            vec![item("low", 0.6), item("high", 0.99), item("mid", 0.8)],
            WebCategory::Technical,
        )]);
        let urls: Vec<&str> = merged.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["high", "mid", "low"]);
    }

    #[tokio::test]
    async fn test_missing_api_key_returns_empty() {
        // Unroutable base URL: a clean empty result proves no call was made.
        let config = TavilyConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: None,
        };
        let client = reqwest::Client::new();
        let results = search_web(&client, &config, &WebQueries::default())
            .await
            .unwrap();
        assert!(results.is_empty());
    }
}
