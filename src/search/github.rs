//! Tiered GitHub repository search.
//!
//! The search runs in two passes: a strict tier (active, non-trivial repos)
//! and, when the strict tier is thin, a broad fallback tier. The tier
//! outcomes determine the ecosystem signal, and the retained repos are
//! enriched with README excerpts and activity data on a best-effort basis.

use anyhow::{bail, Context, Result};
use base64::Engine;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures_util::future::join_all;
use serde::Deserialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::GithubConfig;
use crate::fetch::{fetch_with_retry, RetryConfig};
use crate::models::{truncate_chars, EcosystemSignal, GithubRepo, SearchOutcome};

const MAX_FREE_QUERIES: usize = 4;
const MAX_TOPIC_QUERIES: usize = 2;
const MAX_QUERIES: usize = 5;
const PER_QUERY_RESULTS: u32 = 10;

const STRICT_MIN_STARS: u32 = 10;
const STRICT_WINDOW_DAYS: i64 = 244; // ~8 months
const BROAD_MIN_STARS: u32 = 1;
const BROAD_WINDOW_DAYS: i64 = 730; // ~2 years

const ESTABLISHED_THRESHOLD: usize = 3;
const TOP_REPOS: usize = 10;

const ENRICH_CONCURRENCY: usize = 4;
const README_EXCERPT_CHARS: usize = 1000;
const README_LIMIT_ESTABLISHED: usize = 8;
const README_LIMIT_EMERGING: usize = 5;
const ACTIVITY_LIMIT: usize = 5;

// ─── Boundary types ──────────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<GithubRepo>,
}

#[derive(Deserialize)]
struct ReadmeResponse {
    content: String,
}

#[derive(Deserialize)]
struct CommitEntry {
    commit: Option<CommitDetail>,
}

#[derive(Deserialize)]
struct CommitDetail {
    committer: Option<CommitSignature>,
    author: Option<CommitSignature>,
}

#[derive(Deserialize)]
struct CommitSignature {
    date: Option<DateTime<Utc>>,
}

// ─── Request plumbing ────────────────────────────────────

fn github_get(
    client: &reqwest::Client,
    config: &GithubConfig,
    path: &str,
) -> reqwest::RequestBuilder {
    let mut req = client
        .get(format!("{}{}", config.base_url, path))
        .header("Accept", "application/vnd.github.v3+json")
        .header("User-Agent", "vibcheck");
    if let Some(token) = &config.token {
        req = req.header("Authorization", format!("token {token}"));
    }
    req
}

// ─── Tier search ─────────────────────────────────────────

struct TierResult {
    repos: Vec<GithubRepo>,
    failed_queries: usize,
}

/// Run every query of one tier concurrently and merge the results by repo
/// identity, counting `query_hits` for repos seen by more than one query.
/// A failed query contributes nothing but never blocks its siblings.
async fn search_tier(
    client: &reqwest::Client,
    config: &GithubConfig,
    queries: &[String],
    min_stars: u32,
    pushed_after: &str,
) -> TierResult {
    let calls = queries.iter().map(|query| {
        let q = format!(
            "{query} in:description,readme stars:>={min_stars} pushed:>{pushed_after} -is:fork archived:false"
        );
        async move {
            let req = github_get(client, config, "/search/repositories").query(&[
                ("q", q.as_str()),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", "10"),
            ]);
            let resp = fetch_with_retry(req, &RetryConfig::default()).await?;
            if !resp.status().is_success() {
                bail!("GitHub search returned {}", resp.status());
            }
            let body: SearchResponse = resp
                .json()
                .await
                .context("invalid GitHub search response body")?;
            Ok::<_, anyhow::Error>(body.items)
        }
    });

    let mut merged: HashMap<String, GithubRepo> = HashMap::new();
    let mut failed_queries = 0;

    for result in join_all(calls).await {
        match result {
            Ok(items) => {
                for repo in items.into_iter().take(PER_QUERY_RESULTS as usize) {
                    match merged.entry(repo.full_name.clone()) {
                        Entry::Occupied(mut existing) => existing.get_mut().query_hits += 1,
                        Entry::Vacant(slot) => {
                            slot.insert(GithubRepo { query_hits: 1, ..repo });
                        }
                    }
                }
            }
            Err(e) => {
                failed_queries += 1;
                tracing::warn!("GitHub query failed: {e:#}");
            }
        }
    }

    TierResult {
        repos: merged.into_values().collect(),
        failed_queries,
    }
}

fn window_start(days: i64) -> String {
    (Utc::now() - ChronoDuration::days(days))
        .format("%Y-%m-%d")
        .to_string()
}

// ─── Public entry point ──────────────────────────────────

/// Tiered repository search.
///
/// Empty queries return `{[], Novel}` without touching the network. Returns
/// `Err` only when every query of every attempted tier failed outright, i.e.
/// the GitHub API itself was unreachable; the orchestrator uses that to
/// distinguish an infrastructure outage from a confirmed absence of prior
/// art.
pub async fn search_github(
    client: &reqwest::Client,
    config: &GithubConfig,
    queries: &[String],
    topics: &[String],
) -> Result<SearchOutcome> {
    if queries.is_empty() {
        return Ok(SearchOutcome {
            repos: Vec::new(),
            signal: EcosystemSignal::Novel,
        });
    }

    let mut all_queries: Vec<String> = queries
        .iter()
        .take(MAX_FREE_QUERIES)
        .cloned()
        .collect();
    all_queries.extend(
        topics
            .iter()
            .take(MAX_TOPIC_QUERIES)
            .map(|t| format!("topic:{t}")),
    );
    all_queries.truncate(MAX_QUERIES);
    let query_count = all_queries.len();

    let strict = search_tier(
        client,
        config,
        &all_queries,
        STRICT_MIN_STARS,
        &window_start(STRICT_WINDOW_DAYS),
    )
    .await;

    let mut repos = strict.repos;
    let mut signal = EcosystemSignal::Established;

    if repos.len() < ESTABLISHED_THRESHOLD {
        let broad = search_tier(
            client,
            config,
            &all_queries,
            BROAD_MIN_STARS,
            &window_start(BROAD_WINDOW_DAYS),
        )
        .await;

        if strict.failed_queries == query_count && broad.failed_queries == query_count {
            bail!("GitHub search unreachable: all {query_count} queries failed in both tiers");
        }

        if broad.repos.is_empty() && repos.is_empty() {
            signal = EcosystemSignal::Novel;
        } else {
            signal = EcosystemSignal::Emerging;
            // Strict entries win on key collision.
            let mut merged: HashMap<String, GithubRepo> = repos
                .into_iter()
                .map(|r| (r.full_name.clone(), r))
                .collect();
            for repo in broad.repos {
                merged.entry(repo.full_name.clone()).or_insert(repo);
            }
            repos = merged.into_values().collect();
        }
    }

    repos.sort_by(|a, b| b.stargazers_count.cmp(&a.stargazers_count));
    repos.truncate(TOP_REPOS);

    enrich(client, config, &mut repos, signal).await;

    Ok(SearchOutcome { repos, signal })
}

// ─── Enrichment (best-effort) ────────────────────────────

/// Attach README excerpts to the top repos, and for EMERGING also the latest
/// commit date and language byte counts. Each call is independent; failures
/// leave the field absent and never fail the search.
async fn enrich(
    client: &reqwest::Client,
    config: &GithubConfig,
    repos: &mut [GithubRepo],
    signal: EcosystemSignal,
) {
    let readme_limit = match signal {
        EcosystemSignal::Established => README_LIMIT_ESTABLISHED,
        _ => README_LIMIT_EMERGING,
    };
    let semaphore = Arc::new(tokio::sync::Semaphore::new(ENRICH_CONCURRENCY));

    let mut readme_tasks = Vec::new();
    for (i, repo) in repos.iter().take(readme_limit).enumerate() {
        let client = client.clone();
        let config = config.clone();
        let full_name = repo.full_name.clone();
        let sem = semaphore.clone();
        readme_tasks.push(tokio::spawn(async move {
            let _permit = sem.acquire().await;
            (i, fetch_readme(&client, &config, &full_name).await)
        }));
    }
    for task in readme_tasks {
        if let Ok((i, Some(excerpt))) = task.await {
            repos[i].readme_excerpt = Some(excerpt);
        }
    }

    if signal != EcosystemSignal::Emerging {
        return;
    }

    let mut activity_tasks = Vec::new();
    for (i, repo) in repos.iter().take(ACTIVITY_LIMIT).enumerate() {
        let client = client.clone();
        let config = config.clone();
        let full_name = repo.full_name.clone();
        let sem = semaphore.clone();
        activity_tasks.push(tokio::spawn(async move {
            let _permit = sem.acquire().await;
            let (commit_date, languages) = fetch_activity(&client, &config, &full_name).await;
            (i, commit_date, languages)
        }));
    }
    for task in activity_tasks {
        if let Ok((i, commit_date, languages)) = task.await {
            repos[i].recent_commit_date = commit_date;
            repos[i].languages = languages;
        }
    }
}

async fn fetch_readme(
    client: &reqwest::Client,
    config: &GithubConfig,
    full_name: &str,
) -> Option<String> {
    let req = github_get(client, config, &format!("/repos/{full_name}/readme"));
    let resp = fetch_with_retry(req, &RetryConfig::default()).await.ok()?;
    if !resp.status().is_success() {
        return None;
    }
    let body: ReadmeResponse = resp.json().await.ok()?;
    // The API base64-encodes the content with embedded newlines.
    let cleaned: String = body.content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .ok()?;
    Some(truncate_chars(
        &String::from_utf8_lossy(&bytes),
        README_EXCERPT_CHARS,
    ))
}

async fn fetch_activity(
    client: &reqwest::Client,
    config: &GithubConfig,
    full_name: &str,
) -> (Option<DateTime<Utc>>, Option<HashMap<String, u64>>) {
    let commits = async {
        let req = github_get(client, config, &format!("/repos/{full_name}/commits"))
            .query(&[("per_page", "1")]);
        let resp = fetch_with_retry(req, &RetryConfig::default()).await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        let entries: Vec<CommitEntry> = resp.json().await.ok()?;
        let detail = entries.into_iter().next()?.commit?;
        detail
            .committer
            .and_then(|sig| sig.date)
            .or(detail.author.and_then(|sig| sig.date))
    };

    let languages = async {
        let req = github_get(client, config, &format!("/repos/{full_name}/languages"));
        let resp = fetch_with_retry(req, &RetryConfig::default()).await.ok()?;
        if !resp.status().is_success() {
            return None;
        }
        resp.json::<HashMap<String, u64>>().await.ok()
    };

    tokio::join!(commits, languages)
}
