//! Evidence ranking and digest assembly.
//!
//! Repos are scored with a weighted multi-factor model whose weights depend
//! on the ecosystem signal, then boosted by how many distinct queries found
//! them. The ranked evidence is flattened into a text digest for the report
//! prompt.

use chrono::Utc;
use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::models::{
    truncate_chars, EcosystemSignal, GithubRepo, RankedResults, SearchOutcome, WebResult,
};

const DIGEST_REPOS: usize = 8;
const DIGEST_SOURCES: usize = 10;
const DIGEST_DESC_CHARS: usize = 200;
const DIGEST_README_CHARS: usize = 500;

// ─── Scoring ─────────────────────────────────────────────

/// Factor weights. Each factor score is in [0, 1]; the weighted sum is
/// multiplied by the multi-query boost.
#[derive(Debug, Clone, Copy)]
struct Weights {
    stars: f64,
    recency: f64,
    relevance: f64,
    readme: f64,
    topics: f64,
    license: f64,
    commit: f64,
}

/// For EMERGING ecosystems stars mean little, so weight shifts from
/// popularity to recency and commit activity.
fn weights_for(signal: EcosystemSignal) -> Weights {
    match signal {
        EcosystemSignal::Emerging => Weights {
            stars: 0.1,
            recency: 0.3,
            relevance: 0.2,
            readme: 0.1,
            topics: 0.1,
            license: 0.05,
            commit: 0.15,
        },
        _ => Weights {
            stars: 0.25,
            recency: 0.2,
            relevance: 0.2,
            readme: 0.15,
            topics: 0.1,
            license: 0.1,
            commit: 0.0,
        },
    }
}

fn star_score(stars: u64) -> f64 {
    (((stars + 1) as f64).log10() / 5.0).min(1.0)
}

fn recency_score(repo: &GithubRepo) -> f64 {
    let days = (Utc::now() - repo.pushed_at).num_days() as f64;
    (1.0 - days / 365.0).max(0.0)
}

/// Fraction of keywords that appear in the description, case-insensitive.
fn relevance_score(repo: &GithubRepo, keywords: &[String]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }
    let description = repo
        .description
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let hits = keywords
        .iter()
        .filter(|kw| description.contains(&kw.to_lowercase()))
        .count();
    hits as f64 / keywords.len() as f64
}

fn readme_score(repo: &GithubRepo) -> f64 {
    match &repo.readme_excerpt {
        Some(excerpt) if excerpt.chars().count() > 500 => 1.0,
        Some(_) => 0.3,
        None => 0.0,
    }
}

fn commit_score(repo: &GithubRepo) -> f64 {
    let Some(date) = repo.recent_commit_date else {
        return 0.0;
    };
    let days = (Utc::now() - date).num_days();
    if days < 30 {
        1.0
    } else if days < 90 {
        0.7
    } else if days < 180 {
        0.3
    } else {
        0.0
    }
}

/// Repos surfaced by several distinct queries are more likely on-topic.
fn multi_query_boost(query_hits: u32) -> f64 {
    match query_hits {
        0 | 1 => 1.0,
        2 => 1.25,
        3 => 1.5,
        _ => 1.75,
    }
}

fn score_repo(repo: &GithubRepo, keywords: &[String], weights: &Weights) -> f64 {
    let base = weights.stars * star_score(repo.stargazers_count)
        + weights.recency * recency_score(repo)
        + weights.relevance * relevance_score(repo, keywords)
        + weights.readme * readme_score(repo)
        + weights.topics * if repo.topics.is_empty() { 0.0 } else { 1.0 }
        + weights.license * if repo.license.is_some() { 1.0 } else { 0.0 }
        + weights.commit * commit_score(repo);
    base * multi_query_boost(repo.query_hits)
}

// ─── Public entry point ──────────────────────────────────

/// Score and order the evidence, then build the prompt digest.
pub fn rank_results(
    outcome: SearchOutcome,
    web: Vec<WebResult>,
    keywords: &[String],
) -> RankedResults {
    let weights = weights_for(outcome.signal);
    let mut repos = outcome.repos;
    for repo in &mut repos {
        repo.score = Some(score_repo(repo, keywords, &weights));
    }
    repos.sort_by(|a, b| {
        b.score
            .unwrap_or(0.0)
            .partial_cmp(&a.score.unwrap_or(0.0))
            .unwrap_or(Ordering::Equal)
    });

    let digest = build_digest(&repos, &web, outcome.signal);
    RankedResults {
        repos,
        web,
        signal: outcome.signal,
        digest,
    }
}

// ─── Digest ──────────────────────────────────────────────

fn signal_narrative(signal: EcosystemSignal) -> &'static str {
    match signal {
        EcosystemSignal::Established => {
            "이 분야에는 이미 성숙한 오픈소스 생태계가 존재합니다. \
             아래 프로젝트들을 참고 자료와 경쟁 구도 분석에 활용하세요."
        }
        EcosystemSignal::Emerging => {
            "이 분야는 아직 초기 단계입니다. 발견된 프로젝트는 규모가 작고 \
             실험적일 수 있습니다.\n별 수보다 최근 활동과 커밋 빈도를 더 \
             중요하게 해석하세요."
        }
        EcosystemSignal::Novel => {
            "관련 오픈소스 프로젝트가 발견되지 않았습니다. 선행 사례가 없다는 \
             것은 기회일 수도, 수요가 없다는 신호일 수도 있습니다."
        }
        EcosystemSignal::Unknown => {
            "검색 서비스 장애로 근거를 수집하지 못했습니다. 아래 보고서는 \
             일반 지식에만 근거하며, 확신도를 0.3 이하로 제시하세요."
        }
    }
}

/// Flatten ranked evidence into the tagged text block the report prompt
/// embeds. Kept plain text so the model can quote URLs verbatim.
fn build_digest(repos: &[GithubRepo], web: &[WebResult], signal: EcosystemSignal) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<ecosystem_signal type=\"{}\">",
        signal.as_str()
    );
    out.push_str(signal_narrative(signal));
    out.push_str("\n</ecosystem_signal>\n");

    if !repos.is_empty() {
        out.push_str("\n<open_source_projects>\n");
        for repo in repos.iter().take(DIGEST_REPOS) {
            let _ = writeln!(
                out,
                "<repo url=\"{}\" stars=\"{}\" language=\"{}\" pushed=\"{}\">",
                repo.html_url,
                repo.stargazers_count,
                repo.language.as_deref().unwrap_or("unknown"),
                repo.pushed_at.format("%Y-%m-%d"),
            );
            let _ = writeln!(out, "<name>{}</name>", repo.full_name);
            if let Some(desc) = &repo.description {
                let _ = writeln!(out, "{}", truncate_chars(desc, DIGEST_DESC_CHARS));
            }
            if !repo.topics.is_empty() {
                let _ = writeln!(out, "topics: {}", repo.topics.join(", "));
            }
            if let Some(date) = repo.recent_commit_date {
                let _ = writeln!(out, "recent commit: {}", date.format("%Y-%m-%d"));
            }
            if let Some(readme) = &repo.readme_excerpt {
                let _ = writeln!(out, "readme: {}", truncate_chars(readme, DIGEST_README_CHARS));
            }
            out.push_str("</repo>\n");
        }
        out.push_str("</open_source_projects>\n");
    }

    if !web.is_empty() {
        out.push_str("\n<web_evidence>\n");
        for result in web.iter().take(DIGEST_SOURCES) {
            let _ = writeln!(
                out,
                "<source url=\"{}\" category=\"{}\" relevance=\"{:.2}\">",
                result.url,
                result.category.as_str(),
                result.score,
            );
            let _ = writeln!(out, "{}", result.title);
            let _ = writeln!(out, "{}", result.content);
            out.push_str("</source>\n");
        }
        out.push_str("</web_evidence>\n");
    }

    out
}
