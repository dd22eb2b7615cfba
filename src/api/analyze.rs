use std::convert::Infallible;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::Json;
use futures_util::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc;

use crate::cache::{classify_cache_key, github_cache_key, web_cache_key};
use crate::fixtures::{fallback_extraction, fallback_report};
use crate::llm::classify::classify_idea;
use crate::llm::report_stream::stream_report;
use crate::models::{
    truncate_chars, AnalyzeRequest, Classification, EcosystemSignal, KeywordExtraction,
    SearchOutcome,
};
use crate::prompts::{
    build_analysis_user_prompt, build_impossible_user_prompt, IMPOSSIBLE_REPORT_PROMPT,
    REPORT_SYSTEM_PROMPT,
};
use crate::rank::rank_results;
use crate::report::parse_report;
use crate::search::github::search_github;
use crate::search::web::search_web;
use crate::sse::{ProgressStatus, ProgressStep, SseEvent, SseMessage};
use crate::state::AppState;

const MAX_IDEA_CHARS: usize = 2000;
const CHANNEL_CAPACITY: usize = 32;

/// POST /api/analyze — run the analysis pipeline, streaming progress and
/// the report over SSE. Every stream ends with the `[DONE]` frame.
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    // ── Step 1: Validate input ────────────────────────────
    let idea = req.idea.trim().to_string();
    if idea.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Idea is required".to_string()));
    }
    let idea = truncate_chars(&idea, MAX_IDEA_CHARS);

    // ── Step 2: Acquire semaphore ─────────────────────────
    let permit = state
        .analyze_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Analysis service at capacity".to_string(),
            )
        })?;

    // ── Step 3: Run the pipeline in a task ────────────────
    let (tx, rx) = mpsc::channel::<SseMessage>(CHANNEL_CAPACITY);
    tokio::spawn(run_pipeline(state, idea, tx));

    // ── Step 4: Drain the channel as SSE frames ───────────
    let event_stream = stream::unfold(rx, |mut rx| async move {
        let msg = rx.recv().await?;
        let event: Result<Event, Infallible> = Ok(Event::default().data(msg.payload()));
        Some((event, rx))
    });

    // Hold the semaphore permit for the lifetime of the stream
    let event_stream = event_stream.map(move |event| {
        let _permit = &permit;
        event
    });

    Ok(Sse::new(event_stream))
}

// ─── Pipeline ────────────────────────────────────────────

async fn send(tx: &mpsc::Sender<SseMessage>, event: SseEvent) {
    // A send error means the client disconnected; the pipeline keeps
    // running so caches still get populated.
    let _ = tx.send(SseMessage::Event(event)).await;
}

async fn progress(tx: &mpsc::Sender<SseMessage>, step: ProgressStep, status: ProgressStatus) {
    send(tx, SseEvent::progress(step, status)).await;
}

async fn progress_detail(
    tx: &mpsc::Sender<SseMessage>,
    step: ProgressStep,
    status: ProgressStatus,
    detail: String,
) {
    send(tx, SseEvent::progress_detail(step, status, detail)).await;
}

async fn run_pipeline(state: AppState, idea: String, tx: mpsc::Sender<SseMessage>) {
    // ── Classify ──────────────────────────────────────────
    progress(&tx, ProgressStep::Classify, ProgressStatus::Started).await;
    let extraction = classify(&state, &idea).await;
    progress_detail(
        &tx,
        ProgressStep::Classify,
        ProgressStatus::Completed,
        format!("분류: {}", extraction.classification.as_str()),
    )
    .await;

    if extraction.classification == Classification::Impossible {
        run_impossible(&state, &idea, &extraction, &tx).await;
        let _ = tx.send(SseMessage::Done).await;
        return;
    }

    // ── Search both sources concurrently ──────────────────
    progress(&tx, ProgressStep::CodeSearch, ProgressStatus::Started).await;
    progress(&tx, ProgressStep::WebSearch, ProgressStatus::Started).await;

    let (github_result, web_result) = tokio::join!(
        cached_github_search(&state, &extraction),
        cached_web_search(&state, &extraction),
    );

    let web_failed = web_result.is_err();

    let outcome = match github_result {
        Ok(outcome) => {
            progress_detail(
                &tx,
                ProgressStep::CodeSearch,
                ProgressStatus::Completed,
                format!(
                    "{}개 프로젝트 발견 ({})",
                    outcome.repos.len(),
                    outcome.signal.as_str()
                ),
            )
            .await;
            outcome
        }
        Err(e) => {
            tracing::warn!("GitHub search failed: {e:#}");
            progress_detail(
                &tx,
                ProgressStep::CodeSearch,
                ProgressStatus::Error,
                "코드 검색에 실패했습니다".to_string(),
            )
            .await;
            // Both sources down means no evidence at all, which must not
            // read as "searched and found nothing".
            let signal = if web_failed {
                EcosystemSignal::Unknown
            } else {
                EcosystemSignal::Novel
            };
            SearchOutcome {
                repos: Vec::new(),
                signal,
            }
        }
    };

    let web = match web_result {
        Ok(web) => {
            progress_detail(
                &tx,
                ProgressStep::WebSearch,
                ProgressStatus::Completed,
                format!("{}개 웹 자료 수집", web.len()),
            )
            .await;
            web
        }
        Err(e) => {
            tracing::warn!("Web search failed: {e:#}");
            progress_detail(
                &tx,
                ProgressStep::WebSearch,
                ProgressStatus::Error,
                "웹 검색에 실패했습니다".to_string(),
            )
            .await;
            Vec::new()
        }
    };

    // ── Rank ──────────────────────────────────────────────
    progress(&tx, ProgressStep::Rank, ProgressStatus::Started).await;
    let keywords: Vec<String> = extraction
        .github_queries
        .iter()
        .flat_map(|q| q.split_whitespace())
        .map(str::to_string)
        .collect();
    let ranked = rank_results(outcome, web, &keywords);
    progress(&tx, ProgressStep::Rank, ProgressStatus::Completed).await;

    // ── Report ────────────────────────────────────────────
    progress(&tx, ProgressStep::Report, ProgressStatus::Started).await;
    let user_prompt = build_analysis_user_prompt(&idea, &extraction, &ranked.digest);
    let report = stream_report_text(&state, REPORT_SYSTEM_PROMPT, &user_prompt, &idea, &tx).await;
    progress(&tx, ProgressStep::Report, ProgressStatus::Completed).await;

    send_report_meta(&report, &tx).await;
    send(&tx, SseEvent::Context(ranked.digest)).await;
    let _ = tx.send(SseMessage::Done).await;
}

/// Pipeline tail for IMPOSSIBLE ideas: no evidence is gathered, the report
/// explains why and suggests alternatives.
async fn run_impossible(
    state: &AppState,
    idea: &str,
    extraction: &KeywordExtraction,
    tx: &mpsc::Sender<SseMessage>,
) {
    for step in [
        ProgressStep::CodeSearch,
        ProgressStep::WebSearch,
        ProgressStep::Rank,
    ] {
        progress_detail(
            tx,
            step,
            ProgressStatus::Completed,
            "검색 생략".to_string(),
        )
        .await;
    }

    progress(tx, ProgressStep::Report, ProgressStatus::Started).await;
    let user_prompt = build_impossible_user_prompt(idea, extraction);
    let report = stream_report_text(state, IMPOSSIBLE_REPORT_PROMPT, &user_prompt, idea, tx).await;
    progress(tx, ProgressStep::Report, ProgressStatus::Completed).await;

    send_report_meta(&report, tx).await;
    send(tx, SseEvent::Context(String::new())).await;
}

// ─── Stage helpers ───────────────────────────────────────

async fn classify(state: &AppState, idea: &str) -> KeywordExtraction {
    let key = classify_cache_key(idea);
    if let Some(hit) = state.classify_cache.get(&key) {
        return hit;
    }

    match classify_idea(&state.http_client, &state.config.llm, idea).await {
        Ok(extraction) => {
            state.classify_cache.set(&key, extraction.clone());
            extraction
        }
        Err(e) => {
            tracing::warn!("Classification failed, using fallback: {e:#}");
            fallback_extraction(idea)
        }
    }
}

async fn cached_github_search(
    state: &AppState,
    extraction: &KeywordExtraction,
) -> anyhow::Result<SearchOutcome> {
    let key = github_cache_key(&extraction.github_queries, &extraction.topics);
    if let Some(hit) = state.github_cache.get(&key) {
        return Ok(hit);
    }
    let outcome = search_github(
        &state.http_client,
        &state.config.github,
        &extraction.github_queries,
        &extraction.topics,
    )
    .await?;
    state.github_cache.set(&key, outcome.clone());
    Ok(outcome)
}

async fn cached_web_search(
    state: &AppState,
    extraction: &KeywordExtraction,
) -> anyhow::Result<Vec<crate::models::WebResult>> {
    let key = web_cache_key(&extraction.web_queries);
    if let Some(hit) = state.web_cache.get(&key) {
        return Ok(hit);
    }
    let results = search_web(&state.http_client, &state.config.tavily, &extraction.web_queries).await?;
    state.web_cache.set(&key, results.clone());
    Ok(results)
}

/// Stream the report, forwarding deltas as Text events, and return the full
/// accumulated text. A stream that fails to start or produces nothing falls
/// back to the canned report so the client always receives one.
async fn stream_report_text(
    state: &AppState,
    system_prompt: &str,
    user_prompt: &str,
    idea: &str,
    tx: &mpsc::Sender<SseMessage>,
) -> String {
    let mut full = String::new();

    match stream_report(&state.http_client, &state.config.llm, system_prompt, user_prompt).await {
        Ok(mut stream) => {
            while let Some(chunk) = stream.next().await {
                match chunk {
                    Ok(content) => {
                        full.push_str(&content);
                        send(tx, SseEvent::Text(content)).await;
                    }
                    Err(e) => {
                        tracing::warn!("Report stream error: {e:#}");
                        send(
                            tx,
                            SseEvent::Error("보고서 생성 중 오류가 발생했습니다".to_string()),
                        )
                        .await;
                        break;
                    }
                }
            }
        }
        Err(e) => {
            tracing::warn!("Report stream failed to start: {e:#}");
        }
    }

    if full.trim().is_empty() {
        let fallback = fallback_report(idea);
        send(tx, SseEvent::Text(fallback.clone())).await;
        full = fallback;
    }

    full
}

async fn send_report_meta(report: &str, tx: &mpsc::Sender<SseMessage>) {
    let meta = parse_report(report);
    match serde_json::to_value(&meta) {
        Ok(value) => {
            send(tx, SseEvent::DataChunk(serde_json::json!({ "report_meta": value }))).await;
        }
        Err(e) => tracing::warn!("Failed to serialize report metadata: {e}"),
    }
}
