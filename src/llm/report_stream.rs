use anyhow::{Context, Result};
use futures_util::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::time::Duration;

use crate::config::LlmConfig;

pub type ReportStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Stream the report from Ollama or OpenAI as content deltas.
pub async fn stream_report(
    client: &reqwest::Client,
    config: &LlmConfig,
    system_prompt: &str,
    user_prompt: &str,
) -> Result<ReportStream> {
    let messages = vec![
        PromptMessage {
            role: "system".to_string(),
            content: system_prompt.to_string(),
        },
        PromptMessage {
            role: "user".to_string(),
            content: user_prompt.to_string(),
        },
    ];

    match config.provider.as_str() {
        "ollama" => stream_ollama(client, config, messages).await,
        "openai" => stream_openai(client, config, messages).await,
        other => anyhow::bail!("Unsupported LLM provider for report: {other}"),
    }
}

#[derive(Serialize, Deserialize)]
struct PromptMessage {
    role: String,
    content: String,
}

// ─── Ollama streaming ────────────────────────────────────

#[derive(Serialize)]
struct OllamaStreamRequest {
    model: String,
    messages: Vec<PromptMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct OllamaStreamChunk {
    message: PromptMessage,
    done: bool,
}

async fn stream_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<PromptMessage>,
) -> Result<ReportStream> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaStreamRequest {
        model: config.chat_model.clone(),
        messages,
        stream: true,
    };

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(300))
        .json(&req)
        .send()
        .await
        .context("Failed to connect to Ollama for report streaming")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let stream = stream_lines(resp.bytes_stream()).filter_map(|line_result| async move {
        match line_result {
            Ok(line) => parse_ollama_line(&line),
            Err(e) => Some(Err(e)),
        }
    });

    Ok(Box::pin(stream))
}

/// Parse a single Ollama streaming line. Returns:
/// - Some(Ok(content)) for content deltas
/// - Some(Err(e)) for parse errors
/// - None to skip (empty content or done signal)
fn parse_ollama_line(line: &str) -> Option<Result<String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<OllamaStreamChunk>(line) {
        Ok(chunk) => {
            if chunk.done {
                return None;
            }
            let content = chunk.message.content;
            if content.is_empty() {
                return None;
            }
            Some(Ok(content))
        }
        Err(e) => Some(Err(anyhow::anyhow!("Failed to parse Ollama chunk: {e}"))),
    }
}

// ─── OpenAI streaming ────────────────────────────────────

#[derive(Serialize)]
struct OpenAiStreamRequest {
    model: String,
    messages: Vec<PromptMessage>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiStreamChunk {
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Deserialize)]
struct OpenAiStreamChoice {
    delta: OpenAiStreamDelta,
}

#[derive(Deserialize)]
struct OpenAiStreamDelta {
    content: Option<String>,
}

async fn stream_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    messages: Vec<PromptMessage>,
) -> Result<ReportStream> {
    let url = format!("{}/v1/chat/completions", config.base_url);

    let req = OpenAiStreamRequest {
        model: config.chat_model.clone(),
        messages,
        stream: true,
    };

    let resp = client
        .post(&url)
        .timeout(Duration::from_secs(300))
        .header(
            "Authorization",
            format!("Bearer {}", config.api_key.as_deref().unwrap_or("")),
        )
        .json(&req)
        .send()
        .await
        .context("Failed to connect to OpenAI for report streaming")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let stream = stream_lines(resp.bytes_stream()).filter_map(|line_result| async move {
        match line_result {
            Ok(line) => parse_openai_line(&line),
            Err(e) => Some(Err(e)),
        }
    });

    Ok(Box::pin(stream))
}

/// Parse a single OpenAI SSE line. Returns:
/// - Some(Ok(content)) for content deltas
/// - Some(Err(e)) for parse errors
/// - None to skip (empty lines, [DONE], role-only chunks)
fn parse_openai_line(line: &str) -> Option<Result<String>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let data = if let Some(d) = line.strip_prefix("data: ") {
        d.trim()
    } else {
        return None;
    };

    if data == "[DONE]" {
        return None;
    }

    match serde_json::from_str::<OpenAiStreamChunk>(data) {
        Ok(chunk) => {
            let content = chunk
                .choices
                .first()
                .and_then(|c| c.delta.content.clone())
                .unwrap_or_default();
            if content.is_empty() {
                return None;
            }
            Some(Ok(content))
        }
        Err(e) => Some(Err(anyhow::anyhow!("Failed to parse OpenAI chunk: {e}"))),
    }
}

// ─── Line buffering ──────────────────────────────────────

/// Convert a byte stream into a stream of complete lines.
fn stream_lines(
    byte_stream: impl Stream<Item = reqwest::Result<bytes::Bytes>> + Send + 'static,
) -> impl Stream<Item = Result<String>> + Send {
    futures_util::stream::unfold(
        (Box::pin(byte_stream), String::new()),
        |(mut stream, mut buffer)| async move {
            loop {
                // First, try to extract a complete line from the buffer
                if let Some(newline_pos) = buffer.find('\n') {
                    let line = buffer[..newline_pos].to_string();
                    buffer = buffer[newline_pos + 1..].to_string();
                    if !line.trim().is_empty() {
                        return Some((Ok(line), (stream, buffer)));
                    }
                    continue;
                }

                // Buffer has no complete line — read more bytes
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));
                    }
                    Some(Err(e)) => {
                        return Some((
                            Err(anyhow::anyhow!("Stream read error: {e}")),
                            (stream, buffer),
                        ));
                    }
                    None => {
                        // Stream ended — emit remaining buffer if non-empty
                        if !buffer.trim().is_empty() {
                            let remaining = std::mem::take(&mut buffer);
                            return Some((Ok(remaining), (stream, buffer)));
                        }
                        return None;
                    }
                }
            }
        },
    )
}
