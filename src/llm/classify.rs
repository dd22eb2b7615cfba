use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::LlmConfig;
use crate::models::KeywordExtraction;

/// Classify an idea and extract search queries using the fast model.
pub async fn classify_idea(
    client: &reqwest::Client,
    config: &LlmConfig,
    idea: &str,
) -> Result<KeywordExtraction> {
    let prompt = build_classify_prompt(idea);

    let response = match config.provider.as_str() {
        "ollama" => call_ollama(client, config, &prompt).await?,
        "openai" => call_openai(client, config, &prompt).await?,
        other => anyhow::bail!("Unknown LLM provider: {other}"),
    };

    parse_extraction(&response)
}

fn build_classify_prompt(idea: &str) -> String {
    format!(
        "당신은 제품 아이디어 분류기입니다. 아래 아이디어를 평가하고 \
         검색 쿼리를 추출하세요.\n\n\
         아이디어: \"{idea}\"\n\n\
         classification은 다음 중 하나입니다:\n\
         - SEARCHABLE: 실현 가능하고 선행 사례를 검색할 수 있는 아이디어\n\
         - IMPOSSIBLE: 현재 기술이나 물리 법칙상 실현 불가능한 아이디어\n\
         - AMBIGUOUS: 설명이 모호해 보수적으로 검색해야 하는 아이디어\n\n\
         JSON 객체만 응답하세요. 설명을 덧붙이지 마세요:\n\
         {{\n\
           \"classification\": \"SEARCHABLE\",\n\
           \"complexity\": \"LOW | MEDIUM | HIGH | VERY_HIGH\",\n\
           \"reason\": \"분류 근거 한 문장\",\n\
           \"alternative\": \"IMPOSSIBLE일 때만, 실현 가능한 대안\",\n\
           \"github_queries\": [\"영어 검색어 2-4개\"],\n\
           \"web_queries\": {{\n\
             \"competitors\": \"경쟁 서비스 검색어\",\n\
             \"trends\": \"시장 동향 검색어\",\n\
             \"technical\": \"기술 구현 검색어\",\n\
             \"regional\": \"한국 시장 검색어 (해당 시에만)\"\n\
           }},\n\
           \"topics\": [\"github-topic-slug 0-2개\"]\n\
         }}"
    )
}

/// Extract the JSON object from a possibly chatty response.
fn parse_extraction(content: &str) -> Result<KeywordExtraction> {
    let json_str = match (content.find('{'), content.rfind('}')) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => content,
    };

    serde_json::from_str(json_str)
        .with_context(|| format!("Failed to parse classification response: {content}"))
}

// ─── Ollama ──────────────────────────────────────────────

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: Message,
}

async fn call_ollama(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
) -> Result<String> {
    let url = format!("{}/api/chat", config.base_url);

    let req = OllamaChatRequest {
        model: config.fast_model.clone(),
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        stream: false,
    };

    let resp = client
        .post(&url)
        .json(&req)
        .send()
        .await
        .context("Failed to call Ollama chat API for idea classification")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("Ollama chat API returned {status}: {body}");
    }

    let body: OllamaChatResponse = resp.json().await?;
    Ok(body.message.content)
}

// ─── OpenAI-compatible ───────────────────────────────────

#[derive(Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: String,
}

async fn call_openai(
    client: &reqwest::Client,
    config: &LlmConfig,
    prompt: &str,
) -> Result<String> {
    let url = format!("{}/v1/chat/completions", config.base_url);
    let api_key = config.api_key.as_deref().unwrap_or_default();

    let req = OpenAiChatRequest {
        model: config.fast_model.clone(),
        messages: vec![OpenAiMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        temperature: 0.3,
    };

    let resp = client
        .post(&url)
        .header("Authorization", format!("Bearer {api_key}"))
        .json(&req)
        .send()
        .await
        .context("Failed to call OpenAI chat API for idea classification")?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI chat API returned {status}: {body}");
    }

    let body: OpenAiChatResponse = resp.json().await?;
    Ok(body
        .choices
        .first()
        .map(|c| c.message.content.clone())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classification, Complexity};

    const CLEAN: &str = r#"{
        "classification": "SEARCHABLE",
        "complexity": "MEDIUM",
        "reason": "일반적인 웹 서비스 아이디어",
        "github_queries": ["photo tag generator", "image hashtag"],
        "web_queries": {
            "competitors": "photo hashtag app competitors",
            "trends": "hashtag marketing trends",
            "technical": "image tagging api"
        },
        "topics": ["hashtag-generator"]
    }"#;

    #[test]
    fn test_parse_clean_json() {
        let result = parse_extraction(CLEAN).unwrap();
        assert_eq!(result.classification, Classification::Searchable);
        assert_eq!(result.complexity, Some(Complexity::Medium));
        assert_eq!(result.github_queries.len(), 2);
        assert!(result.web_queries.regional.is_none());
    }

    #[test]
    fn test_parse_json_embedded_in_text() {
        let input = format!("알겠습니다. 분류 결과입니다:\n{CLEAN}\n도움이 되었기를 바랍니다.");
        let result = parse_extraction(&input).unwrap();
        assert_eq!(result.classification, Classification::Searchable);
    }

    #[test]
    fn test_parse_json_in_markdown_code_block() {
        let input = format!("```json\n{CLEAN}\n```");
        let result = parse_extraction(&input).unwrap();
        assert_eq!(result.topics, vec!["hashtag-generator"]);
    }

    #[test]
    fn test_parse_impossible_without_queries() {
        let input = r#"{
            "classification": "IMPOSSIBLE",
            "reason": "물리 법칙상 불가능",
            "alternative": "기록 기반 앱"
        }"#;
        let result = parse_extraction(input).unwrap();
        assert_eq!(result.classification, Classification::Impossible);
        assert_eq!(result.alternative.as_deref(), Some("기록 기반 앱"));
        assert!(result.github_queries.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_extraction("잘 모르겠습니다.").is_err());
        assert!(parse_extraction("{broken json").is_err());
    }
}
