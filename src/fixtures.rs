//! Deterministic fallbacks used when the LLM is unavailable.

use crate::models::{Classification, Complexity, KeywordExtraction, WebQueries};

/// Classifier fallback: treat the idea as ambiguous-but-searchable and
/// derive naive queries from the idea text itself.
pub fn fallback_extraction(idea: &str) -> KeywordExtraction {
    let queries: Vec<String> = idea
        .split_whitespace()
        .filter(|word| word.chars().count() > 1)
        .take(3)
        .map(str::to_string)
        .collect();

    KeywordExtraction {
        classification: Classification::Ambiguous,
        complexity: Some(Complexity::Medium),
        reason: "아이디어 분류 서비스를 사용할 수 없어 기본 검색으로 진행합니다."
            .to_string(),
        alternative: None,
        github_queries: queries,
        web_queries: WebQueries {
            competitors: idea.to_string(),
            trends: idea.to_string(),
            technical: idea.to_string(),
            regional: Some(idea.to_string()),
        },
        topics: Vec::new(),
    }
}

/// Report fallback: a complete, parseable report stating that generation
/// was unavailable. Confidence is deliberately low.
pub fn fallback_report(idea: &str) -> String {
    format!(
        "## 판정: 조건부 가능

**확신도:** 0.3

보고서 생성 서비스를 사용할 수 없어 제한된 평가만 제공합니다. \
아래 내용은 일반적인 지침이며, 수집된 근거를 반영하지 못했습니다.

## 필요한 것들

- \"{idea}\" 아이디어를 한 문장으로 더 구체화한 설명
- 핵심 기능 한 가지를 검증할 수 있는 최소 프로토타입

## 유사 사례

근거 수집 결과를 확인할 수 없었습니다. 직접 GitHub와 검색 엔진에서 \
유사 서비스를 찾아보세요.

## 예상 난관

외부 서비스 연동, 운영 비용, 사용자 확보가 일반적인 난관입니다.

## 첫 걸음

아이디어의 핵심 기능 하나를 골라 하루 안에 만들 수 있는 가장 작은 \
버전을 정의해 보세요."
    )
}
