//! Prompt templates for the report generator.
//!
//! The report is written in Korean for a non-developer audience; the
//! templates pin the exact section headings the server-side parser expects.

use crate::models::{Complexity, KeywordExtraction};

pub const REPORT_SYSTEM_PROMPT: &str = "\
당신은 비개발자의 제품 아이디어를 검증하는 시니어 엔지니어입니다. \
수집된 근거(오픈소스 프로젝트, 웹 자료)를 바탕으로 아이디어의 실현 \
가능성을 평가하는 보고서를 한국어로 작성하세요.

보고서는 반드시 아래 형식을 따라야 합니다:

## 판정: <다음 중 하나: 바이브코딩으로 가능 | 조건부 가능 | 개발자 도움 필요 | 현재 기술로 어려움>

**확신도:** <0과 1 사이의 숫자>

판정의 핵심 근거를 2-3문장으로 요약하세요.

## 필요한 것들

구현에 필요한 외부 서비스, API, 데이터 등을 목록으로 작성하세요.

## 유사 사례

수집된 근거에 포함된 프로젝트와 자료를 URL과 함께 인용하세요. \
근거에 없는 URL을 지어내지 마세요.

## 예상 난관

기술적·운영적 난관을 솔직하게 짚으세요.

## 첫 걸음

오늘 바로 시작할 수 있는 구체적인 첫 단계를 제안하세요.

규칙:
- 비개발자가 이해할 수 있는 쉬운 언어를 사용하세요.
- 근거에 기반해 판단하고, 근거가 약하면 확신도를 낮추세요.
- 과장하지 말고 현실적으로 평가하세요.";

pub const IMPOSSIBLE_REPORT_PROMPT: &str = "\
당신은 비개발자의 제품 아이디어를 검증하는 시니어 엔지니어입니다. \
이 아이디어는 현재 기술 수준이나 물리 법칙상 실현이 불가능하다고 \
분류되었습니다. 왜 불가능한지 쉬운 언어로 설명하고, 실현 가능한 \
대안 방향을 제안하는 보고서를 한국어로 작성하세요.

보고서는 반드시 아래 형식을 따라야 합니다:

## 판정: 현재 기술로 어려움

**확신도:** <0과 1 사이의 숫자>

왜 불가능한지 2-3문장으로 설명하세요.

## 무엇이 문제인가

불가능한 이유를 구체적으로 설명하세요.

## 대안 방향

같은 목표에 다가갈 수 있는 현실적인 대안을 제안하세요.

## 첫 걸음

대안을 시도한다면 무엇부터 시작할지 제안하세요.";

/// Assemble the user prompt for a searched idea: the idea, classifier
/// caveats, and the ranked evidence digest.
pub fn build_analysis_user_prompt(
    idea: &str,
    extraction: &KeywordExtraction,
    digest: &str,
) -> String {
    let mut prompt = format!("<user_idea>\n{idea}\n</user_idea>\n");

    match extraction.complexity {
        Some(Complexity::High) | Some(Complexity::VeryHigh) => {
            prompt.push_str(
                "\n주의: 이 아이디어는 구현 난이도가 높게 평가되었습니다. \
                 판정과 확신도에 반영하세요.\n",
            );
        }
        _ => {}
    }

    if extraction.classification == crate::models::Classification::Ambiguous {
        prompt.push_str(
            "\n주의: 아이디어 설명이 모호해 검색 근거가 정확하지 않을 수 \
             있습니다. 보고서에서 이를 언급하세요.\n",
        );
    }

    prompt.push_str("\n<evidence>\n");
    prompt.push_str(digest);
    prompt.push_str("</evidence>\n");
    prompt.push_str(
        "\n위 근거를 바탕으로 형식에 맞는 검증 보고서를 작성하세요. \
         근거에 있는 URL만 인용하세요.",
    );
    prompt
}

/// User prompt for an idea classified as impossible. The classifier's
/// reason (and alternative, when present) replaces the evidence digest.
pub fn build_impossible_user_prompt(idea: &str, extraction: &KeywordExtraction) -> String {
    let mut prompt = format!(
        "<user_idea>\n{idea}\n</user_idea>\n\n불가능 판정 사유: {}\n",
        extraction.reason
    );
    if let Some(alternative) = &extraction.alternative {
        prompt.push_str(&format!("제안된 대안 방향: {alternative}\n"));
    }
    prompt.push_str("\n위 내용을 바탕으로 형식에 맞는 보고서를 작성하세요.");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classification, WebQueries};

    fn extraction(classification: Classification, complexity: Option<Complexity>) -> KeywordExtraction {
        KeywordExtraction {
            classification,
            complexity,
            reason: "이유".to_string(),
            alternative: None,
            github_queries: Vec::new(),
            web_queries: WebQueries::default(),
            topics: Vec::new(),
        }
    }

    #[test]
    fn test_analysis_prompt_embeds_idea_and_digest() {
        let prompt = build_analysis_user_prompt(
            "사진 해시태그 추천 앱",
            &extraction(Classification::Searchable, Some(Complexity::Low)),
            "<ecosystem_signal type=\"NOVEL\">...</ecosystem_signal>",
        );
        assert!(prompt.contains("<user_idea>\n사진 해시태그 추천 앱\n</user_idea>"));
        assert!(prompt.contains("<evidence>"));
        assert!(prompt.contains("NOVEL"));
        assert!(!prompt.contains("난이도가 높게"));
    }

    #[test]
    fn test_high_complexity_adds_warning() {
        let prompt = build_analysis_user_prompt(
            "idea",
            &extraction(Classification::Searchable, Some(Complexity::VeryHigh)),
            "",
        );
        assert!(prompt.contains("난이도가 높게"));
    }

    #[test]
    fn test_ambiguous_adds_caution() {
        let prompt = build_analysis_user_prompt(
            "idea",
            &extraction(Classification::Ambiguous, None),
            "",
        );
        assert!(prompt.contains("모호해"));
    }

    #[test]
    fn test_impossible_prompt_includes_alternative() {
        let mut ex = extraction(Classification::Impossible, None);
        ex.alternative = Some("예측 대신 기록 앱".to_string());
        let prompt = build_impossible_user_prompt("미래 예측 앱", &ex);
        assert!(prompt.contains("불가능 판정 사유: 이유"));
        assert!(prompt.contains("예측 대신 기록 앱"));
    }
}
