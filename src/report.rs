//! Server-side parsing of the generated markdown report.
//!
//! The report is split into `## ` sections; the verdict section carries a
//! labeled heading and a confidence line that are extracted into structured
//! metadata for the client.

use serde::{Deserialize, Serialize};

const VERDICT_PREFIX: &str = "## 판정:";
const CONFIDENCE_KEY: &str = "확신도:";

/// Closed set of feasibility verdicts the report may state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "바이브코딩으로 가능")]
    Feasible,
    #[serde(rename = "조건부 가능")]
    Conditional,
    #[serde(rename = "개발자 도움 필요")]
    NeedsDeveloper,
    #[serde(rename = "현재 기술로 어려움")]
    Infeasible,
}

impl Verdict {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "바이브코딩으로 가능" => Some(Verdict::Feasible),
            "조건부 가능" => Some(Verdict::Conditional),
            "개발자 도움 필요" => Some(Verdict::NeedsDeveloper),
            "현재 기술로 어려움" => Some(Verdict::Infeasible),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Feasible => "바이브코딩으로 가능",
            Verdict::Conditional => "조건부 가능",
            Verdict::NeedsDeveloper => "개발자 도움 필요",
            Verdict::Infeasible => "현재 기술로 어려움",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    pub heading: String,
    pub content: String,
    pub is_verdict: bool,
}

/// Structured metadata extracted from the full report text.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub sections: Vec<ReportSection>,
}

/// Split the report into sections and pull out verdict + confidence.
///
/// Tolerant by construction: an unknown verdict label or an out-of-range
/// confidence leaves the corresponding field `None` rather than failing.
pub fn parse_report(text: &str) -> ReportMeta {
    let mut sections = Vec::new();
    let mut heading = String::new();
    let mut body: Vec<&str> = Vec::new();

    let mut flush = |heading: &mut String, body: &mut Vec<&str>, sections: &mut Vec<ReportSection>| {
        let content = body.join("\n").trim().to_string();
        if !heading.is_empty() || !content.is_empty() {
            sections.push(ReportSection {
                is_verdict: heading.starts_with(VERDICT_PREFIX),
                heading: std::mem::take(heading),
                content,
            });
        }
        body.clear();
    };

    for line in text.lines() {
        if line.starts_with("## ") {
            flush(&mut heading, &mut body, &mut sections);
            heading = line.to_string();
        } else {
            body.push(line);
        }
    }
    flush(&mut heading, &mut body, &mut sections);

    // Even empty input produces one well-formed (empty) section.
    if sections.is_empty() {
        sections.push(ReportSection {
            heading: String::new(),
            content: String::new(),
            is_verdict: false,
        });
    }

    let verdict_section = sections.iter().find(|s| s.is_verdict);

    let verdict = verdict_section
        .and_then(|s| Verdict::from_label(s.heading.strip_prefix(VERDICT_PREFIX)?.trim()));

    // Confidence only counts inside the verdict section.
    let confidence = verdict_section.and_then(|s| extract_confidence(&s.content));

    ReportMeta {
        verdict,
        confidence,
        sections,
    }
}

/// Find the confidence line in the given section content and parse the
/// first numeric token after the key. Only values inside [0, 1] are
/// meaningful.
fn extract_confidence(text: &str) -> Option<f64> {
    let line = text.lines().find(|l| l.contains(CONFIDENCE_KEY))?;
    let after = &line[line.find(CONFIDENCE_KEY)? + CONFIDENCE_KEY.len()..];
    let value: f64 = after
        .replace('*', "")
        .split_whitespace()
        .next()?
        .parse()
        .ok()?;
    (0.0..=1.0).contains(&value).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
## 판정: 조건부 가능

**확신도:** 0.3

핵심 기능은 구현 가능하지만 외부 API 연동이 필요합니다.

## 필요한 것들

- 외부 이미지 분석 API
- 호스팅 환경

## 유사 사례

기존 프로젝트 3건이 발견되었습니다.

## 예상 난관

API 비용과 속도 제한.

## 첫 걸음

프로토타입부터 시작하세요.
";

    #[test]
    fn test_parses_full_report() {
        let meta = parse_report(SAMPLE);
        assert_eq!(meta.verdict, Some(Verdict::Conditional));
        assert_eq!(meta.confidence, Some(0.3));
        assert_eq!(meta.sections.len(), 5);
        assert!(meta.sections[0].is_verdict);
        assert!(!meta.sections[1].is_verdict);
        assert!(meta.sections[0].content.contains("핵심 기능"));
        assert_eq!(meta.sections[4].heading, "## 첫 걸음");
    }

    #[test]
    fn test_confidence_boundaries_valid() {
        assert_eq!(extract_confidence("확신도: 0"), Some(0.0));
        assert_eq!(extract_confidence("확신도: 1"), Some(1.0));
        assert_eq!(extract_confidence("**확신도:** 0.85"), Some(0.85));
    }

    #[test]
    fn test_confidence_out_of_range_rejected() {
        assert_eq!(extract_confidence("확신도: 1.5"), None);
        assert_eq!(extract_confidence("확신도: -0.1"), None);
        assert_eq!(extract_confidence("확신도: 높음"), None);
        assert_eq!(extract_confidence("no key here"), None);
    }

    #[test]
    fn test_unknown_verdict_label_is_none() {
        let meta = parse_report("## 판정: 아마도 가능\n\n내용");
        assert_eq!(meta.verdict, None);
        assert!(meta.sections[0].is_verdict);
    }

    #[test]
    fn test_headingless_text_is_single_section() {
        let meta = parse_report("머리글 없는 본문입니다.\n두 번째 줄.");
        assert_eq!(meta.sections.len(), 1);
        assert!(meta.sections[0].heading.is_empty());
        assert_eq!(meta.verdict, None);
    }

    #[test]
    fn test_empty_input_yields_one_empty_section() {
        let meta = parse_report("");
        assert_eq!(meta.sections.len(), 1);
        assert!(meta.sections[0].heading.is_empty());
        assert!(meta.sections[0].content.is_empty());
        assert!(!meta.sections[0].is_verdict);
        assert_eq!(meta.verdict, None);
        assert_eq!(meta.confidence, None);
    }

    #[test]
    fn test_confidence_without_verdict_section_ignored() {
        let meta = parse_report("머리글 없는 본문\n확신도: 0.9\n");
        assert_eq!(meta.verdict, None);
        assert_eq!(meta.confidence, None);
    }

    #[test]
    fn test_confidence_outside_verdict_section_ignored() {
        let report = "\
## 판정: 조건부 가능

근거 요약.

## 기타

확신도: 0.9
";
        let meta = parse_report(report);
        assert_eq!(meta.verdict, Some(Verdict::Conditional));
        assert_eq!(meta.confidence, None);
    }

    #[test]
    fn test_verdict_labels_round_trip() {
        for verdict in [
            Verdict::Feasible,
            Verdict::Conditional,
            Verdict::NeedsDeveloper,
            Verdict::Infeasible,
        ] {
            assert_eq!(Verdict::from_label(verdict.as_str()), Some(verdict));
            let json = serde_json::to_string(&verdict).unwrap();
            assert_eq!(json.trim_matches('"'), verdict.as_str());
        }
    }
}
