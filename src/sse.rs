//! Wire envelope for the analysis event stream.
//!
//! Every frame is `data: <json>\n\n` where the JSON is a tagged envelope,
//! except the final sentinel frame `data: [DONE]\n\n` which closes every
//! stream, error or not.

use serde::{Deserialize, Serialize};

pub const DONE_SENTINEL: &str = "[DONE]";

/// Pipeline stages reported to the client, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStep {
    Classify,
    CodeSearch,
    WebSearch,
    Rank,
    Report,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Started,
    Completed,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressData {
    pub step: ProgressStep,
    pub status: ProgressStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Tagged event envelope, `{"type": ..., "data": ...}` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum SseEvent {
    Progress(ProgressData),
    Text(String),
    DataChunk(serde_json::Value),
    Context(String),
    Error(String),
}

impl SseEvent {
    pub fn progress(step: ProgressStep, status: ProgressStatus) -> Self {
        SseEvent::Progress(ProgressData {
            step,
            status,
            detail: None,
        })
    }

    pub fn progress_detail(step: ProgressStep, status: ProgressStatus, detail: String) -> Self {
        SseEvent::Progress(ProgressData {
            step,
            status,
            detail: Some(detail),
        })
    }
}

/// A frame as sent over the channel: either an event or the terminator.
#[derive(Debug, Clone, PartialEq)]
pub enum SseMessage {
    Event(SseEvent),
    Done,
}

impl SseMessage {
    /// Payload for the `data:` field of the frame.
    pub fn payload(&self) -> String {
        match self {
            // Envelope serialization cannot fail: no non-string map keys,
            // no non-serializable types.
            SseMessage::Event(event) => {
                serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
            }
            SseMessage::Done => DONE_SENTINEL.to_string(),
        }
    }
}

pub fn encode(event: &SseEvent) -> String {
    format!("data: {}\n\n", SseMessage::Event(event.clone()).payload())
}

pub fn encode_done() -> String {
    format!("data: {DONE_SENTINEL}\n\n")
}

/// Parse one `data: ...` line back into a message. Non-data lines and
/// unparseable payloads yield `None`.
pub fn decode_line(line: &str) -> Option<SseMessage> {
    let payload = line.trim_end().strip_prefix("data: ")?;
    if payload == DONE_SENTINEL {
        return Some(SseMessage::Done);
    }
    serde_json::from_str(payload).ok().map(SseMessage::Event)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_wire_shape() {
        let event = SseEvent::progress_detail(
            ProgressStep::CodeSearch,
            ProgressStatus::Completed,
            "3개 프로젝트 발견".to_string(),
        );
        let json: serde_json::Value = serde_json::from_str(&SseMessage::Event(event).payload()).unwrap();
        assert_eq!(json["type"], "progress");
        assert_eq!(json["data"]["step"], "code-search");
        assert_eq!(json["data"]["status"], "completed");
        assert_eq!(json["data"]["detail"], "3개 프로젝트 발견");
    }

    #[test]
    fn test_progress_omits_absent_detail() {
        let event = SseEvent::progress(ProgressStep::Rank, ProgressStatus::Started);
        let payload = SseMessage::Event(event).payload();
        assert!(!payload.contains("detail"));
    }

    #[test]
    fn test_round_trip_all_variants() {
        let events = vec![
            SseEvent::progress(ProgressStep::Classify, ProgressStatus::Started),
            SseEvent::Text("chunk".to_string()),
            SseEvent::DataChunk(serde_json::json!({"confidence": 0.3})),
            SseEvent::Context("digest".to_string()),
            SseEvent::Error("boom".to_string()),
        ];
        for event in events {
            let line = encode(&event);
            let back = decode_line(&line).unwrap();
            assert_eq!(back, SseMessage::Event(event));
        }
    }

    #[test]
    fn test_done_frame() {
        assert_eq!(encode_done(), "data: [DONE]\n\n");
        assert_eq!(decode_line("data: [DONE]"), Some(SseMessage::Done));
    }

    #[test]
    fn test_garbage_lines_ignored() {
        assert_eq!(decode_line("event: ping"), None);
        assert_eq!(decode_line("data: {not json"), None);
        assert_eq!(decode_line(""), None);
    }
}
