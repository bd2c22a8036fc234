//! Nextflow weblog message types shared between the ingestion client and
//! any consumer of the event buffer.
//!
//! A weblog message is a JSON object emitted once per workflow lifecycle
//! event. Every field is optional: absence is meaningful (a trace-less
//! lifecycle marker, a run without a name) and is never an error. The only
//! hard requirement, enforced by [`decode`], is that the payload is a JSON
//! object.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Event Record
// ============================================================================

/// One decoded weblog message - the unit stored in the event log.
///
/// Records are immutable after decoding; the event log appends them in
/// arrival order and never rewrites them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeblogEvent {
    /// Name of the pipeline run this event belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_name: Option<String>,

    /// Unique id of the run (stable across events of one run).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// Lifecycle marker, e.g. "started" or "completed".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,

    /// ISO-8601 timestamp string attached by the producer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utc_time: Option<String>,

    /// Per-task trace details; only present on process-level events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<WeblogTrace>,

    /// Workflow parameters and manifest; only appears on completion messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<WeblogMetadata>,
}

impl WeblogEvent {
    /// Parse `utcTime` as an RFC 3339 timestamp.
    ///
    /// Returns `None` when the field is absent or not parseable; the raw
    /// string stays available in [`WeblogEvent::utc_time`] either way.
    pub fn utc_time_parsed(&self) -> Option<DateTime<Utc>> {
        self.utc_time
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Trace block of a process-level weblog message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeblogTrace {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<i64>,

    /// Trace execution status, e.g. "RUNNING", "COMPLETED", "FAILED".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,

    /// Display name, e.g. "align (3)" for the third instance of "align".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// POSIX process exit status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complete: Option<i64>,

    /// Stage/process identifier, e.g. "align".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_id: Option<i64>,
}

impl WeblogTrace {
    /// Instance index of this task within its process, parsed from the
    /// parenthesised suffix of `name` ("align (3)" -> 3). Returns 0 for
    /// single-instance processes or unparseable names.
    pub fn nth_process(&self) -> i64 {
        let Some(name) = self.name.as_deref() else {
            return 0;
        };
        let (Some(open), Some(close)) = (name.find('('), name.rfind(')')) else {
            return 0;
        };
        if open + 1 >= close {
            return 0;
        }
        name[open + 1..close].trim().parse().unwrap_or(0)
    }
}

/// Metadata block of a run-completion weblog message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeblogMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow: Option<serde_json::Value>,
}

// ============================================================================
// Decode Boundary
// ============================================================================

/// Why a raw payload was rejected before reaching the event log.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is valid JSON but not an object (got {0})")]
    NotAnObject(&'static str),
}

/// Decode one raw transport payload into a [`WeblogEvent`].
///
/// Accepts any JSON object; unknown fields are ignored, missing fields stay
/// absent. Rejects everything else with a [`DecodeError`]. A rejected
/// payload must simply be dropped by the caller - it never enters the log.
pub fn decode(raw: &str) -> Result<WeblogEvent, DecodeError> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(DecodeError::NotAnObject(json_kind(&value)));
    }
    Ok(serde_json::from_value(value)?)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

// ============================================================================
// Constants
// ============================================================================

/// Lifecycle event kinds emitted by the weblog producer.
pub const EVENT_STARTED: &str = "started";
pub const EVENT_PROCESS_SUBMITTED: &str = "process_submitted";
pub const EVENT_PROCESS_STARTED: &str = "process_started";
pub const EVENT_PROCESS_COMPLETED: &str = "process_completed";
pub const EVENT_ERROR: &str = "error";
pub const EVENT_COMPLETED: &str = "completed";

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_message() {
        let raw = r#"{
            "runName": "hungry_pike",
            "runId": "a1b2c3",
            "event": "process_completed",
            "utcTime": "2024-05-02T11:22:33Z",
            "trace": {
                "task_id": 7,
                "status": "COMPLETED",
                "name": "align (2)",
                "process": "align",
                "exit": 0,
                "attempt": 1
            }
        }"#;

        let event = decode(raw).unwrap();
        assert_eq!(event.run_name.as_deref(), Some("hungry_pike"));
        assert_eq!(event.run_id.as_deref(), Some("a1b2c3"));
        assert_eq!(event.event.as_deref(), Some(EVENT_PROCESS_COMPLETED));
        let trace = event.trace.as_ref().unwrap();
        assert_eq!(trace.task_id, Some(7));
        assert_eq!(trace.status.as_deref(), Some("COMPLETED"));
        assert_eq!(trace.process.as_deref(), Some("align"));
        assert_eq!(trace.exit, Some(0));
    }

    #[test]
    fn test_decode_missing_fields_stay_absent() {
        let event = decode(r#"{"event":"started"}"#).unwrap();
        assert_eq!(event.event.as_deref(), Some("started"));
        assert!(event.run_name.is_none());
        assert!(event.utc_time.is_none());
        assert!(event.trace.is_none());
        assert!(event.metadata.is_none());
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let event = decode(r#"{"runName":"r1","somethingNew":42}"#).unwrap();
        assert_eq!(event.run_name.as_deref(), Some("r1"));
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_decode_rejects_non_object_json() {
        for (raw, kind) in [
            ("42", "number"),
            ("[1,2]", "array"),
            ("\"hello\"", "string"),
            ("null", "null"),
            ("true", "bool"),
        ] {
            match decode(raw).unwrap_err() {
                DecodeError::NotAnObject(got) => assert_eq!(got, kind),
                other => panic!("expected NotAnObject for {raw}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_utc_time_parsed() {
        let event = decode(r#"{"utcTime":"2024-05-02T11:22:33Z"}"#).unwrap();
        let parsed = event.utc_time_parsed().unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-05-02T11:22:33+00:00");

        let bad = decode(r#"{"utcTime":"yesterday"}"#).unwrap();
        assert!(bad.utc_time_parsed().is_none());
        assert_eq!(bad.utc_time.as_deref(), Some("yesterday"));
    }

    #[test]
    fn test_nth_process() {
        let trace = |name: Option<&str>| WeblogTrace {
            name: name.map(ToString::to_string),
            task_id: None,
            status: None,
            hash: None,
            exit: None,
            submit: None,
            start: None,
            complete: None,
            process: None,
            duration: None,
            tag: None,
            attempt: None,
            native_id: None,
        };

        assert_eq!(trace(Some("align (3)")).nth_process(), 3);
        assert_eq!(trace(Some("align")).nth_process(), 0);
        assert_eq!(trace(Some("align ()")).nth_process(), 0);
        assert_eq!(trace(Some("align (x)")).nth_process(), 0);
        assert_eq!(trace(None).nth_process(), 0);
    }

    #[test]
    fn test_event_serialization_roundtrip() {
        let event = decode(r#"{"runName":"r1","event":"started","utcTime":"t0"}"#).unwrap();
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("runName"));
        assert!(json.contains("utcTime"));
        let back: WeblogEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}
