//! Pure read operations over a snapshot of the weblog event log.
//!
//! Every function takes an explicit record slice (typically the result of
//! [`crate::WeblogLog::snapshot`]) and recomputes from scratch; nothing
//! here holds state or mutates. "No match" is a normal value (`empty` /
//! `None`), never an error.

use std::collections::HashSet;

use weblog_types::WeblogEvent;

/// Records whose trace is present and has exactly this status.
/// Records without a `trace` block are excluded.
pub fn filter_by_trace_status<'a>(
    records: &'a [WeblogEvent],
    status: &str,
) -> Vec<&'a WeblogEvent> {
    records
        .iter()
        .filter(|r| {
            r.trace
                .as_ref()
                .and_then(|t| t.status.as_deref())
                .is_some_and(|s| s == status)
        })
        .collect()
}

/// Records belonging to the named run. Exact, case-sensitive match;
/// records without a run name never match.
pub fn filter_by_run_name<'a>(
    records: &'a [WeblogEvent],
    run_name: &str,
) -> Vec<&'a WeblogEvent> {
    records
        .iter()
        .filter(|r| r.run_name.as_deref() == Some(run_name))
        .collect()
}

/// Records whose trace ran the given process, optionally narrowed to one
/// task. The process match is mandatory; passing `task_id: None` is the
/// way to match every task of the process.
pub fn filter_by_process_and_task<'a>(
    records: &'a [WeblogEvent],
    process: &str,
    task_id: Option<i64>,
) -> Vec<&'a WeblogEvent> {
    records
        .iter()
        .filter(|r| {
            let Some(trace) = r.trace.as_ref() else {
                return false;
            };
            if trace.process.as_deref() != Some(process) {
                return false;
            }
            match task_id {
                Some(id) => trace.task_id == Some(id),
                None => true,
            }
        })
        .collect()
}

/// Unique run names across all records. Records lacking a run name
/// contribute `None` as a member of the set.
pub fn distinct_run_names(records: &[WeblogEvent]) -> HashSet<Option<String>> {
    records.iter().map(|r| r.run_name.clone()).collect()
}

/// `utcTime` of the first record, in log order, matching both the run name
/// and the lifecycle event kind. "First" means first appended, not earliest
/// timestamp value. Backs both "first started" and "first completed"
/// lookups. `None` when no record matches (or the match carries no time).
pub fn first_event_time<'a>(
    records: &'a [WeblogEvent],
    run_name: &str,
    event_kind: &str,
) -> Option<&'a str> {
    records
        .iter()
        .find(|r| {
            r.run_name.as_deref() == Some(run_name) && r.event.as_deref() == Some(event_kind)
        })
        .and_then(|r| r.utc_time.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use weblog_types::decode;

    fn records() -> Vec<WeblogEvent> {
        [
            // run-level lifecycle markers, no trace at all
            r#"{"runName":"run-42","event":"started","utcTime":"t1"}"#,
            r#"{"runName":"other","event":"started","utcTime":"t1b"}"#,
            // process-level events
            r#"{"runName":"run-42","trace":{"process":"align","task_id":1,"status":"RUNNING"}}"#,
            r#"{"runName":"run-42","trace":{"process":"align","task_id":2,"status":"FAILED"}}"#,
            r#"{"runName":"run-42","trace":{"process":"quantify","task_id":3,"status":"FAILED"}}"#,
            // second "started" delivered later but with an earlier timestamp
            r#"{"runName":"run-42","event":"started","utcTime":"t0"}"#,
            r#"{"runName":"run-42","event":"completed","utcTime":"t9"}"#,
            // nameless record
            r#"{"event":"started"}"#,
        ]
        .iter()
        .map(|raw| decode(raw).unwrap())
        .collect()
    }

    #[test]
    fn test_filter_by_trace_status_excludes_traceless_records() {
        let records = records();
        let failed = filter_by_trace_status(&records, "FAILED");
        assert_eq!(failed.len(), 2);
        assert!(failed
            .iter()
            .all(|r| r.trace.as_ref().unwrap().status.as_deref() == Some("FAILED")));

        // exact match, no substring or case folding
        assert!(filter_by_trace_status(&records, "failed").is_empty());
        assert!(filter_by_trace_status(&records, "FAIL").is_empty());
    }

    #[test]
    fn test_filter_by_run_name_is_exact() {
        let records = records();
        assert_eq!(filter_by_run_name(&records, "run-42").len(), 6);
        assert_eq!(filter_by_run_name(&records, "other").len(), 1);
        assert!(filter_by_run_name(&records, "run-4").is_empty());
        assert!(filter_by_run_name(&records, "RUN-42").is_empty());
    }

    #[test]
    fn test_filter_by_process_and_task() {
        let records = records();

        let all_align = filter_by_process_and_task(&records, "align", None);
        assert_eq!(all_align.len(), 2);

        let task_2 = filter_by_process_and_task(&records, "align", Some(2));
        assert_eq!(task_2.len(), 1);
        assert_eq!(task_2[0].trace.as_ref().unwrap().task_id, Some(2));

        assert!(filter_by_process_and_task(&records, "align", Some(9)).is_empty());
        assert!(filter_by_process_and_task(&records, "trim", None).is_empty());
    }

    #[test]
    fn test_distinct_run_names_includes_absent() {
        let records = records();
        let names = distinct_run_names(&records);
        assert_eq!(names.len(), 3);
        assert!(names.contains(&Some("run-42".to_string())));
        assert!(names.contains(&Some("other".to_string())));
        assert!(names.contains(&None));
    }

    #[test]
    fn test_distinct_run_names_deduplicates() {
        let records: Vec<WeblogEvent> = ["a", "b", "a", "c"]
            .iter()
            .map(|n| decode(&format!(r#"{{"runName":"{n}"}}"#)).unwrap())
            .collect();
        let names = distinct_run_names(&records);
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_first_event_time_is_first_in_log_order() {
        let records = records();
        // t1 arrived before t0 even though t0 sorts earlier
        assert_eq!(first_event_time(&records, "run-42", "started"), Some("t1"));
        assert_eq!(first_event_time(&records, "run-42", "completed"), Some("t9"));
        assert_eq!(first_event_time(&records, "run-42", "error"), None);
        assert_eq!(first_event_time(&records, "missing", "started"), None);
    }
}
