//! Formatting of progress lines and run outcomes for the terminal.

use maestro::{RunSummary, WorkflowOutcome};
use serde_json::{json, Value};

/// Progress lines longer than this are cut for display.
const PROGRESS_MAX_LEN: usize = 120;

/// Truncates a string to at most `max` chars; appends "..." when truncated. UTF-8 safe.
pub fn truncate_display(s: &str, max: usize) -> String {
    const SUFFIX: &str = "...";
    let suffix_len = 3;
    if max <= suffix_len {
        return s.chars().take(max).collect();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    format!("{}{}", s.chars().take(max - suffix_len).collect::<String>(), SUFFIX)
}

/// One progress line as printed on stderr.
pub fn format_progress(line: &str) -> String {
    format!("  > {}", truncate_display(line, PROGRESS_MAX_LEN))
}

/// Machine-readable result of `maestro run --json`.
pub fn format_outcome_json(requirements: &str, progress: &[String], outcome: &WorkflowOutcome) -> Value {
    json!({
        "requirements": requirements,
        "progress": progress,
        "final_message": outcome.final_message,
        "error": outcome.result.as_ref().err().map(|e| e.to_string()),
    })
}

/// Footer printed after a chat-triggered run; the progress lines were streamed already.
pub fn format_run_footer(run: &RunSummary) -> String {
    match &run.error {
        Some(e) => format!("[run stopped: {e}]"),
        None => format!("[run finished after {} progress updates]", run.progress.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro::{AgentError, Workpad};

    #[test]
    fn truncate_display_keeps_short_text() {
        assert_eq!(truncate_display("hello", 10), "hello");
        assert_eq!(truncate_display("hello", 5), "hello");
    }

    #[test]
    fn truncate_display_cuts_with_suffix() {
        let got = truncate_display(&"é".repeat(30), 10);
        assert_eq!(got.chars().count(), 10);
        assert!(got.ends_with("..."));
    }

    #[test]
    fn format_progress_indents_line() {
        assert_eq!(
            format_progress("Meta Agent asked serper_agent to: find"),
            "  > Meta Agent asked serper_agent to: find"
        );
    }

    /// **Scenario**: a failed run carries its error next to the partial answer.
    #[test]
    fn outcome_json_includes_error() {
        let outcome = WorkflowOutcome {
            state: Workpad::new(),
            final_message: "partial".into(),
            result: Err(AgentError::RecursionLimit(3)),
        };
        let v = format_outcome_json("req", &["step".to_string()], &outcome);
        assert_eq!(v["final_message"], "partial");
        assert_eq!(v["progress"][0], "step");
        assert!(v["error"].as_str().unwrap().contains('3'));
    }

    #[test]
    fn run_footer_reports_error() {
        let run = RunSummary {
            requirements: "r".into(),
            progress: vec![],
            final_message: "m".into(),
            error: Some("recursion limit reached".into()),
        };
        assert_eq!(format_run_footer(&run), "[run stopped: recursion limit reached]");
    }
}
