//! JSON output formatting

use crate::request::RequestOutcome;
use mashup_core::SegmentInfo;
use serde::Serialize;

#[derive(Serialize)]
struct SuccessOutput<'a> {
    status: &'static str,
    output: String,
    duration_s: f64,
    size_bytes: u64,
    tracks_received: usize,
    tracks_valid: usize,
    segments: &'a [SegmentInfo],
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    error: &'a str,
}

fn to_json<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => Some(json),
        Err(e) => {
            eprintln!("Error serializing result: {}", e);
            None
        }
    }
}

/// Render a finished request
pub fn outcome_json(outcome: &RequestOutcome) -> Option<String> {
    to_json(&SuccessOutput {
        status: "ok",
        output: outcome.output.display().to_string(),
        duration_s: outcome.duration_s,
        size_bytes: outcome.size_bytes,
        tracks_received: outcome.tracks_received,
        tracks_valid: outcome.tracks_valid,
        segments: &outcome.segments,
    })
}

/// Render a failed request; `output` names the path it would have written
pub fn error_json(output: Option<&std::path::Path>, error: &anyhow::Error) -> Option<String> {
    let message = format!("{:#}", error);
    to_json(&ErrorOutput {
        status: "error",
        output: output.map(|p| p.display().to_string()),
        error: &message,
    })
}

/// Print a finished request as JSON
pub fn print_json_outcome(outcome: &RequestOutcome) {
    if let Some(json) = outcome_json(outcome) {
        println!("{}", json);
    }
}

/// Print a failure as JSON
pub fn print_json_error(output: Option<&std::path::Path>, error: &anyhow::Error) {
    if let Some(json) = error_json(output, error) {
        println!("{}", json);
    }
}
