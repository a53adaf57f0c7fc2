//! Text and JSON rendering of attribution reports

use crate::attribution::{TbtImpactReport, UrlImpact};
use serde::Serialize;
use std::fmt::Write as _;

/// Format identifier embedded in JSON output
pub const JSON_FORMAT: &str = "tbt-impact-json-v1";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    format: &'static str,
    version: &'static str,
    total_tbt_impact: f64,
    by_url: Vec<UrlImpact>,
    #[serde(flatten)]
    report: &'a TbtImpactReport,
}

/// Pretty-printed JSON document for a report
pub fn to_json(report: &TbtImpactReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        format: JSON_FORMAT,
        version: env!("CARGO_PKG_VERSION"),
        total_tbt_impact: report.total_tbt_impact(),
        by_url: report.impact_by_url(),
        report,
    })
}

/// Human-readable summary listing the `top` tasks by self impact
pub fn to_text(report: &TbtImpactReport, top: usize) -> String {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Blocking-time attribution ({} timeline, window {}, {:.1}ms)",
        report.strategy,
        report.window,
        report.window.duration_ms()
    );
    let _ = writeln!(
        out,
        "Total: {:.1}ms across {} tasks",
        report.total_tbt_impact(),
        report.tasks.len()
    );

    let ranked = report.top_tasks_by_self_impact(top);
    if !ranked.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:>10} {:>10} {:>12}  {:<24} url",
            "self ms", "total ms", "start ms", "task"
        );
        for task in ranked {
            let _ = writeln!(
                out,
                "{:>10.1} {:>10.1} {:>12.1}  {:<24} {}",
                task.self_tbt_impact,
                task.tbt_impact,
                task.task.start_time,
                task.task.name,
                task.task.url.as_deref().unwrap_or("-")
            );
        }
    }

    let by_url = report.impact_by_url();
    if !by_url.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "By URL:");
        for entry in by_url {
            let _ = writeln!(
                out,
                "  {:>10.1}ms  {} ({} tasks)",
                entry.self_tbt_impact, entry.url, entry.task_count
            );
        }
    }

    if !report.anomalies.is_empty() {
        let _ = writeln!(out);
        let ids: Vec<String> = report.anomalies.iter().map(|id| id.to_string()).collect();
        let _ = writeln!(
            out,
            "Warning: negative self impact on tasks {}",
            ids.join(", ")
        );
    }

    out
}
