//! Output formatting utilities

use crate::controller::BatchSummary;
use crate::input::BatchRow;
use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde_json::json;
use std::cmp::Ordering;
use tabled::{Table, Tabled, settings::Style};
use tuning_model::{Availability, Outcome, Quantity, ReconciliationResult};

/// Timestamp format of the DataTime column
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "DataTime")]
    time: String,
    #[tabled(rename = "Workload")]
    workload: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Replicas")]
    replicas: String,
    #[tabled(rename = "Requests (CPU)")]
    requests_cpu: String,
    #[tabled(rename = "Requests (Memory)")]
    requests_memory: String,
    #[tabled(rename = "Limits (CPU)")]
    limits_cpu: String,
    #[tabled(rename = "Limits (Memory)")]
    limits_memory: String,
    #[tabled(rename = "QoS")]
    qos: String,
    #[tabled(rename = "Run status")]
    run_status: String,
    #[tabled(rename = "Alter status")]
    alter_status: String,
}

/// Direction of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    Up,
    Down,
    Same,
    Unknown,
}

fn quantity_trend(current: &str, desired: &str) -> Trend {
    match (current.parse::<Quantity>(), desired.parse::<Quantity>()) {
        (Ok(current), Ok(desired)) => match current.compare(&desired) {
            Some(Ordering::Less) => Trend::Up,
            Some(Ordering::Greater) => Trend::Down,
            Some(Ordering::Equal) => Trend::Same,
            None => Trend::Unknown,
        },
        _ => Trend::Unknown,
    }
}

fn replica_trend(current: i32, desired: i32) -> Trend {
    match current.cmp(&desired) {
        Ordering::Less => Trend::Up,
        Ordering::Greater => Trend::Down,
        Ordering::Equal => Trend::Same,
    }
}

/// `current -> desired`, green when increasing and red when decreasing
fn transition(current: Option<&str>, desired: &str, trend: Trend, color: bool) -> String {
    let text = format!("{} -> {}", current.filter(|c| !c.is_empty()).unwrap_or("-"), desired);
    if !color {
        return text;
    }
    match trend {
        Trend::Up => text.green().to_string(),
        Trend::Down => text.red().to_string(),
        Trend::Same | Trend::Unknown => text,
    }
}

fn paint(text: String, color: bool, style: fn(ColoredString) -> ColoredString) -> String {
    if color {
        style(text.as_str().normal()).to_string()
    } else {
        text
    }
}

fn availability_cell(availability: Option<Availability>, color: bool) -> String {
    let Some(availability) = availability else {
        return "-".to_string();
    };
    let style: fn(ColoredString) -> ColoredString = match availability {
        Availability::Available => |s| s.green(),
        Availability::PartiallyAvailable => |s| s.yellow(),
        Availability::NotAvailable => |s| s.red(),
    };
    paint(availability.to_string(), color, style)
}

fn outcome_cell(outcome: Outcome, color: bool) -> String {
    let style: fn(ColoredString) -> ColoredString = match outcome {
        Outcome::Success => |s| s.green(),
        Outcome::Failed => |s| s.red(),
    };
    paint(outcome.to_string(), color, style)
}

fn result_row(result: &ReconciliationResult, color: bool) -> ResultRow {
    let current = result.current.as_ref();
    let desired = &result.desired;
    let quantity = |current: Option<&String>, desired: &str| {
        let current = current.map(String::as_str);
        let trend = current.map_or(Trend::Unknown, |c| quantity_trend(c, desired));
        transition(current, desired, trend, color)
    };
    let replicas_current = result.current_replicas.map(|r| r.to_string());
    let replicas_trend = result
        .current_replicas
        .map_or(Trend::Unknown, |c| replica_trend(c, result.desired_replicas));

    ResultRow {
        time: result.timestamp.format(TIME_FORMAT).to_string(),
        workload: result.workload.clone(),
        container: result.container.clone(),
        kind: result.kind.short_name().to_string(),
        namespace: result.namespace.clone(),
        replicas: transition(
            replicas_current.as_deref(),
            &result.desired_replicas.to_string(),
            replicas_trend,
            color,
        ),
        requests_cpu: quantity(current.map(|c| &c.requests_cpu), &desired.requests_cpu),
        requests_memory: quantity(current.map(|c| &c.requests_memory), &desired.requests_memory),
        limits_cpu: quantity(current.map(|c| &c.limits_cpu), &desired.limits_cpu),
        limits_memory: quantity(current.map(|c| &c.limits_memory), &desired.limits_memory),
        qos: result.qos_class.clone().unwrap_or_else(|| "-".to_string()),
        run_status: availability_cell(result.availability, color),
        alter_status: outcome_cell(result.outcome, color),
    }
}

fn summary_line(summary: &BatchSummary) -> String {
    format!(
        "{} reconciled: {} succeeded, {} failed, {} rejected, {} unresolved",
        summary.results.len(),
        summary.succeeded(),
        summary.failed(),
        summary.rejected,
        summary.unresolved
    )
}

/// Renders a batch summary for stdout
pub fn render_summary(summary: &BatchSummary, format: OutputFormat, color: bool) -> Result<String> {
    match format {
        OutputFormat::Table => {
            let mut out = String::new();
            if summary.results.is_empty() {
                out.push_str(&paint("No workloads reconciled".to_string(), color, |s| s.yellow()));
            } else {
                let rows: Vec<ResultRow> = summary.results.iter().map(|r| result_row(r, color)).collect();
                out.push_str(&Table::new(rows).with(Style::rounded()).to_string());
            }
            out.push('\n');
            let line = summary_line(summary);
            out.push_str(&if summary.has_failures() {
                paint(line, color, |s| s.yellow().bold())
            } else {
                paint(line, color, |s| s.green().bold())
            });
            Ok(out)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(summary)?),
    }
}

/// Renders the outcome of `validate` for stdout
pub fn render_validation(rows: &[BatchRow], format: OutputFormat, color: bool) -> Result<String> {
    let valid: Vec<_> = rows.iter().filter_map(|r| r.as_ref().ok()).collect();
    let rejected: Vec<_> = rows.iter().filter_map(|r| r.as_ref().err()).collect();

    match format {
        OutputFormat::Table => {
            let mut lines = Vec::new();
            for request in &valid {
                lines.push(format!(
                    "{} line {}: {} {}/{} container {}",
                    paint("✓".to_string(), color, |s| s.green().bold()),
                    request.line,
                    request.kind,
                    request.namespace,
                    request.workload,
                    request.container
                ));
            }
            for row in &rejected {
                lines.push(format!(
                    "{} line {}: {}",
                    paint("✗".to_string(), color, |s| s.red().bold()),
                    row.line,
                    row.error
                ));
            }
            lines.push(format!("{} valid, {} rejected", valid.len(), rejected.len()));
            Ok(lines.join("\n"))
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let document = json!({
                "valid": valid,
                "rejected": rejected
                    .iter()
                    .map(|r| json!({ "line": r.line, "error": r.error.to_string() }))
                    .collect::<Vec<_>>(),
            });
            if format == OutputFormat::Json {
                Ok(serde_json::to_string_pretty(&document)?)
            } else {
                Ok(serde_yaml::to_string(&document)?)
            }
        }
    }
}
