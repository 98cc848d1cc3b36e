use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use forkpair_process::{ChildExit, ChildReport, PairPlan, RunMode, RunReport};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PairOutput {
    pair: u32,
    first: i32,
    last: i32,
    expected_sum: i64,
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    schema_id: &'static str,
    mode: RunMode,
    pairs: Vec<PairOutput>,
    children: &'a [ChildReport],
    all_succeeded: bool,
}

pub fn print_report(report: &RunReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReportOutput {
                schema_id: "https://schemas.3leaps.dev/forkpair/cli/v1/run-report.schema.json",
                mode: report.mode,
                pairs: report.pairs.iter().map(pair_output).collect(),
                children: &report.children,
                all_succeeded: report.all_succeeded(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PAIR", "ROLE", "PID", "RANGE", "EXIT"]);
            for child in &report.children {
                table.add_row(vec![
                    child.pair.to_string(),
                    child.role.to_string(),
                    child.pid.to_string(),
                    range_text(report, child.pair),
                    child.exit.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for child in &report.children {
                println!(
                    "pair={} role={} pid={} range={} exit={}",
                    child.pair,
                    child.role,
                    child.pid,
                    range_text(report, child.pair),
                    child.exit
                );
            }
            if report.all_succeeded() {
                println!("all {} children exited normally", report.children.len());
            } else {
                println!(
                    "{} of {} children failed",
                    report.failed_children().count(),
                    report.children.len()
                );
            }
        }
        OutputFormat::Raw => {
            for child in &report.children {
                println!("{} {}", child.pid, raw_status(child.exit));
            }
        }
    }
}

fn pair_output(plan: &PairPlan) -> PairOutput {
    PairOutput {
        pair: plan.pair,
        first: plan.first,
        last: plan.last,
        expected_sum: plan.expected_sum(),
    }
}

fn range_text(report: &RunReport, pair: u32) -> String {
    report
        .pairs
        .iter()
        .find(|plan| plan.pair == pair)
        .map(|plan| format!("{}..={}", plan.first, plan.last))
        .unwrap_or_else(|| "-".to_string())
}

fn raw_status(exit: ChildExit) -> String {
    match exit {
        ChildExit::Exited(code) => code.to_string(),
        ChildExit::Signaled(signal) => format!("sig{signal}"),
        ChildExit::Unknown(raw) => format!("raw{raw}"),
    }
}
