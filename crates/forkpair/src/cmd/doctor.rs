use serde::Serialize;

use crate::cmd::DoctorArgs;
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Info,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    schema_id: &'static str,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        platform_check(),
        pipe_round_trip_check(),
        fork_wait_check(),
        defaults_check(),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let output = DoctorOutput {
        schema_id: "https://schemas.3leaps.dev/forkpair/cli/v1/doctor-report.schema.json",
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("forkpair doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<16} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Info => "INFO",
    }
}

fn platform_check() -> CheckResult {
    CheckResult {
        name: "platform",
        status: CheckStatus::Info,
        detail: format!("{}/{}", std::env::consts::OS, std::env::consts::ARCH),
    }
}

/// Send one value through a fresh pipe and read it back.
fn pipe_round_trip_check() -> CheckResult {
    use forkpair_channel::{Channel, ValueReader, ValueWriter};

    let result = (|| -> forkpair_channel::Result<Option<i32>> {
        let (reader, writer) = Channel::open()?.split()?;
        let mut writer = ValueWriter::new(writer);
        writer.send(0x5eed)?;
        drop(writer);
        ValueReader::new(reader).read_value()
    })();

    let (status, detail) = match result {
        Ok(Some(0x5eed)) => (CheckStatus::Pass, "value survived pipe round trip".to_string()),
        Ok(other) => (CheckStatus::Fail, format!("unexpected value: {other:?}")),
        Err(err) => (CheckStatus::Fail, err.to_string()),
    };
    CheckResult {
        name: "pipe_round_trip",
        status,
        detail,
    }
}

/// Fork a consumer on an already-closed channel and reap it.
fn fork_wait_check() -> CheckResult {
    use forkpair_process::{ChildTask, ForkLauncher, Launcher, ProcessHandle};

    let mut launcher = ForkLauncher::new();
    let result = (|| -> Result<String, String> {
        let mut channel = launcher.open_channel().map_err(|e| e.to_string())?;
        let child = launcher
            .spawn(ChildTask::Consumer { pair: 0 }, &mut channel)
            .map_err(|e| format!("fork failed: {e}"))?;
        channel.close();
        let pid = child.pid();
        let exit = launcher
            .wait(child)
            .map_err(|e| format!("waitpid failed: {e}"))?;
        if exit.success() {
            Ok(format!("child {pid} {exit}"))
        } else {
            Err(format!("child {pid} {exit}"))
        }
    })();

    match result {
        Ok(detail) => CheckResult {
            name: "fork_wait",
            status: CheckStatus::Pass,
            detail,
        },
        Err(detail) => CheckResult {
            name: "fork_wait",
            status: CheckStatus::Fail,
            detail,
        },
    }
}

fn defaults_check() -> CheckResult {
    let defaults = forkpair_process::PairConfig::default();
    CheckResult {
        name: "defaults",
        status: CheckStatus::Info,
        detail: format!(
            "values_per_pair={} send_delay={:?} max_pairs={}",
            defaults.values_per_pair, defaults.send_delay, defaults.max_pairs
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctor_output_has_overall_status() {
        let output = DoctorOutput {
            schema_id: "x",
            checks: vec![CheckResult {
                name: "x",
                status: CheckStatus::Pass,
                detail: "ok".to_string(),
            }],
            overall: "pass",
        };
        let json = serde_json::to_string(&output).expect("doctor output should serialize");
        assert!(json.contains("\"overall\":\"pass\""));
        assert!(json.contains("\"status\":\"pass\""));
    }

    #[test]
    fn pipe_round_trip_passes() {
        assert!(matches!(pipe_round_trip_check().status, CheckStatus::Pass));
    }
}
