use forkpair_process::run_single_pair;

use crate::cmd::{finish, SingleArgs};
use crate::exit::{orchestrator_error, CliResult};
use crate::output::{print_report, OutputFormat};

pub fn run(args: SingleArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.pair.to_config()?;
    let report =
        run_single_pair(config).map_err(|err| orchestrator_error("single pair run failed", err))?;

    print_report(&report, format);
    Ok(finish(&report, args.pair.strict))
}
