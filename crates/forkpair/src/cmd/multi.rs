use forkpair_process::run_multiple_pairs;

use crate::cmd::{finish, MultiArgs};
use crate::exit::{orchestrator_error, CliResult};
use crate::output::{print_report, OutputFormat};

pub fn run(args: MultiArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.pair.to_config()?.with_max_pairs(args.max_pairs);
    let report = run_multiple_pairs(args.pairs, config)
        .map_err(|err| orchestrator_error("multi pair run failed", err))?;

    print_report(&report, format);
    Ok(finish(&report, args.pair.strict))
}
