use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("forkpair {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: forkpair");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("FORKPAIR_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("FORKPAIR_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "defaults: values_per_pair={}, send_delay={:?}, max_pairs={}",
        forkpair_process::DEFAULT_VALUES_PER_PAIR,
        forkpair_process::DEFAULT_SEND_DELAY,
        forkpair_process::DEFAULT_MAX_PAIRS
    );

    Ok(SUCCESS)
}
