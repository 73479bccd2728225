#![forbid(unsafe_code)]

use radmac::cli;
use radmac::logging::init_logger;
use radmac::models::WatchOutcome;
use radmac::monitor::Watcher;
use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

fn main() -> ExitCode {
    let args = match cli::parse_watch_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logger(args.verbose);
    let quiet = args.config.quiet_mode;

    // Set up interrupt handling
    let interrupted = Arc::new(AtomicBool::new(false));
    let _ = signal_hook::flag::register(signal_hook::consts::SIGINT, interrupted.clone());
    let _ = signal_hook::flag::register(signal_hook::consts::SIGTERM, interrupted.clone());

    let result = Watcher::open(args.config).and_then(|mut watcher| watcher.run(&interrupted));

    match result {
        Ok(WatchOutcome::Interrupted) => {
            if !quiet {
                println!("\nMonitoring stopped.");
            }
            ExitCode::SUCCESS
        }
        Ok(WatchOutcome::ActedOnUnauthorized { success: true, .. }) => ExitCode::SUCCESS,
        Ok(WatchOutcome::ActedOnUnauthorized { success: false, .. }) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
