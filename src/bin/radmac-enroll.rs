#![forbid(unsafe_code)]

use radmac::cli;
use radmac::enroll::{EnrollError, EnrollOutcome, Enroller, InterruptAction, Interrupts};
use radmac::logging::init_logger;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::io::{self, Write};
use std::process::ExitCode;
use std::thread;

const CANCELLED_MESSAGE: &str = "Operation cancelled by user.";

/// Handle SIGINT/SIGTERM on a dedicated thread for the whole run.
///
/// SIGINT during the reboot countdown is left to the enroller; any other
/// interrupt ends the process with a final message and status 1, even while
/// blocked on the prompt or a running system command.
fn install_interrupt_handler(interrupts: Interrupts) -> io::Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::Builder::new()
        .name("radmac-signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                let action = match signal {
                    SIGINT => interrupts.interrupt(),
                    _ => InterruptAction::CancelOperation,
                };
                if action == InterruptAction::CancelOperation {
                    let _ = io::stdout().flush();
                    eprintln!("\n{}", CANCELLED_MESSAGE);
                    std::process::exit(1);
                }
            }
        })?;
    Ok(())
}

fn main() -> ExitCode {
    let args = match cli::parse_enroll_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logger(args.verbose);

    let interrupts = Interrupts::new();
    if let Err(e) = install_interrupt_handler(interrupts.clone()) {
        log::warn!("Could not install interrupt handler: {}", e);
    }

    let is_root = nix::unistd::geteuid().is_root();
    let stdin = io::stdin();
    let mut enroller = Enroller::new(args.config, stdin.lock(), io::stdout());

    match enroller.run(is_root, &interrupts) {
        Ok(EnrollOutcome::DryRun { .. }) | Ok(EnrollOutcome::Aborted { .. }) => ExitCode::SUCCESS,
        Ok(EnrollOutcome::Enrolled { success: true, .. }) => ExitCode::SUCCESS,
        Ok(EnrollOutcome::Enrolled { success: false, .. }) => ExitCode::FAILURE,
        Err(EnrollError::Cancelled) => {
            eprintln!("{}", CANCELLED_MESSAGE);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
