//! CLI argument parsing and validation module
//!
//! Handles command-line interface using clap for both binaries:
//! - `radmac-enroll`: MAC address, users file, reboot/dry-run/prompt switches
//! - `radmac-watch`: log file, authorization mode, interval, action command
//! - Output format selection (human/JSON), verbosity and quiet modes
//!
//! Flags are merged on top of the TOML configuration file.

use crate::command::ActionCommand;
use crate::config::{validate_interval, Configuration};
use crate::models::{EnrollConfiguration, WatchConfiguration, WatchMode};
use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

/// Parsed `radmac-enroll` invocation
#[derive(Debug, Clone)]
pub struct EnrollArgs {
    pub config: EnrollConfiguration,
    pub verbose: bool,
}

/// Parsed `radmac-watch` invocation
#[derive(Debug, Clone)]
pub struct WatchArgs {
    pub config: WatchConfiguration,
    pub verbose: bool,
}

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("PATH")
        .help("Configuration file (default: ~/.config/radmac/config.toml if present)")
        .value_parser(clap::value_parser!(PathBuf))
}

fn users_file_arg() -> Arg {
    Arg::new("users-file")
        .short('f')
        .long("users-file")
        .value_name("PATH")
        .help("FreeRADIUS users file [default: /etc/freeradius/3.0/users]")
        .value_parser(clap::value_parser!(PathBuf))
}

fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help("Enable debug logging on stderr")
        .action(ArgAction::SetTrue)
}

/// Command definition for `radmac-enroll`
pub fn enroll_command() -> Command {
    Command::new("radmac-enroll")
        .version(env!("RADMAC_VERSION"))
        .about("Add a MAC address to the FreeRADIUS users file")
        .long_about(
            "Normalizes a MAC address, prepends a Cleartext-Password record for it to the \
             FreeRADIUS users file, then reboots the server (or restarts FreeRADIUS with \
             --no-reboot) so the new entry takes effect.",
        )
        .arg(
            Arg::new("mac")
                .value_name("MAC_ADDRESS")
                .help("MAC address (aa:bb:cc:dd:ee:ff, aa-bb-cc-dd-ee-ff, aabb.ccdd.eeff or aabbccddeeff)")
                .required(true),
        )
        .arg(users_file_arg())
        .arg(
            Arg::new("no-reboot")
                .short('n')
                .long("no-reboot")
                .help("Restart the FreeRADIUS service instead of rebooting")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .short('d')
                .long("dry-run")
                .help("Show what would be done without making changes")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("yes")
                .short('y')
                .long("yes")
                .help("Do not ask for confirmation when the MAC is already present")
                .action(ArgAction::SetTrue),
        )
        .arg(config_arg())
        .arg(verbose_arg())
}

/// Command definition for `radmac-watch`
pub fn watch_command() -> Command {
    Command::new("radmac-watch")
        .version(env!("RADMAC_VERSION"))
        .about("Watch a log file for MAC addresses and act on them")
        .long_about(
            "Follows a log file from its current end, extracts MAC addresses from new lines \
             and runs an action for them. With --authorize, MACs are checked against the \
             FreeRADIUS users file and only unauthorized ones trigger the action.",
        )
        .arg(
            Arg::new("log-file")
                .value_name("LOG_FILE")
                .help("Log file to monitor")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("authorize")
                .short('a')
                .long("authorize")
                .help("Only act on MACs missing from the users file")
                .action(ArgAction::SetTrue),
        )
        .arg(users_file_arg())
        .arg(
            Arg::new("continuous")
                .long("continuous")
                .help("Keep monitoring after acting on an unauthorized MAC (once per MAC)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("SECONDS")
                .help("Polling interval in seconds (0.01 - 60.0) [default: 0.1]")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("json")
                .short('j')
                .long("json")
                .help("Output detection events as JSON lines")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress banner and informational messages")
                .action(ArgAction::SetTrue),
        )
        .arg(config_arg())
        .arg(verbose_arg())
        .arg(
            Arg::new("exec")
                .long("exec")
                .value_name("PROGRAM")
                .help("Action to run, as a program followed by its arguments; {mac} and {raw} are substituted. Must come last")
                .num_args(1..)
                .allow_hyphen_values(true),
        )
}

/// Parse `radmac-enroll` arguments from the process command line
pub fn parse_enroll_args() -> Result<EnrollArgs> {
    enroll_args_from_matches(&enroll_command().get_matches())
}

/// Parse `radmac-watch` arguments from the process command line
pub fn parse_watch_args() -> Result<WatchArgs> {
    watch_args_from_matches(&watch_command().get_matches())
}

/// Parse `radmac-enroll` arguments from an explicit argument list
pub fn parse_enroll_args_from<I, T>(args: I) -> Result<EnrollArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = enroll_command().try_get_matches_from(args)?;
    enroll_args_from_matches(&matches)
}

/// Parse `radmac-watch` arguments from an explicit argument list
pub fn parse_watch_args_from<I, T>(args: I) -> Result<WatchArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = watch_command().try_get_matches_from(args)?;
    watch_args_from_matches(&matches)
}

fn load_configuration(matches: &ArgMatches) -> Result<Configuration> {
    Configuration::load(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))
}

fn enroll_args_from_matches(matches: &ArgMatches) -> Result<EnrollArgs> {
    let settings = load_configuration(matches)?.enroll;

    let mac_input = matches
        .get_one::<String>("mac")
        .cloned()
        .ok_or_else(|| anyhow!("MAC address is required"))?;

    let users_file = matches
        .get_one::<PathBuf>("users-file")
        .cloned()
        .unwrap_or(settings.users_file);

    Ok(EnrollArgs {
        config: EnrollConfiguration {
            mac_input,
            users_file,
            no_reboot: matches.get_flag("no-reboot"),
            dry_run: matches.get_flag("dry-run"),
            assume_yes: matches.get_flag("yes"),
            service: settings.service,
            reboot_countdown: settings.reboot_countdown,
            restart_command: settings.restart_command,
            reboot_command: settings.reboot_command,
        },
        verbose: matches.get_flag("verbose"),
    })
}

fn watch_args_from_matches(matches: &ArgMatches) -> Result<WatchArgs> {
    let settings = load_configuration(matches)?.watch;

    let log_path = matches
        .get_one::<PathBuf>("log-file")
        .cloned()
        .ok_or_else(|| anyhow!("Log file is required"))?;

    let interval = match matches.get_one::<f64>("interval") {
        Some(&seconds) => validate_interval(seconds)?,
        None => settings.polling_duration(),
    };

    let mode = if matches.get_flag("authorize") {
        WatchMode::Authorized
    } else {
        WatchMode::Naive
    };

    let action = match matches.get_many::<String>("exec") {
        Some(argv) => ActionCommand::from_argv(argv.cloned())?,
        None => settings.action.unwrap_or_else(|| match mode {
            WatchMode::Naive => ActionCommand::default_naive(),
            WatchMode::Authorized => ActionCommand::default_unauthorized(),
        }),
    };

    let users_file = matches
        .get_one::<PathBuf>("users-file")
        .cloned()
        .unwrap_or(settings.users_file);

    Ok(WatchArgs {
        config: WatchConfiguration {
            log_path,
            interval,
            mode,
            users_file,
            action,
            continuous: matches.get_flag("continuous") || settings.continuous,
            output_json: matches.get_flag("json"),
            quiet_mode: matches.get_flag("quiet"),
        },
        verbose: matches.get_flag("verbose"),
    })
}
