//! External command execution
//!
//! Every command is an argument vector handed straight to the OS; nothing is
//! ever run through a shell. Values taken from logs or the command line are
//! substituted into individual arguments, so a hostile log line cannot inject
//! extra commands or arguments.

use crate::constants::{PLACEHOLDER_MAC, PLACEHOLDER_RAW, PLACEHOLDER_SERVICE};
use crate::mac::MacMatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Command;

/// Errors raised while running an external command
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Action command is empty")]
    Empty,
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },
}

/// Captured result of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// A program plus its arguments.
///
/// Arguments may contain `{mac}`, `{raw}` or `{service}` placeholders, which
/// are replaced per argument before execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ActionCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ActionCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a full argument vector (`argv[0]` is the program)
    pub fn from_argv<I, S>(argv: I) -> Result<Self, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = argv.into_iter().map(Into::into);
        let program = iter.next().filter(|p| !p.is_empty()).ok_or(CommandError::Empty)?;
        Ok(Self {
            program,
            args: iter.collect(),
        })
    }

    /// Placeholder action for naive watching: report the MAC as matched
    pub fn default_naive() -> Self {
        Self::new("echo", vec![format!("Processing MAC: {}", PLACEHOLDER_RAW)])
    }

    /// Placeholder action for unauthorized MACs
    pub fn default_unauthorized() -> Self {
        Self::new("echo", vec![format!("Unauthorized MAC: {}", PLACEHOLDER_MAC)])
    }

    /// Substitute MAC placeholders into each argument
    pub fn for_match(&self, found: &MacMatch) -> Self {
        let substitute = |arg: &String| {
            arg.replace(PLACEHOLDER_MAC, found.mac.as_str())
                .replace(PLACEHOLDER_RAW, &found.raw)
        };
        Self {
            program: substitute(&self.program),
            args: self.args.iter().map(substitute).collect(),
        }
    }

    /// Substitute the service placeholder into each argument
    pub fn for_service(&self, service: &str) -> Self {
        Self {
            program: self.program.replace(PLACEHOLDER_SERVICE, service),
            args: self
                .args
                .iter()
                .map(|arg| arg.replace(PLACEHOLDER_SERVICE, service))
                .collect(),
        }
    }

    /// Run the command to completion, capturing its output
    pub fn run(&self) -> Result<CommandOutput, CommandError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| CommandError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

        if !output.status.success() {
            return Err(CommandError::Failed {
                command: self.to_string(),
                status: output.status.to_string(),
                stdout,
                stderr,
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}

impl fmt::Display for ActionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) || arg.is_empty() {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<String>> for ActionCommand {
    type Error = CommandError;

    fn try_from(argv: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_argv(argv)
    }
}

impl From<ActionCommand> for Vec<String> {
    fn from(command: ActionCommand) -> Self {
        std::iter::once(command.program).chain(command.args).collect()
    }
}
