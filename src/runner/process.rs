use std::process::Command;

use super::{Invoker, command_line};
use crate::error::RunError;

/// Runs programs with `std::process::Command`, blocking until they exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

impl Invoker for ProcessInvoker {
    fn invoke(&self, program: &str, args: &[String]) -> Result<String, RunError> {
        let command = command_line(program, args);
        log::debug!("running {command}");

        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| RunError::Spawn {
                command: command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(RunError::Failed {
                command,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
