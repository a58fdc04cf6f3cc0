use std::process::{Command, ExitStatus};

use crate::command::CommandChain;
use crate::error::{PaktError, Result};

/// Runs a composed command chain.
pub trait Executor {
    fn run(&mut self, chain: &CommandChain) -> Result<()>;
}

/// Spawns real processes with stdin/stdout/stderr inherited from pakt.
/// A lone invocation runs as plain argv; a chain goes through `sh -c`.
#[derive(Debug, Default)]
pub struct System;

impl Executor for System {
    fn run(&mut self, chain: &CommandChain) -> Result<()> {
        let rendered = chain.render();
        log::debug!("exec: {}", rendered);
        let (program, status) = match chain.invocations() {
            [] => return Ok(()),
            [single] => (single.program().to_string(), Command::new(single.program()).args(single.args()).status()),
            _ => ("sh".to_string(), Command::new("sh").args(["-c", &rendered]).status()),
        };
        let status = status.map_err(|source| PaktError::Spawn { program, source })?;
        check(&rendered, status)
    }
}

fn check(command: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    let status = match status.code() {
        Some(code) => format!("exit code {code}"),
        None => "a signal".to_string(),
    };
    Err(PaktError::Execution { command: command.to_string(), status })
}

/// Prints what would run; never spawns anything.
#[derive(Debug, Default)]
pub struct DryRun;

impl Executor for DryRun {
    fn run(&mut self, chain: &CommandChain) -> Result<()> {
        println!("{}", chain.render());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Records rendered chains; fails any chain whose render contains one of `fail_on`.
    #[derive(Debug, Default)]
    pub struct Recorder {
        pub runs: Vec<CommandChain>,
        pub fail_on: Vec<String>,
    }

    impl Recorder {
        pub fn rendered(&self) -> Vec<String> {
            self.runs.iter().map(CommandChain::render).collect()
        }
    }

    impl Executor for Recorder {
        fn run(&mut self, chain: &CommandChain) -> Result<()> {
            self.runs.push(chain.clone());
            let rendered = chain.render();
            if self.fail_on.iter().any(|f| rendered.contains(f.as_str())) {
                return Err(PaktError::Execution { command: rendered, status: "exit code 1".into() });
            }
            Ok(())
        }
    }
}
