//! Scripted conda stand-in for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::CondaError;

use super::cli::{CommandOutput, CondaCli};
use super::commands::Subcommand;

/// Returns queued outputs per subcommand and records every call.
///
/// A subcommand with nothing queued answers with an empty successful output.
#[derive(Default)]
pub struct ScriptedCli {
    responses: RefCell<HashMap<Subcommand, VecDeque<CommandOutput>>>,
    spawn_failures: HashSet<Subcommand>,
    calls: RefCell<Vec<(Subcommand, Vec<String>)>>,
}

impl ScriptedCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an output for the next call of `subcommand`.
    pub fn respond(self, subcommand: Subcommand, output: CommandOutput) -> Self {
        self.responses
            .borrow_mut()
            .entry(subcommand)
            .or_default()
            .push_back(output);
        self
    }

    /// Makes every call of `subcommand` fail to spawn.
    pub fn fail_spawn(mut self, subcommand: Subcommand) -> Self {
        self.spawn_failures.insert(subcommand);
        self
    }

    /// All recorded calls in order.
    pub fn calls(&self) -> Vec<(Subcommand, Vec<String>)> {
        self.calls.borrow().clone()
    }

    /// Recorded argument lists for one subcommand.
    pub fn calls_to(&self, subcommand: Subcommand) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|(sub, _)| *sub == subcommand)
            .map(|(_, args)| args.clone())
            .collect()
    }
}

impl CondaCli for ScriptedCli {
    fn invoke(&self, subcommand: Subcommand, args: &[String]) -> Result<CommandOutput, CondaError> {
        self.calls.borrow_mut().push((subcommand, args.to_vec()));

        if self.spawn_failures.contains(&subcommand) {
            return Err(CondaError::Spawn {
                program: "conda".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted"),
            });
        }

        let next = self
            .responses
            .borrow_mut()
            .get_mut(&subcommand)
            .and_then(|queue| queue.pop_front());

        Ok(next.unwrap_or_else(|| CommandOutput::ok("")))
    }
}
