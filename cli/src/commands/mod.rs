//! Subcommands
//!
//! Each command supplies an operation and a policy to the reconciler and
//! renders the result.

pub mod create;
pub mod delete;
pub mod status;

use std::process::ExitCode;

/// Exit code for any unrecovered failure
pub const FAILURE_EXIT_CODE: u8 = 40;

/// How a command finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Done,
    NothingToDo,
    /// Confirmation declined
    Declined,
    /// At least one action failed
    Failed,
}

impl Completion {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Completion::Done | Completion::NothingToDo | Completion::Declined => ExitCode::SUCCESS,
            Completion::Failed => ExitCode::from(FAILURE_EXIT_CODE),
        }
    }
}

fn completion_of(report: &reconciler::ExecutionReport) -> Completion {
    if report.user_aborted() {
        Completion::Declined
    } else if report.has_failures() {
        Completion::Failed
    } else {
        Completion::Done
    }
}
