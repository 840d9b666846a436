//! Various utilities shared by the TacSim tools

use std::{fmt::Display, process::ExitCode};

pub mod logging;

mod result_ext;
pub use result_ext::AnyhowResultExt;

pub type AnyResult<T = (), E = anyhow::Error> = anyhow::Result<T, E>;

/// Shorthand for `Ok(())`, cause it looks ugly
pub const fn ok<E>() -> Result<(), E> {
    Ok(())
}

/// Turns the result of a tool's `run` function into a process exit code.
///
/// Errors are reported as a single line on stderr, with the whole cause chain
/// joined by colons (anyhow's `{:#}` format, which `thiserror` sources follow too).
pub fn exit_with<E: Display>(result: Result<(), E>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
