//! Error conditions raised while reading, dispatching and running commands.

use crate::command::ExitCode;
use nix::errno::Errno;
use rustyline::error::ReadlineError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Everything that can go wrong while the shell handles one line.
///
/// Apart from [`ShellError::InputClosed`] and [`ShellError::Editor`], none of these
/// stop the read-eval loop: they are reported on standard error and the next line
/// is read.
#[derive(Debug, Error)]
pub enum ShellError {
    /// A builtin was called with missing or malformed arguments.
    #[error("{command}: {message}")]
    InvalidArgument {
        command: &'static str,
        message: String,
    },

    #[error("cd: cannot change directory to {}: {source}", .path.display())]
    DirectoryChangeFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("pwd: cannot determine working directory: {0}")]
    WorkingDirectoryUnavailable(#[source] io::Error),

    /// Process creation failed for a reason unrelated to the program itself.
    #[error("{program}: cannot spawn process: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program}: command not found")]
    ProgramNotFound { program: String },

    /// The program exists but the OS refused to execute it.
    #[error("{program}: cannot execute: {source}")]
    ExecFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program}: failed to wait for process: {source}")]
    WaitFailed {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("pipe: cannot create pipe: {0}")]
    PipeFailed(#[source] Errno),

    /// A pipeline stage has no words, e.g. `a | | b`. Stages are numbered from 1.
    #[error("syntax error: empty command in pipeline stage {stage}")]
    EmptyCommand { stage: usize },

    #[error("{operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("line editor: {0}")]
    Editor(#[from] ReadlineError),

    #[error("end of input")]
    InputClosed,
}

impl ShellError {
    /// Classifies an error returned by `Command::spawn`.
    pub(crate) fn from_spawn(program: &str, source: io::Error) -> Self {
        let program = program.to_owned();
        match source.kind() {
            io::ErrorKind::NotFound => ShellError::ProgramNotFound { program },
            io::ErrorKind::PermissionDenied => ShellError::ExecFailed { program, source },
            _ if is_exec_errno(&source) => ShellError::ExecFailed { program, source },
            _ => ShellError::SpawnFailed { program, source },
        }
    }

    /// Shell-style status recorded as the last exit code when this error ends a command.
    pub fn status_code(&self) -> ExitCode {
        match self {
            ShellError::ProgramNotFound { .. } => 127,
            ShellError::ExecFailed { .. } => 126,
            ShellError::EmptyCommand { .. } => 2,
            ShellError::InputClosed => 0,
            _ => 1,
        }
    }
}

fn is_exec_errno(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(code) if code == Errno::ENOEXEC as i32
            || code == Errno::E2BIG as i32
            || code == Errno::ENOTDIR as i32
            || code == Errno::ELOOP as i32
    )
}
