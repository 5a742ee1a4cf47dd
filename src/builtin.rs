//! Commands executed inside the shell process.
//!
//! The set of builtins is fixed at compile time and stored in a static table; the
//! [`Registry`] is only a read-only view of it. Builtins that take arguments parse
//! them with [`argh`], the others accept and ignore whatever follows their name.

use crate::command::{CommandSegment, LoopStatus};
use crate::error::{Result, ShellError};
use argh::{EarlyExit, FromArgs};
use std::env;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

/// Signature shared by every builtin: the whole segment (name included) and the
/// stream that receives the builtin's output.
pub type Handler = fn(&CommandSegment, &mut dyn Write) -> Result<LoopStatus>;

/// A (name, handler) pair of the builtin table.
#[derive(Clone, Copy)]
pub struct BuiltinEntry {
    pub name: &'static str,
    pub handler: Handler,
}

impl fmt::Debug for BuiltinEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltinEntry").field("name", &self.name).finish()
    }
}

static BUILTINS: [BuiltinEntry; 6] = [
    BuiltinEntry { name: Cd::NAME, handler: invoke::<Cd> },
    BuiltinEntry { name: "exit", handler: exit },
    BuiltinEntry { name: "help", handler: help },
    BuiltinEntry { name: Pwd::NAME, handler: invoke::<Pwd> },
    BuiltinEntry { name: "to_file", handler: reserved },
    BuiltinEntry { name: "from_file", handler: reserved },
];

/// Lookup table of the builtins known to the shell.
#[derive(Debug, Clone, Copy)]
pub struct Registry {
    entries: &'static [BuiltinEntry],
}

impl Registry {
    /// Finds the handler registered under exactly `name` (case-sensitive).
    pub fn lookup(&self, name: &str) -> Option<Handler> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.handler)
    }

    /// Names of all builtins, in registration order.
    pub fn list_names(&self) -> impl Iterator<Item = &'static str> {
        self.entries.iter().map(|entry| entry.name)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self { entries: &BUILTINS }
    }
}

/// Builtins whose arguments are parsed with [`argh`].
trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd".
    const NAME: &'static str;

    fn execute(self, stdout: &mut dyn Write) -> Result<LoopStatus>;
}

/// Parses the segment's arguments into `T` and runs it.
///
/// `--help` prints the generated usage and continues; a parse error becomes
/// [`ShellError::InvalidArgument`] carrying argh's message.
fn invoke<T: BuiltinCommand>(segment: &CommandSegment, stdout: &mut dyn Write) -> Result<LoopStatus> {
    let args: Vec<&str> = segment.args().iter().map(String::as_str).collect();
    match T::from_args(&[T::NAME], &args) {
        Ok(cmd) => cmd.execute(stdout),
        Err(EarlyExit { output, status: Ok(()) }) => {
            write_output(T::NAME, stdout, output.as_bytes())?;
            Ok(LoopStatus::Continue)
        }
        Err(EarlyExit { output, status: Err(()) }) => Err(ShellError::InvalidArgument {
            command: T::NAME,
            message: output.trim_end().to_owned(),
        }),
    }
}

fn write_output(command: &'static str, stdout: &mut dyn Write, bytes: &[u8]) -> Result<()> {
    stdout
        .write_all(bytes)
        .map_err(|source| ShellError::Io { operation: command, source })
}

#[derive(FromArgs)]
/// Change the current working directory.
struct Cd {
    #[argh(positional)]
    /// directory to switch to; absolute or relative to the current directory.
    /// Operands after the first are ignored.
    operands: Vec<String>,
}

impl BuiltinCommand for Cd {
    const NAME: &'static str = "cd";

    /// The only place where the shell changes its process-wide working directory.
    fn execute(self, _stdout: &mut dyn Write) -> Result<LoopStatus> {
        let Some(target) = self.operands.into_iter().next() else {
            return Err(ShellError::InvalidArgument {
                command: Self::NAME,
                message: "expected a directory argument".to_owned(),
            });
        };
        let path = PathBuf::from(target);
        env::set_current_dir(&path)
            .map_err(|source| ShellError::DirectoryChangeFailed { path: path.clone(), source })?;
        debug!(path = %path.display(), "changed working directory");
        Ok(LoopStatus::Continue)
    }
}

#[derive(FromArgs)]
/// Print the current working directory.
struct Pwd {
    // Accepted so that `pwd foo` still prints the directory.
    #[allow(dead_code)]
    #[argh(positional)]
    /// ignored.
    operands: Vec<String>,
}

impl BuiltinCommand for Pwd {
    const NAME: &'static str = "pwd";

    fn execute(self, stdout: &mut dyn Write) -> Result<LoopStatus> {
        let dir = env::current_dir().map_err(ShellError::WorkingDirectoryUnavailable)?;
        write_output(Self::NAME, stdout, format!("{}\n", dir.display()).as_bytes())?;
        Ok(LoopStatus::Continue)
    }
}

fn exit(_segment: &CommandSegment, _stdout: &mut dyn Write) -> Result<LoopStatus> {
    Ok(LoopStatus::Terminate)
}

const BANNER: &str = "\t --pipesh--\n\t A simple shell\n\t Shell builtins:\n";

fn help(_segment: &CommandSegment, stdout: &mut dyn Write) -> Result<LoopStatus> {
    let mut text = String::from(BANNER);
    for name in Registry::default().list_names() {
        text.push_str("\t ");
        text.push_str(name);
        text.push('\n');
    }
    write_output("help", stdout, text.as_bytes())?;
    Ok(LoopStatus::Continue)
}

/// `to_file` and `from_file` are placeholders for output and input redirection.
fn reserved(segment: &CommandSegment, _stdout: &mut dyn Write) -> Result<LoopStatus> {
    debug!(builtin = segment.program(), "redirection builtin is not implemented");
    Ok(LoopStatus::Continue)
}
