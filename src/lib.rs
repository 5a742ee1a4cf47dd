//! A small interactive shell.
//!
//! Each input line is split into whitespace-separated words and then either handed
//! to a builtin (`cd`, `pwd`, `exit`, `help`, ...), run as an external program, or,
//! when it contains `|` separators, run as a pipeline of any number of external
//! programs connected by pipes.
//!
//! The main entry point is [`Interpreter`], which drives the read-eval loop over a
//! [`LineSource`](io_adapters::LineSource).

mod builtin;
pub mod command;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod external;
mod interpreter;
pub mod io_adapters;
pub mod lexer;
pub mod pipeline;
#[cfg(test)]
mod testing;

pub use builtin::{BuiltinEntry, Handler, Registry};
pub use command::{CommandSegment, ExitCode, LoopStatus};
pub use config::Config;
pub use error::{Result, ShellError};
pub use interpreter::Interpreter;
