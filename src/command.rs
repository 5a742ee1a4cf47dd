use std::fmt;

/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// Children killed by a signal are recorded as `128 + signal`, as POSIX shells do.
pub type ExitCode = i32;

/// What the read-eval loop should do after a line has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Continue,
    Terminate,
}

/// One program invocation: the program name followed by its arguments.
///
/// A segment is never empty and its first word is never the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSegment {
    argv: Vec<String>,
}

impl CommandSegment {
    /// Builds a segment from its words, or `None` if there is no program name.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        match argv.first() {
            Some(program) if !program.is_empty() => Some(Self { argv }),
            _ => None,
        }
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for CommandSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}
