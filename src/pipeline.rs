//! N-stage pipelines: `a | b | c` runs every stage as a child process, with the
//! standard output of each stage connected to the standard input of the next.

use crate::command::CommandSegment;
use crate::error::{Result, ShellError};
use crate::external::{self, ExternalCommand};
use crate::lexer::PIPE;
use nix::fcntl::{FcntlArg, FdFlag, fcntl};
use nix::unistd;
use std::iter;
use std::os::fd::{AsRawFd, OwnedFd};
use std::process::{Child, ExitStatus, Stdio};
use tracing::{debug, trace};

/// The stages of one pipeline, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelinePlan {
    segments: Vec<CommandSegment>,
}

impl PipelinePlan {
    /// Splits `tokens` at every pipe separator.
    ///
    /// Fails with [`ShellError::EmptyCommand`] if any stage has no words, which
    /// happens for a leading, trailing or doubled separator.
    pub fn from_tokens(tokens: &[String]) -> Result<Self> {
        let segments = tokens
            .split(|token| token == PIPE)
            .enumerate()
            .map(|(index, words)| {
                CommandSegment::new(words.to_vec()).ok_or(ShellError::EmptyCommand { stage: index + 1 })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[CommandSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of pipes needed to connect the stages.
    pub fn pipe_count(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// Runs every stage and waits for all of them.
    ///
    /// The first stage reads from `stdin` and the last one writes to `stdout`.
    /// All stages are started before the first wait, so a stage blocked on a full
    /// pipe always has a running reader. Returns the exit statuses in stage order.
    ///
    /// If a stage cannot be started, the stages already running are still waited
    /// for before the spawn error is returned.
    pub fn run(&self, stdin: Stdio, stdout: Stdio) -> Result<Vec<ExitStatus>> {
        let mut children = Vec::with_capacity(self.len());
        let spawned = self.spawn_stages(stdin, stdout, &mut children);
        let reaped = self.wait_stages(children);
        spawned?;
        reaped
    }

    fn spawn_stages(&self, stdin: Stdio, stdout: Stdio, children: &mut Vec<Child>) -> Result<()> {
        let (reads, writes): (Vec<OwnedFd>, Vec<OwnedFd>) = (0..self.pipe_count())
            .map(|_| pipe())
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip();
        debug!(stages = self.len(), pipes = reads.len(), "starting pipeline");

        // Stage i reads from pipe i-1 and writes to pipe i. Endpoints not yet
        // handed to a stage stay in these iterators and are closed if we bail out.
        let inputs = iter::once(stdin).chain(reads.into_iter().map(Stdio::from));
        let outputs = writes.into_iter().map(Stdio::from).chain(iter::once(stdout));

        for ((segment, input), output) in self.segments.iter().zip(inputs).zip(outputs) {
            // The parent's copies of `input` and `output` are closed when the
            // `Command` holding them is dropped at the end of `spawn`.
            children.push(ExternalCommand::new(segment).spawn(input, output)?);
        }
        Ok(())
    }

    fn wait_stages(&self, children: Vec<Child>) -> Result<Vec<ExitStatus>> {
        let mut statuses = Vec::with_capacity(children.len());
        let mut failure = None;
        for (segment, mut child) in self.segments.iter().zip(children) {
            match external::wait(&mut child, segment.program()) {
                Ok(status) => statuses.push(status),
                Err(err) => {
                    failure.get_or_insert(err);
                }
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(statuses),
        }
    }
}

/// Creates a pipe as `(read, write)`.
///
/// Both ends are close-on-exec, so a child keeps only the ends installed as its
/// standard input or output.
fn pipe() -> Result<(OwnedFd, OwnedFd)> {
    let (read, write) = unistd::pipe().map_err(ShellError::PipeFailed)?;
    for fd in [&read, &write] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(ShellError::PipeFailed)?;
    }
    trace!(read = read.as_raw_fd(), write = write.as_raw_fd(), "created pipe");
    Ok((read, write))
}
