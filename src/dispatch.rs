use crate::builtin::{Handler, Registry};
use crate::command::{CommandSegment, ExitCode, LoopStatus};
use crate::error::{Result, ShellError};
use crate::external::{self, ExternalCommand};
use crate::io_adapters::OutputSink;
use crate::lexer::TokenSequence;
use crate::pipeline::PipelinePlan;
use nix::sys::signal::Signal;
use std::fmt::Display;
use std::io::{self, Write};
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use tracing::{debug, warn};

/// Routes one tokenized line to a builtin, a single external program, or a pipeline.
pub struct Dispatcher {
    registry: Registry,
    output: OutputSink,
    diagnostics: Box<dyn Write>,
    last_status: ExitCode,
}

impl Dispatcher {
    pub fn new(registry: Registry, output: OutputSink) -> Self {
        Self {
            registry,
            output,
            diagnostics: Box::new(io::stderr()),
            last_status: 0,
        }
    }

    /// Sends builtin and child output to `output`.
    pub fn set_output(&mut self, output: OutputSink) {
        self.output = output;
    }

    /// Sends error reports and signal notices to `diagnostics`.
    pub fn set_diagnostics(&mut self, diagnostics: Box<dyn Write>) {
        self.diagnostics = diagnostics;
    }

    /// Writes `pipesh: <message>` to the diagnostics writer.
    pub fn report(&mut self, message: impl Display) {
        if let Err(write_err) = writeln!(self.diagnostics, "pipesh: {message}") {
            warn!(%message, %write_err, "cannot write diagnostic");
        }
    }

    /// Exit code of the most recent command, `$?` in POSIX shells.
    pub fn last_status(&self) -> ExitCode {
        self.last_status
    }

    /// Executes `tokens` and tells the loop whether to keep going.
    ///
    /// An empty line does nothing. A line containing a pipe separator is always a
    /// pipeline, even when its first word names a builtin.
    pub fn dispatch(&mut self, tokens: &TokenSequence) -> Result<LoopStatus> {
        let Some(program) = tokens.tokens().first() else {
            return Ok(LoopStatus::Continue);
        };
        let result = if tokens.has_pipe() {
            self.run_pipeline(tokens)
        } else {
            let segment = CommandSegment::new(tokens.tokens().to_vec())
                .ok_or(ShellError::EmptyCommand { stage: 1 })?;
            match self.registry.lookup(program) {
                Some(handler) => self.run_builtin(handler, &segment),
                None => self.run_external(&segment),
            }
        };
        if let Err(err) = &result {
            self.last_status = err.status_code();
        }
        result
    }

    fn run_builtin(&mut self, handler: Handler, segment: &CommandSegment) -> Result<LoopStatus> {
        debug!(builtin = segment.program(), "dispatching builtin");
        let status = {
            let mut out = self.output.writer();
            let status = handler(segment, &mut *out)?;
            out.flush()
                .map_err(|source| ShellError::Io { operation: "flush", source })?;
            status
        };
        self.last_status = 0;
        Ok(status)
    }

    fn run_external(&mut self, segment: &CommandSegment) -> Result<LoopStatus> {
        debug!(program = segment.program(), "dispatching external command");
        let status = ExternalCommand::new(segment).run_with(Stdio::inherit(), self.output.stdio()?)?;
        self.record(segment, status);
        Ok(LoopStatus::Continue)
    }

    fn run_pipeline(&mut self, tokens: &TokenSequence) -> Result<LoopStatus> {
        let plan = PipelinePlan::from_tokens(tokens.tokens())?;
        debug!(stages = plan.len(), "dispatching pipeline");
        let statuses = plan.run(Stdio::inherit(), self.output.stdio()?)?;
        for (segment, status) in plan.segments().iter().zip(&statuses) {
            self.record(segment, *status);
        }
        Ok(LoopStatus::Continue)
    }

    /// Remembers `status` as the last exit code; a pipeline ends up with its last stage's.
    ///
    /// A stage killed by `SIGPIPE` is the normal end of a producer whose reader
    /// quit early (`yes | head`) and is not reported.
    fn record(&mut self, segment: &CommandSegment, status: ExitStatus) {
        self.last_status = external::exit_code(status);
        debug!(program = segment.program(), code = self.last_status, "command finished");
        if status.signal() == Some(Signal::SIGPIPE as i32) {
            return;
        }
        if let Some(signal) = external::signal_name(status) {
            self.report(format_args!("{}: terminated by signal {signal}", segment.program()));
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Registry::default(), OutputSink::default())
    }
}
