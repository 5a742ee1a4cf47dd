use crate::command::{ExitCode, LoopStatus};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::ShellError;
use crate::io_adapters::{LineSource, OutputSink};
use crate::lexer;
use rustyline::error::ReadlineError;
use std::io::Write;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    Running,
    Terminated,
}

/// The read-eval loop: prompt, read a line, tokenize, dispatch, repeat.
///
/// Example
/// ```
/// use pipesh::Interpreter;
/// use pipesh::LoopStatus;
/// let mut sh = Interpreter::default();
/// assert_eq!(sh.execute_line("exit"), LoopStatus::Terminate);
/// ```
pub struct Interpreter {
    dispatcher: Dispatcher,
    prompt: String,
}

impl Interpreter {
    pub fn new(config: &Config) -> Self {
        Self {
            dispatcher: Dispatcher::default(),
            prompt: config.prompt.clone(),
        }
    }

    /// Sends builtin and child output to `output` instead of standard output.
    pub fn with_output(mut self, output: OutputSink) -> Self {
        self.dispatcher.set_output(output);
        self
    }

    /// Sends error reports and signal notices to `diagnostics` instead of standard error.
    pub fn with_diagnostics(mut self, diagnostics: Box<dyn Write>) -> Self {
        self.dispatcher.set_diagnostics(diagnostics);
        self
    }

    pub fn last_status(&self) -> ExitCode {
        self.dispatcher.last_status()
    }

    /// Reads and executes lines from `input` until `exit` or end of input.
    pub fn repl(&mut self, input: &mut dyn LineSource) {
        let mut state = LoopState::Running;
        while state == LoopState::Running {
            state = match input.read_line(&self.prompt) {
                Ok(line) => match self.execute_line(&line) {
                    LoopStatus::Continue => LoopState::Running,
                    LoopStatus::Terminate => LoopState::Terminated,
                },
                Err(ShellError::InputClosed) => {
                    debug!("input closed");
                    LoopState::Terminated
                }
                Err(err) if is_fatal_read_error(&err) => {
                    self.dispatcher.report(&err);
                    LoopState::Terminated
                }
                // A bad line is dropped; the next read may well succeed.
                Err(err) => {
                    self.dispatcher.report(&err);
                    LoopState::Running
                }
            };
        }
        debug!(last_status = self.last_status(), "leaving read-eval loop");
    }

    /// Tokenizes and dispatches one line, reporting any error.
    pub fn execute_line(&mut self, line: &str) -> LoopStatus {
        let tokens = lexer::split_into_tokens(line);
        trace!(tokens = ?tokens.tokens(), pipe = tokens.has_pipe(), "tokenized line");
        match self.dispatcher.dispatch(&tokens) {
            Ok(status) => status,
            Err(err) => {
                self.dispatcher.report(&err);
                LoopStatus::Continue
            }
        }
    }
}

/// Whether the input itself is broken, so that reading again cannot help.
fn is_fatal_read_error(err: &ShellError) -> bool {
    matches!(
        err,
        ShellError::Io { operation: "read", .. } | ShellError::Editor(ReadlineError::Io(_))
    )
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_adapters::{BufReadLines, MemWriter};
    use std::io::{self, Cursor};

    fn interpreter() -> (Interpreter, MemWriter) {
        let diagnostics = MemWriter::new();
        let sh = Interpreter::default()
            .with_output(OutputSink::File(tempfile::tempfile().unwrap()))
            .with_diagnostics(Box::new(diagnostics.clone()));
        (sh, diagnostics)
    }

    #[test]
    fn test_exit_stops_reading() {
        let (mut sh, _) = interpreter();
        let prompts = MemWriter::new();
        let mut input = BufReadLines::new(Cursor::new("\nexit\ntrue\n"), prompts.clone());

        sh.repl(&mut input);

        assert_eq!(prompts.contents(), "> > ");
    }

    #[test]
    fn test_end_of_input_stops_loop() {
        let (mut sh, diagnostics) = interpreter();
        let prompts = MemWriter::new();
        let mut input = BufReadLines::new(Cursor::new("true\n"), prompts.clone());

        sh.repl(&mut input);

        assert_eq!(prompts.contents(), "> > ");
        assert_eq!(diagnostics.contents(), "");
    }

    #[test]
    fn test_errors_are_reported_and_loop_continues() {
        let (mut sh, diagnostics) = interpreter();
        let prompts = MemWriter::new();
        let mut input = BufReadLines::new(Cursor::new("cd\na | | b\n"), prompts.clone());

        sh.repl(&mut input);

        assert_eq!(prompts.contents(), "> > > ");
        let reported = diagnostics.contents();
        let lines: Vec<_> = reported.lines().collect();
        assert_eq!(lines.len(), 2, "{reported}");
        assert!(lines[0].starts_with("pipesh: cd: "), "{reported}");
        assert_eq!(lines[1], "pipesh: syntax error: empty command in pipeline stage 2");
        assert_eq!(sh.last_status(), 2);
    }

    #[test]
    fn test_invalid_utf8_line_does_not_end_session() {
        let (mut sh, diagnostics) = interpreter();
        let prompts = MemWriter::new();
        let mut input = BufReadLines::new(Cursor::new(b"\xff\xfe\ntrue\nfalse\n".to_vec()), prompts.clone());

        sh.repl(&mut input);

        assert_eq!(prompts.contents(), "> > > > ");
        assert!(diagnostics.contents().starts_with("pipesh: "), "{}", diagnostics.contents());
        assert_eq!(sh.last_status(), 1);
    }

    #[test]
    fn test_read_errors_are_classified() {
        let broken = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        assert!(is_fatal_read_error(&ShellError::Io { operation: "read", source: broken }));
        assert!(!is_fatal_read_error(&ShellError::EmptyCommand { stage: 1 }));
        assert!(!is_fatal_read_error(&ShellError::Editor(ReadlineError::Signal(rustyline::error::Signal::Resize))));
    }

    #[test]
    fn test_custom_prompt() {
        let config = Config {
            prompt: "vsh$ ".to_owned(),
            ..Config::default()
        };
        let mut sh = Interpreter::new(&config);
        let prompts = MemWriter::new();
        let mut input = BufReadLines::new(Cursor::new("exit\n"), prompts.clone());

        sh.repl(&mut input);

        assert_eq!(prompts.contents(), "vsh$ ");
    }
}
