//! Where the shell reads its lines from and where command output goes.

use crate::error::{Result, ShellError};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufRead, Result as IoResult, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::rc::Rc;
use tracing::debug;

/// A source of command lines.
pub trait LineSource {
    /// Shows `prompt` and reads one line.
    ///
    /// Returns [`ShellError::InputClosed`] once the input is exhausted.
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

/// Interactive input through the rustyline line editor, with history.
pub struct EditorLines {
    editor: DefaultEditor,
    history: Option<PathBuf>,
}

impl EditorLines {
    /// Creates the editor and loads `history` if the file exists.
    pub fn new(history: Option<PathBuf>) -> Result<Self> {
        let mut editor = DefaultEditor::new()?;
        if let Some(path) = &history {
            match editor.load_history(path) {
                Ok(()) => debug!(path = %path.display(), "loaded history"),
                // A missing file is normal on first start.
                Err(err) => debug!(path = %path.display(), %err, "history not loaded"),
            }
        }
        Ok(Self { editor, history })
    }

    /// Writes the history back to the file it was loaded from, if any.
    pub fn save_history(&mut self) -> Result<()> {
        if let Some(path) = &self.history {
            self.editor.save_history(path)?;
            debug!(path = %path.display(), "saved history");
        }
        Ok(())
    }
}

impl LineSource for EditorLines {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        loop {
            match self.editor.readline(prompt) {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        self.editor.add_history_entry(line.as_str())?;
                    }
                    return Ok(line);
                }
                // Ctrl-C drops the line being edited.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Err(ShellError::InputClosed),
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Plain line input from any buffered reader; the prompt goes to `prompt_out`.
pub struct BufReadLines<R, W> {
    input: R,
    prompt_out: W,
}

impl<R: BufRead, W: Write> BufReadLines<R, W> {
    pub fn new(input: R, prompt_out: W) -> Self {
        Self { input, prompt_out }
    }
}

impl<R: BufRead, W: Write> LineSource for BufReadLines<R, W> {
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        self.prompt_out
            .write_all(prompt.as_bytes())
            .and_then(|()| self.prompt_out.flush())
            .map_err(|source| ShellError::Io { operation: "prompt", source })?;

        // Raw bytes: a line that is not valid UTF-8 must not end the session.
        let mut buf = Vec::new();
        let read = self
            .input
            .read_until(b'\n', &mut buf)
            .map_err(|source| ShellError::Io { operation: "read", source })?;
        if read == 0 {
            return Err(ShellError::InputClosed);
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Destination of command output: builtins write to it and children get it as
/// their standard output.
#[derive(Debug, Default)]
pub enum OutputSink {
    /// The shell's own standard output.
    #[default]
    Inherit,
    File(File),
}

impl OutputSink {
    /// A handle suitable as a child's standard output.
    pub fn stdio(&self) -> Result<Stdio> {
        match self {
            OutputSink::Inherit => Ok(Stdio::inherit()),
            OutputSink::File(file) => file
                .try_clone()
                .map(Stdio::from)
                .map_err(|source| ShellError::Io { operation: "dup", source }),
        }
    }

    /// A writer for builtin output.
    pub fn writer(&self) -> Box<dyn Write + '_> {
        match self {
            OutputSink::Inherit => Box::new(io::stdout().lock()),
            OutputSink::File(file) => Box::new(file),
        }
    }
}

/// Memory-backed writer whose bytes can be inspected after it was handed away.
#[derive(Clone, Default)]
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected bytes as (lossy) UTF-8.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.borrow()).into_owned()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
