use crate::command::{CommandSegment, ExitCode};
use crate::error::{Result, ShellError};
use nix::sys::signal::Signal;
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::debug;

/// A program that is not a builtin, run as a child process.
///
/// The program name is resolved by the operating system (`PATH` search), and the
/// arguments are handed over as a list, never re-parsed by a shell.
#[derive(Debug, Clone)]
pub struct ExternalCommand<'a> {
    segment: &'a CommandSegment,
}

impl<'a> ExternalCommand<'a> {
    pub fn new(segment: &'a CommandSegment) -> Self {
        Self { segment }
    }

    pub fn program(&self) -> &'a str {
        self.segment.program()
    }

    /// Starts the program with the given standard input and output; standard error
    /// is always inherited. Does not wait.
    pub fn spawn(&self, stdin: Stdio, stdout: Stdio) -> Result<Child> {
        let child = Command::new(self.program())
            .args(self.segment.args())
            .stdin(stdin)
            .stdout(stdout)
            .spawn()
            .map_err(|source| ShellError::from_spawn(self.program(), source))?;
        debug!(program = self.program(), pid = child.id(), "spawned");
        Ok(child)
    }

    /// Runs the program with the shell's own standard streams and waits for it.
    pub fn run(&self) -> Result<ExitStatus> {
        self.run_with(Stdio::inherit(), Stdio::inherit())
    }

    pub fn run_with(&self, stdin: Stdio, stdout: Stdio) -> Result<ExitStatus> {
        let mut child = self.spawn(stdin, stdout)?;
        wait(&mut child, self.program())
    }
}

/// Blocks until `child` has exited or was killed by a signal.
///
/// A stopped child does not end the wait.
pub(crate) fn wait(child: &mut Child, program: &str) -> Result<ExitStatus> {
    let status = child.wait().map_err(|source| ShellError::WaitFailed {
        program: program.to_owned(),
        source,
    })?;
    debug!(program, pid = child.id(), %status, "reaped");
    Ok(status)
}

/// Converts a wait status into a shell exit code.
pub fn exit_code(status: ExitStatus) -> ExitCode {
    match status.code() {
        Some(code) => code,
        None => terminated_by_signal(status),
    }
}

fn terminated_by_signal(status: ExitStatus) -> ExitCode {
    if let Some(signal) = status.signal() {
        128 + signal
    } else if status.core_dumped() {
        255
    } else {
        -1
    }
}

/// Name of the signal that killed the child, e.g. `SIGSEGV`, if it was killed by one.
pub fn signal_name(status: ExitStatus) -> Option<String> {
    let signal = status.signal()?;
    Some(match Signal::try_from(signal) {
        Ok(sig) => sig.as_str().to_owned(),
        Err(_) => format!("signal {signal}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn segment(words: &[&str]) -> CommandSegment {
        CommandSegment::new(words.iter().map(|w| w.to_string()).collect()).unwrap()
    }

    #[test]
    fn run_reports_exit_status() {
        let ok = ExternalCommand::new(&segment(&["true"])).run_with(Stdio::null(), Stdio::null());
        assert_eq!(exit_code(ok.unwrap()), 0);

        let fail = ExternalCommand::new(&segment(&["false"])).run_with(Stdio::null(), Stdio::null());
        assert_eq!(exit_code(fail.unwrap()), 1);
    }

    #[test]
    fn arguments_are_passed_as_a_list() {
        let seg = segment(&["echo", "a", "b*", "$HOME"]);
        let mut out = tempfile::tempfile().unwrap();
        let stdout = out.try_clone().unwrap();

        let status = ExternalCommand::new(&seg)
            .run_with(Stdio::null(), Stdio::from(stdout))
            .unwrap();
        assert!(status.success());

        let mut text = String::new();
        std::io::Seek::rewind(&mut out).unwrap();
        out.read_to_string(&mut text).unwrap();
        assert_eq!(text, "a b* $HOME\n");
    }

    #[test]
    fn missing_program_is_not_found() {
        let seg = segment(&["pipesh-test-no-such-program"]);
        let err = ExternalCommand::new(&seg).run().unwrap_err();
        assert!(matches!(err, ShellError::ProgramNotFound { ref program } if program == "pipesh-test-no-such-program"));
    }

    #[test]
    fn non_executable_file_cannot_be_executed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        std::fs::write(&path, "not a program\n").unwrap();

        let seg = segment(&[path.to_str().unwrap()]);
        let err = ExternalCommand::new(&seg).run().unwrap_err();
        assert!(matches!(err, ShellError::ExecFailed { .. }), "{err:?}");
    }

    #[test]
    fn signalled_child_maps_to_128_plus_signal() {
        let seg = segment(&["sh", "-c", "kill -KILL $$"]);
        let status = ExternalCommand::new(&seg).run_with(Stdio::null(), Stdio::null()).unwrap();
        assert_eq!(exit_code(status), 128 + 9);
        assert_eq!(signal_name(status).as_deref(), Some("SIGKILL"));
    }

    #[test]
    fn normal_exit_has_no_signal_name() {
        let status = ExternalCommand::new(&segment(&["true"])).run().unwrap();
        assert_eq!(signal_name(status), None);
    }
}
