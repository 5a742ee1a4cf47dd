use argh::FromArgs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

pub const DEFAULT_PROMPT: &str = "> ";

#[derive(FromArgs, Debug, Clone, PartialEq, Eq)]
/// A small interactive shell with builtins and N-stage pipelines.
pub struct Config {
    #[argh(option, default = "String::from(DEFAULT_PROMPT)")]
    /// text printed before each input line.
    pub prompt: String,

    #[argh(option)]
    /// file to load line history from on start and save it to on exit.
    pub history: Option<PathBuf>,

    #[argh(switch)]
    /// read plain lines from standard input even when it is a terminal.
    pub no_editor: bool,

    #[argh(switch, short = 'v')]
    /// log debug events to standard error.
    pub verbose: bool,
}

impl Config {
    /// The line editor is only worth using on an interactive terminal.
    pub fn use_editor(&self) -> bool {
        !self.no_editor && io::stdin().is_terminal()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_owned(),
            history: None,
            no_editor: false,
            verbose: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_flags() {
        let config = Config::from_args(&["pipesh"], &[]).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parses_all_flags() {
        let config = Config::from_args(
            &["pipesh"],
            &["--prompt", "$ ", "--history", "/tmp/hist", "--no-editor", "-v"],
        )
        .unwrap();
        assert_eq!(config.prompt, "$ ");
        assert_eq!(config.history, Some(PathBuf::from("/tmp/hist")));
        assert!(config.no_editor);
        assert!(config.verbose);
        assert!(!config.use_editor());
    }

    #[test]
    fn rejects_unknown_flag() {
        assert!(Config::from_args(&["pipesh"], &["--bogus"]).is_err());
    }
}
