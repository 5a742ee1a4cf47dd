//! Lexical analysis of one input line.
//!
//! Words are separated by runs of space, tab, carriage return, newline or the
//! ASCII bell character. There is no quoting: every other byte is part of a word.
//! A word consisting of exactly `|` separates pipeline stages.

use regex::Regex;
use std::sync::LazyLock;

/// The word that separates two pipeline stages.
pub const PIPE: &str = "|";

static DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n\x07]+").expect("delimiter pattern is valid"));

/// The words of one input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSequence {
    tokens: Vec<String>,
    has_pipe: bool,
}

impl TokenSequence {
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// True when at least one token is the pipe separator.
    pub fn has_pipe(&self) -> bool {
        self.has_pipe
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Splits `line` into words, collapsing runs of delimiters and dropping empty words.
pub fn split_into_tokens(line: &str) -> TokenSequence {
    let tokens: Vec<String> = DELIMITERS
        .split(line)
        .filter(|word| !word.is_empty())
        .map(str::to_owned)
        .collect();
    let has_pipe = tokens.iter().any(|t| t == PIPE);
    TokenSequence { tokens, has_pipe }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_line() {
        let seq = split_into_tokens("");
        assert!(seq.is_empty());
        assert!(!seq.has_pipe());

        let seq = split_into_tokens(" \t\r\n");
        assert!(seq.is_empty());
    }

    #[test]
    fn test_words_are_normalized() {
        let line = "  ls \t -l\r\n   /tmp  \n";
        let seq = split_into_tokens(line);
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.tokens().join(" "), "ls -l /tmp");
        assert_eq!(
            seq.tokens().join(" "),
            line.split_whitespace().collect::<Vec<_>>().join(" ")
        );
    }

    #[test]
    fn test_bell_is_a_delimiter() {
        let seq = split_into_tokens("echo\x07hello\x07\x07world");
        assert_eq!(seq.tokens(), ["echo", "hello", "world"]);
    }

    #[test]
    fn test_pipe_flag() {
        let seq = split_into_tokens("echo a | tr a b");
        assert!(seq.has_pipe());
        assert_eq!(seq.tokens(), ["echo", "a", "|", "tr", "a", "b"]);

        assert!(!split_into_tokens("echo a b").has_pipe());
    }

    #[test]
    fn test_pipe_must_be_a_whole_word() {
        let seq = split_into_tokens("echo a|b ||");
        assert!(!seq.has_pipe());
        assert_eq!(seq.tokens(), ["echo", "a|b", "||"]);
    }

    #[test]
    fn test_many_tokens() {
        let line = (0..10_000).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let seq = split_into_tokens(&line);
        assert_eq!(seq.len(), 10_000);
        assert_eq!(seq.tokens()[9_999], "9999");
    }
}
