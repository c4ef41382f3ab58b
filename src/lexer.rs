//! Tokenization of a raw input line.
//!
//! Tokens are separated by whitespace; empty fields are dropped. There is no
//! quoting or escaping: every non-whitespace run is a token as-is.

use crate::error::LexingError;

/// Split `line` into tokens, refusing more than `max_tokens` of them.
pub fn split_into_tokens(line: &str, max_tokens: usize) -> Result<Vec<String>, LexingError> {
    let mut tokens = Vec::new();
    for word in line.split_whitespace() {
        if tokens.len() == max_tokens {
            return Err(LexingError::TooManyArguments { limit: max_tokens });
        }
        tokens.push(word.to_string());
    }
    Ok(tokens)
}

/// Check the length bound of a raw line.
///
/// `max_line` counts the line terminator, so the content itself may use at most
/// `max_line - 1` bytes. A trailing `\n` (or `\r\n`) is not counted.
pub fn check_line_length(line: &str, max_line: usize) -> Result<(), LexingError> {
    let content = line.trim_end_matches(['\n', '\r']);
    let limit = max_line.saturating_sub(1);
    if content.len() > limit {
        Err(LexingError::LineTooLong { limit })
    } else {
        Ok(())
    }
}

/// Whether the line holds nothing but whitespace.
pub fn is_blank(line: &str) -> bool {
    line.chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_any_whitespace_and_drops_empty_fields() {
        let tokens = split_into_tokens("  ls\t-l   /tmp \n", 16).unwrap();
        assert_eq!(tokens, vec!["ls", "-l", "/tmp"]);
    }

    #[test]
    fn blank_line_gives_no_tokens() {
        assert!(split_into_tokens(" \t \n", 16).unwrap().is_empty());
        assert!(is_blank(" \t \n"));
        assert!(is_blank(""));
        assert!(!is_blank("  x "));
    }

    #[test]
    fn quotes_are_not_special() {
        let tokens = split_into_tokens("echo \"a b\"", 16).unwrap();
        assert_eq!(tokens, vec!["echo", "\"a", "b\""]);
    }

    #[test]
    fn token_limit_is_inclusive() {
        assert_eq!(split_into_tokens("a b c", 3).unwrap().len(), 3);
        assert_eq!(
            split_into_tokens("a b c d", 3),
            Err(LexingError::TooManyArguments { limit: 3 })
        );
    }

    #[test]
    fn line_length_ignores_the_terminator() {
        let line = format!("{}\n", "x".repeat(79));
        assert_eq!(check_line_length(&line, 80), Ok(()));

        let line = "x".repeat(80);
        assert_eq!(
            check_line_length(&line, 80),
            Err(LexingError::LineTooLong { limit: 79 })
        );
    }
}
