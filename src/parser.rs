use crate::command::{Command, PipelineSpec};
use crate::error::{LineError, ParsingError};
use crate::lexer;

/// The shape of one input line after tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Only whitespace; nothing to run.
    Blank,
    Simple(Command),
    Pipeline(PipelineSpec),
}

/// Bounds applied while parsing a line.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    /// Maximum line length in bytes, terminator included.
    pub max_line: usize,
    /// Maximum number of tokens in a single command.
    pub max_args: usize,
}

/// Turn a raw line into something the interpreter can run.
///
/// A line is split at its `|`, and each side is tokenized on its own. Lines
/// with more than one `|`, or with nothing on one side of it, are rejected.
pub fn parse_line(line: &str, limits: Limits) -> Result<ParsedLine, LineError> {
    lexer::check_line_length(line, limits.max_line)?;
    if lexer::is_blank(line) {
        return Ok(ParsedLine::Blank);
    }

    match line.split_once('|') {
        None => {
            let tokens = lexer::split_into_tokens(line, limits.max_args)?;
            // not blank, so there is at least one token
            Ok(Command::new(tokens).map_or(ParsedLine::Blank, ParsedLine::Simple))
        }
        Some((_, after)) if after.contains('|') => Err(ParsingError::MultiplePipes.into()),
        Some((before, after)) => {
            let left = parse_side(before, limits)?;
            let right = parse_side(after, limits)?;
            Ok(ParsedLine::Pipeline(PipelineSpec { left, right }))
        }
    }
}

fn parse_side(text: &str, limits: Limits) -> Result<Command, LineError> {
    let tokens = lexer::split_into_tokens(text, limits.max_args)?;
    Command::new(tokens).ok_or_else(|| ParsingError::EmptyPipelineSide.into())
}
