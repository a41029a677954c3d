//! Tokenization and flag validation for raw console lines.
//!
//! A line is `<command>( -<flag>)*` with tokens separated by single
//! spaces. The first token is the command name; every later token must
//! carry the leading marker and is passed to the handler with the marker
//! stripped, in its original position.

use crate::errors::LineError;

/// Marker character that must prefix every token after the command name.
pub const FLAG_MARKER: char = '-';

/// A validated line: the command name and its stripped flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// First token of the line.
    pub command: String,
    /// Flag tokens with the marker removed, in original order.
    /// Duplicates are preserved; a lone marker contributes an empty flag.
    pub flags: Vec<String>,
}

/// Splits a raw line into a command name and validated flags.
///
/// Returns `Ok(None)` for an empty line, which the dispatch loop skips
/// silently.
///
/// # Errors
///
/// Returns [`LineError::MalformedFlag`] when any flag candidate lacks the
/// marker; the whole line is rejected in that case.
pub fn parse_line(line: &str) -> Result<Option<ParsedLine>, LineError> {
    if line.is_empty() {
        return Ok(None);
    }
    let mut tokens = line.split(' ');
    let command = tokens.next().unwrap_or_default().to_owned();
    let mut flags = Vec::new();
    for token in tokens {
        match token.strip_prefix(FLAG_MARKER) {
            Some(flag) => flags.push(flag.to_owned()),
            None => {
                return Err(LineError::MalformedFlag {
                    token: token.to_owned(),
                });
            }
        }
    }
    Ok(Some(ParsedLine { command, flags }))
}
