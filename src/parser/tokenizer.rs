//! Line-oriented Dockerfile tokenizer.
//!
//! Turns raw bytes into physical lines plus one raw AST node per
//! continuation-merged logical line. Handles the UTF-8 BOM, the `# escape=`
//! parser directive, comment lines inside continuations, and blank
//! continuation lines (tolerated, warned about).

use std::io::Read;

use crate::error::ParseError;
use crate::parser::instruction::{self, Node};

/// Default line-continuation escape character.
pub const DEFAULT_ESCAPE: char = '\\';

/// Upper bound on a single physical line, mirroring the classic scanner
/// buffer limit. Exceeding it is fatal and names this limit in the error.
pub const MAX_LINE_BYTES: usize = 3 * 1024 * 1024;

/// Everything the tokenizer produces for one Dockerfile stream.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// Physical lines, in order, without line terminators.
    pub lines: Vec<String>,
    /// Document root; children are the top-level instruction nodes.
    pub root: Node,
    /// The active escape character (`\` unless overridden by a directive).
    pub escape_token: char,
    /// Non-fatal observations (blank continuation lines, empty file).
    pub warnings: Vec<String>,
}

/// Tokenize a Dockerfile from any reader.
pub fn parse<R: Read>(mut reader: R) -> Result<ParseOutcome, ParseError> {
    let mut raw = Vec::new();
    reader.read_to_end(&mut raw)?;
    parse_bytes(&raw)
}

/// Tokenize a Dockerfile held in memory.
pub fn parse_bytes(raw: &[u8]) -> Result<ParseOutcome, ParseError> {
    let text = String::from_utf8_lossy(raw);
    let lines = split_physical_lines(&text);

    for (idx, line) in lines.iter().enumerate() {
        if line.len() > MAX_LINE_BYTES {
            return Err(ParseError::LineTooLong {
                line: idx + 1,
                limit: MAX_LINE_BYTES,
            });
        }
    }

    let mut root = Node::root();
    let mut warnings = Vec::new();
    let mut escape = DEFAULT_ESCAPE;
    let mut escape_seen = false;
    let mut directive_possible = true;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].as_str();
        let trimmed = line.trim();

        if directive_possible {
            if let Some((key, value)) = parse_directive(trimmed) {
                if key == "escape" {
                    if escape_seen {
                        return Err(ParseError::DuplicateEscapeDirective { line: i + 1 });
                    }
                    escape = match value {
                        "\\" => '\\',
                        "`" => '`',
                        other => {
                            return Err(ParseError::InvalidEscapeDirective {
                                token: other.to_string(),
                            })
                        }
                    };
                    escape_seen = true;
                    i += 1;
                    continue;
                }
                // Unrecognized directive keys are plain comments; they end
                // the directive prologue.
                directive_possible = false;
                i += 1;
                continue;
            }
            directive_possible = false;
        } else if let Some((key, _)) = parse_directive(trimmed) {
            // A late escape directive no longer takes effect; a *second* one
            // is fatal regardless of position.
            if key == "escape" && escape_seen {
                return Err(ParseError::DuplicateEscapeDirective { line: i + 1 });
            }
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            i += 1;
            continue;
        }

        let start_line = i + 1;
        let mut end_line = start_line;
        let mut merged = String::new();
        let mut raw_lines = vec![lines[i].clone()];
        let mut current = line;

        loop {
            match strip_continuation(current, escape) {
                Some(fragment) => {
                    merged.push_str(fragment);
                    // Find the next physical line that continues the
                    // instruction: comments are skipped outright, blank
                    // lines are tolerated with a warning.
                    let mut found = false;
                    while i + 1 < lines.len() {
                        i += 1;
                        let next = lines[i].as_str();
                        let next_trimmed = next.trim();
                        if next_trimmed.starts_with('#') {
                            continue;
                        }
                        if next_trimmed.is_empty() {
                            warnings.push(format!(
                                "empty continuation line found in instruction starting at line {}",
                                start_line
                            ));
                            continue;
                        }
                        raw_lines.push(lines[i].clone());
                        end_line = i + 1;
                        current = next;
                        found = true;
                        break;
                    }
                    if !found {
                        break;
                    }
                }
                None => {
                    merged.push_str(current.trim_end());
                    break;
                }
            }
        }
        i += 1;

        let original = raw_lines.join("\n");
        let node = instruction::parse_line(&merged, start_line as i32, end_line as i32, &original);
        if root.start_line < 0 {
            root.start_line = node.start_line;
        }
        root.end_line = node.end_line;
        root.children.push(node);
    }

    if root.children.is_empty() {
        log::debug!("tokenizer found no instructions");
        warnings.push("file with no instructions".to_string());
    }

    Ok(ParseOutcome {
        lines,
        root,
        escape_token: escape,
        warnings,
    })
}

/// Split into physical lines, dropping terminators and the BOM on line 1.
fn split_physical_lines(text: &str) -> Vec<String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut lines: Vec<String> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l).to_string())
        .collect();
    if lines.last().map(|l| l.is_empty()).unwrap_or(false) {
        lines.pop();
    }
    lines
}

/// Recognize a `# key=value` parser directive on an already-trimmed line.
fn parse_directive(trimmed: &str) -> Option<(String, &str)> {
    let rest = trimmed.strip_prefix('#')?;
    let rest = rest.trim();
    let eq = rest.find('=')?;
    let key = rest[..eq].trim();
    let value = rest[eq + 1..].trim();
    if !key.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        || !key.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some((key.to_ascii_lowercase(), value))
}

/// If the line ends with the (optionally whitespace-padded) escape char,
/// return the content with the escape stripped.
fn strip_continuation(line: &str, escape: char) -> Option<&str> {
    line.trim_end().strip_suffix(escape)
}
