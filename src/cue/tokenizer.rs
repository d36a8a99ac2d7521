use crate::cue::error::{CueError, CueResult};
use std::iter::Enumerate;
use std::str::Lines;

const BOM: char = '\u{feff}';

/// One non-blank line of a CUE sheet, split into its command and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveRecord {
    pub line: usize,
    pub command: String,
    pub args: Vec<String>,
}

/// Single pass over CUE sheet text yielding one record per directive line.
pub struct Tokenizer<'a> {
    lines: Enumerate<Lines<'a>>,
}

pub fn tokenize(text: &str) -> Tokenizer<'_> {
    Tokenizer {
        lines: text.strip_prefix(BOM).unwrap_or(text).lines().enumerate(),
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = CueResult<DirectiveRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, raw) in self.lines.by_ref() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            return Some(tokenize_line(idx + 1, line));
        }
        None
    }
}

fn tokenize_line(line_no: usize, line: &str) -> CueResult<DirectiveRecord> {
    let mut tokens = split_tokens(line_no, line)?.into_iter();

    // split_tokens never yields an empty list for a non-empty trimmed line
    let command = tokens.next().unwrap_or_default();
    if !is_command_word(&command.text) || command.quoted {
        return Err(CueError::MalformedLine {
            line: line_no,
            found: command.text,
        });
    }

    Ok(DirectiveRecord {
        line: line_no,
        command: command.text.to_ascii_uppercase(),
        args: tokens.map(|t| t.text).collect(),
    })
}

fn is_command_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Default)]
struct Token {
    text: String,
    quoted: bool,
}

fn split_tokens(line_no: usize, line: &str) -> CueResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '"' => {
                        closed = true;
                        break;
                    }
                    '\\' => match chars.peek().copied() {
                        Some(next) if next == '"' || next == '\\' => {
                            text.push(next);
                            chars.next();
                        }
                        _ => text.push('\\'),
                    },
                    _ => text.push(c),
                }
            }
            if !closed {
                return Err(CueError::UnterminatedQuote { line: line_no });
            }
            tokens.push(Token { text, quoted: true });
        } else {
            let mut text = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                text.push(c);
                chars.next();
            }
            tokens.push(Token {
                text,
                quoted: false,
            });
        }
    }

    Ok(tokens)
}
