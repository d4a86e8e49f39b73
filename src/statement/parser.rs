use crate::error::ParseError;

use super::scanner::{
    State, is_block_comment_start, is_line_comment_start, scan_digits, step_comment, step_quoted,
};
use super::{Segment, StatementTemplate, TemplateParser, ValueKind};

/// Default parser for `{}` / `{N}` / `{N:kind}` placeholders.
///
/// Quoted literals are skipped using the target dialect's rules: [`BraceParser::mysql`]
/// (the default) honours backslash escapes, [`BraceParser::standard`] only doubled quotes.
#[derive(Debug, Clone, Copy)]
pub struct BraceParser {
    backslash_escapes: bool,
}

impl BraceParser {
    /// MySQL quoting: `\'` stays inside a literal.
    #[must_use]
    pub const fn mysql() -> Self {
        Self {
            backslash_escapes: true,
        }
    }

    /// Standard SQL quoting (`SQLite`, `PostgreSQL`): `\` is an ordinary character.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            backslash_escapes: false,
        }
    }

    #[must_use]
    pub fn backslash_escapes(&self) -> bool {
        self.backslash_escapes
    }
}

impl Default for BraceParser {
    fn default() -> Self {
        Self::mysql()
    }
}

impl TemplateParser for BraceParser {
    fn parse(&self, sql: &str) -> Result<StatementTemplate, ParseError> {
        let bytes = sql.as_bytes();
        let mut segments: Vec<Segment> = Vec::new();
        let mut state = State::Normal;
        let mut literal_start = 0;
        let mut next_auto = 0;
        let mut idx = 0;

        while idx < bytes.len() {
            let advance = match state {
                State::Normal => match bytes[idx] {
                    b'\'' => {
                        state = State::SingleQuoted;
                        1
                    }
                    b'"' => {
                        state = State::DoubleQuoted;
                        1
                    }
                    b'`' => {
                        state = State::Backticked;
                        1
                    }
                    _ if is_line_comment_start(bytes, idx) => {
                        state = State::LineComment;
                        1
                    }
                    _ if is_block_comment_start(bytes, idx) => {
                        state = State::BlockComment(1);
                        2
                    }
                    b'{' if bytes.get(idx + 1) == Some(&b'{') => {
                        push_literal(&mut segments, &sql[literal_start..=idx]);
                        literal_start = idx + 2;
                        2
                    }
                    b'{' => {
                        push_literal(&mut segments, &sql[literal_start..idx]);
                        let close = sql[idx + 1..]
                            .find('}')
                            .map(|off| idx + 1 + off)
                            .ok_or_else(|| ParseError::new(idx, "unterminated placeholder"))?;
                        segments.push(parse_placeholder(
                            &sql[idx + 1..close],
                            idx,
                            &mut next_auto,
                        )?);
                        literal_start = close + 1;
                        close + 1 - idx
                    }
                    _ => 1,
                },
                State::SingleQuoted => {
                    let (next, n) =
                        step_quoted(bytes, idx, b'\'', state, self.backslash_escapes);
                    state = next;
                    n
                }
                State::DoubleQuoted => {
                    let (next, n) =
                        step_quoted(bytes, idx, b'"', state, self.backslash_escapes);
                    state = next;
                    n
                }
                State::Backticked => {
                    let (next, n) =
                        step_quoted(bytes, idx, b'`', state, self.backslash_escapes);
                    state = next;
                    n
                }
                State::LineComment | State::BlockComment(_) => {
                    let (next, n) = step_comment(bytes, idx, state);
                    state = next;
                    n
                }
            };
            idx += advance;
        }

        if literal_start < sql.len() {
            push_literal(&mut segments, &sql[literal_start..]);
        }
        Ok(StatementTemplate::new(sql, segments))
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Literal(prev)) = segments.last_mut() {
        prev.push_str(text);
    } else {
        segments.push(Segment::Literal(text.to_string()));
    }
}

fn parse_placeholder(
    body: &str,
    position: usize,
    next_auto: &mut usize,
) -> Result<Segment, ParseError> {
    let (index_part, kind_part) = match body.split_once(':') {
        Some((index, kind)) => (index, Some(kind)),
        None => (body, None),
    };

    let index = if index_part.is_empty() {
        let index = *next_auto;
        *next_auto += 1;
        index
    } else {
        match scan_digits(index_part) {
            Some(0) => return Err(ParseError::new(position, "placeholder indexes start at 1")),
            Some(n) => n - 1,
            None => {
                return Err(ParseError::new(
                    position,
                    format!("invalid placeholder index '{index_part}'"),
                ));
            }
        }
    };

    let kind = match kind_part {
        None => None,
        Some(tag) => Some(ValueKind::from_tag(tag).ok_or_else(|| {
            ParseError::new(position, format!("unknown placeholder kind '{tag}'"))
        })?),
    };

    Ok(Segment::Placeholder { index, kind })
}
