/// Lexical context while walking statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backticked,
    LineComment,
    BlockComment(u32),
}

pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    (bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')) || bytes.get(idx) == Some(&b'#')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Advance through a quoted section. Returns the next state and how many bytes were consumed.
///
/// Doubled quotes (`''`) always stay inside the literal. Backslash escapes (`\'`) do
/// only when `backslash_escapes` is set; standard SQL treats `\` as an ordinary byte.
pub(super) fn step_quoted(
    bytes: &[u8],
    idx: usize,
    quote: u8,
    state: State,
    backslash_escapes: bool,
) -> (State, usize) {
    let b = bytes[idx];
    if backslash_escapes && b == b'\\' && quote != b'`' {
        return (state, 2);
    }
    if b == quote {
        if bytes.get(idx + 1) == Some(&quote) {
            return (state, 2);
        }
        return (State::Normal, 1);
    }
    (state, 1)
}

/// Advance through a comment. Returns the next state and how many bytes were consumed.
pub(super) fn step_comment(bytes: &[u8], idx: usize, state: State) -> (State, usize) {
    match state {
        State::LineComment if bytes[idx] == b'\n' => (State::Normal, 1),
        State::BlockComment(depth) if is_block_comment_start(bytes, idx) => {
            (State::BlockComment(depth + 1), 2)
        }
        State::BlockComment(depth) if is_block_comment_end(bytes, idx) => {
            if depth == 1 {
                (State::Normal, 2)
            } else {
                (State::BlockComment(depth - 1), 2)
            }
        }
        _ => (state, 1),
    }
}

pub(super) fn scan_digits(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
