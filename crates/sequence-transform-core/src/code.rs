//! The engine's 8-bit symbol alphabet.
//!
//! Codes below 128 are printable ASCII. Codes from 128 up are meta-symbols:
//! back-references into previously shown text and sequence tokens (magic keys).

/// One engine symbol.
pub type Code = u8;

/// Word boundary, also the sentinel the history buffer is reset to.
pub const BOUNDARY: Code = b' ';

/// Placeholder returned when nothing can be read.
pub const NONE: Code = 0;

const BACKREF_BASE: Code = 0x80;
const TOKEN_BASE: Code = 0xC0;

/// Largest distance a back-reference can encode.
pub const MAX_BACKREF: u8 = TOKEN_BASE - BACKREF_BASE - 1;

/// Number of distinct sequence tokens.
pub const TOKEN_COUNT: usize = 0x40;

const TOKEN_SYMBOLS: [char; 8] = ['👆', '👇', '👈', '👉', '🔁', '✨', '🪄', '💫'];

#[must_use]
pub const fn is_printable(code: Code) -> bool {
    code != NONE && code < BACKREF_BASE
}

#[must_use]
pub const fn is_meta(code: Code) -> bool {
    code >= BACKREF_BASE
}

/// Back-reference distance carried by `code`, if it is one.
#[must_use]
pub const fn backref_distance(code: Code) -> Option<u8> {
    if code > BACKREF_BASE && code < TOKEN_BASE {
        Some(code - BACKREF_BASE)
    } else {
        None
    }
}

/// Code standing for the `n`-th visible character before the trigger.
#[must_use]
pub const fn backref(n: u8) -> Option<Code> {
    if n == 0 || n > MAX_BACKREF {
        return None;
    }
    Some(BACKREF_BASE + n)
}

#[must_use]
pub const fn is_token(code: Code) -> bool {
    code >= TOKEN_BASE
}

#[must_use]
pub fn token(index: usize) -> Option<Code> {
    if index >= TOKEN_COUNT {
        return None;
    }
    u8::try_from(index).ok().map(|i| TOKEN_BASE + i)
}

/// Lower-cases ASCII letters; every other code is returned unchanged.
#[must_use]
pub const fn to_lower(code: Code) -> Code {
    if is_printable(code) {
        code.to_ascii_lowercase()
    } else {
        code
    }
}

/// Maps a typed character to its code. Only ASCII and the token symbols are
/// part of the alphabet.
#[must_use]
pub fn from_char(ch: char) -> Option<Code> {
    if ch.is_ascii() && ch != '\0' {
        return u8::try_from(ch).ok();
    }
    TOKEN_SYMBOLS
        .iter()
        .position(|&s| s == ch)
        .and_then(token)
}

/// Renders a code for display and diagnostics.
#[must_use]
pub fn to_char(code: Code) -> char {
    if is_printable(code) {
        return char::from(code);
    }
    if is_token(code) {
        let index = usize::from(code - TOKEN_BASE);
        return TOKEN_SYMBOLS.get(index).copied().unwrap_or('⁂');
    }
    if backref_distance(code).is_some() {
        return '*';
    }
    '\u{FFFD}'
}

/// Encodes a string, failing on characters outside the alphabet.
#[must_use]
pub fn encode_str(text: &str) -> Option<Vec<Code>> {
    text.chars().map(from_char).collect()
}

#[must_use]
pub fn decode_codes(codes: &[Code]) -> String {
    codes.iter().copied().map(to_char).collect()
}

/// Special behaviour attached to a rule, carried out by the driver after the
/// completion has been emitted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    #[default]
    None,
    RepeatLastKey,
    OneShotShift,
    SuppressBoundary,
}

impl FunctionCode {
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => FunctionCode::None,
            1 => FunctionCode::RepeatLastKey,
            2 => FunctionCode::OneShotShift,
            _ => FunctionCode::SuppressBoundary,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            FunctionCode::None => 0,
            FunctionCode::RepeatLastKey => 1,
            FunctionCode::OneShotShift => 2,
            FunctionCode::SuppressBoundary => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FunctionCode::None => "none",
            FunctionCode::RepeatLastKey => "repeat_last_key",
            FunctionCode::OneShotShift => "one_shot_shift",
            FunctionCode::SuppressBoundary => "suppress_boundary",
        }
    }
}
