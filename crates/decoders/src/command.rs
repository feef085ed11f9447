//! Command vocabulary for the serial wire protocol.
//!
//! Lines are single tokens, matched exactly after trailing whitespace is trimmed and the
//! token is upper-cased. There is no prefix or fuzzy matching.

use core_types::{Frame, NavigationIntent};

pub const MOVE_UP_TOKENS: [&str; 3] = ["UP", "CW", "CLOCKWISE"];
pub const MOVE_DOWN_TOKENS: [&str; 4] = ["DOWN", "CCW", "COUNTERCLOCKWISE", "COUNTER-CLOCKWISE"];
pub const ENTER_TOKENS: [&str; 3] = ["ENTER", "PRESS", "BUTTON"];

/// Map a command token to its intent. Returns `None` for anything outside the vocabulary.
pub fn decode(token: &str) -> Option<NavigationIntent> {
    let token = token.trim_end().to_uppercase();
    let token = token.as_str();

    if MOVE_UP_TOKENS.contains(&token) {
        Some(NavigationIntent::MoveUp)
    } else if MOVE_DOWN_TOKENS.contains(&token) {
        Some(NavigationIntent::MoveDown)
    } else if ENTER_TOKENS.contains(&token) {
        Some(NavigationIntent::Enter)
    } else {
        None
    }
}

/// Decode a framed line. Undecodable bytes are dropped before lookup.
pub fn decode_frame(frame: &Frame) -> Option<NavigationIntent> {
    decode(&frame.text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_documented_tokens() {
        for t in MOVE_UP_TOKENS {
            assert_eq!(decode(t), Some(NavigationIntent::MoveUp), "{t}");
        }
        for t in MOVE_DOWN_TOKENS {
            assert_eq!(decode(t), Some(NavigationIntent::MoveDown), "{t}");
        }
        for t in ENTER_TOKENS {
            assert_eq!(decode(t), Some(NavigationIntent::Enter), "{t}");
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(decode("cw"), Some(NavigationIntent::MoveUp));
        assert_eq!(decode("Counter-Clockwise"), Some(NavigationIntent::MoveDown));
        assert_eq!(decode("eNtEr"), Some(NavigationIntent::Enter));
    }

    #[test]
    fn test_trailing_whitespace_trimmed() {
        assert_eq!(decode("UP\r\n"), Some(NavigationIntent::MoveUp));
        assert_eq!(decode("press  \t"), Some(NavigationIntent::Enter));
    }

    #[test]
    fn test_unknown_tokens() {
        for t in ["", "banana", "U", "UPP", "UP DOWN", "CLOCK", "counter clockwise", " UP"] {
            assert_eq!(decode(t), None, "{t:?}");
        }
    }

    #[test]
    fn test_decode_frame_ignores_invalid_utf8() {
        let frame = Frame::new(vec![b'C', 0xFE, b'C', b'W']);
        assert_eq!(decode_frame(&frame), Some(NavigationIntent::MoveDown));
    }
}
