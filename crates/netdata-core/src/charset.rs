//! Encoding and character policy checks run before CSV parsing

use crate::error::{Error, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Non-ASCII characters accepted verbatim
const EXTRA_ALLOWED: &[char] = &[
    '\u{2013}', // EN DASH
    '\u{2014}', // EM DASH
    '\u{2011}', // NON-BREAKING HYPHEN
    '\u{00A0}', // NO-BREAK SPACE
];

/// Currency symbols (Sc) and other numbers such as superscripts (No)
static ALLOWED_CATEGORIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\p{Sc}\p{No}]$").expect("category pattern is valid")
});

/// Decode the bytes as UTF-8, reporting the first bad byte with its
/// position (lines split on `\n`, columns counted in bytes)
pub fn check_utf8<'a>(path: &Path, bytes: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(bytes).map_err(|e| {
        let offset = e.valid_up_to();
        let line_start = bytes[..offset]
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |idx| idx + 1);
        Error::Encoding {
            path: path.to_path_buf(),
            byte: bytes[offset],
            offset,
            line: bytes[..line_start].iter().filter(|b| **b == b'\n').count() + 1,
            column: offset - line_start + 1,
            detail: e.to_string(),
        }
    })
}

/// Reject the first character outside the allowed set.
///
/// `\n`, `\r\n` and a lone `\r` all end a line.
pub fn check_charset(path: &Path, text: &str) -> Result<()> {
    let mut line = 1;
    let mut column = 0;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        column += 1;
        if !is_allowed(ch) {
            return Err(Error::UnicodePolicy {
                path: path.to_path_buf(),
                ch,
                name: char_name(ch).unwrap_or_else(|| "UNKNOWN".to_string()),
                line,
                column,
            });
        }
        let line_break = match ch {
            '\n' => true,
            '\r' => chars.peek() != Some(&'\n'),
            _ => false,
        };
        if line_break {
            line += 1;
            column = 0;
        }
    }

    Ok(())
}

/// Check a single character against the policy
pub fn is_allowed(ch: char) -> bool {
    if is_ascii_printable(ch) || EXTRA_ALLOWED.contains(&ch) {
        return true;
    }
    if ch.is_ascii() {
        return false;
    }

    let mut buf = [0u8; 4];
    if ALLOWED_CATEGORIES.is_match(ch.encode_utf8(&mut buf)) {
        return true;
    }

    char_name(ch).is_some_and(|name| name.contains("ARROW"))
}

/// ASCII graphic characters plus space, tab, newline, carriage return,
/// vertical tab and form feed
fn is_ascii_printable(ch: char) -> bool {
    ch.is_ascii_graphic() || matches!(ch, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

fn char_name(ch: char) -> Option<String> {
    unicode_names2::name(ch).map(|name| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("test.csv")
    }

    #[test]
    fn test_allowed_characters() {
        assert!(is_allowed('a'));
        assert!(is_allowed('~'));
        assert!(is_allowed('\t'));
        assert!(is_allowed('\u{2014}'));
        assert!(is_allowed('\u{00A0}'));
        assert!(is_allowed('€'));
        assert!(is_allowed('²'));
        assert!(is_allowed('→'));
        assert!(is_allowed('⇒'));
    }

    #[test]
    fn test_rejected_characters() {
        assert!(!is_allowed('\u{0007}'));
        assert!(!is_allowed('é'));
        assert!(!is_allowed('\u{201C}'));
        assert!(!is_allowed('\u{FEFF}'));
    }

    #[test]
    fn test_invalid_utf8_position() {
        let bytes = b"slug,name\nabc,d\xffe\n";
        let err = check_utf8(path(), bytes).unwrap_err();

        match err {
            Error::Encoding {
                byte,
                offset,
                line,
                column,
                ..
            } => {
                assert_eq!(byte, 0xFF);
                assert_eq!(offset, 15);
                assert_eq!(line, 2);
                assert_eq!(column, 6);
            }
            other => panic!("expected encoding error, got {:?}", other),
        }
    }

    #[test]
    fn test_valid_utf8_passes() {
        let text = check_utf8(path(), "slug\n→ arrow\n".as_bytes()).unwrap();
        assert_eq!(text, "slug\n→ arrow\n");
    }

    #[test]
    fn test_invalid_utf8_on_first_line() {
        let err = check_utf8(path(), b"ab\x80\n").unwrap_err();
        assert!(matches!(err, Error::Encoding { byte: 0x80, offset: 2, line: 1, column: 3, .. }));
    }

    #[test]
    fn test_lone_carriage_return_ends_line() {
        let err = check_charset(path(), "slug\rok\r\nx\u{e9}\n").unwrap_err();
        assert!(matches!(err, Error::UnicodePolicy { line: 3, column: 2, .. }));

        let err = check_charset(path(), "a\r\nb\r\n\u{e9}").unwrap_err();
        assert!(matches!(err, Error::UnicodePolicy { line: 3, column: 1, .. }));
    }

    #[test]
    fn test_first_disallowed_character_wins() {
        let err = check_charset(path(), "slug,name\nok,caf\u{e9} \u{201C}x\n").unwrap_err();

        match &err {
            Error::UnicodePolicy {
                ch, line, column, name, ..
            } => {
                assert_eq!(*ch, '\u{e9}');
                assert_eq!(*line, 2);
                assert_eq!(*column, 7);
                assert_eq!(name, "LATIN SMALL LETTER E WITH ACUTE");
            }
            other => panic!("expected unicode error, got {:?}", other),
        }
        assert!(err.to_string().contains("U+00E9"));
    }
}
