//! Rewrites UTF-16 surrogate escapes in query text.
//!
//! jq accepts `"\ud83d\ude00"` as one character, while the jaq lexer only
//! knows single code point escapes. Pairs are folded into the character
//! they encode and a lone surrogate becomes `\ufffd`, as jq does.

use std::borrow::Cow;

pub fn combine_surrogates(source: &str) -> Cow<'_, str> {
    if !source.contains("\\u") {
        return Cow::Borrowed(source);
    }

    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        match surrogate(rest) {
            Some(high @ 0xD800..=0xDBFF) => match surrogate(&rest[6..]) {
                Some(low @ 0xDC00..=0xDFFF) => {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    rest = &rest[12..];
                }
                _ => {
                    out.push_str("\\ufffd");
                    rest = &rest[6..];
                }
            },
            Some(0xDC00..=0xDFFF) => {
                out.push_str("\\ufffd");
                rest = &rest[6..];
            }
            _ => {
                // Copy the backslash and the escaped character as they are,
                // so `\\u` is never mistaken for an escape.
                let len = rest[1..].chars().next().map_or(0, char::len_utf8);
                out.push_str(&rest[..1 + len]);
                rest = &rest[1 + len..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Code point of a `\uXXXX` escape at the start of `text`, when it falls in
/// the surrogate range.
fn surrogate(text: &str) -> Option<u32> {
    let hex = text.strip_prefix("\\u")?.get(..4)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(hex, 16)
        .ok()
        .filter(|code| (0xD800..=0xDFFF).contains(code))
}
