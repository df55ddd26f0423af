//! Canonical JSON encoding for signed bodies.
//!
//! Output is compact (no insignificant whitespace), fields appear in
//! declaration order, and the HTML-sensitive characters `<`, `>`, `&` as
//! well as U+2028 and U+2029 are written as `\uXXXX` escapes. This matches
//! the byte form produced by the ledger's reference encoder, so a body
//! re-encoded on either side yields the same signature input.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::error::{LbcError, LbcResult};

/// Compact formatter with HTML-safe string escaping.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSafeFormatter;

impl Formatter for HtmlSafeFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            let escape = match ch {
                '<' => "\\u003c",
                '>' => "\\u003e",
                '&' => "\\u0026",
                '\u{2028}' => "\\u2028",
                '\u{2029}' => "\\u2029",
                _ => continue,
            };
            writer.write_all(fragment[start..i].as_bytes())?;
            writer.write_all(escape.as_bytes())?;
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Serialize `value` to its canonical byte form.
pub fn to_canonical_vec<T>(value: &T) -> LbcResult<Vec<u8>>
where
    T: ?Sized + Serialize,
{
    let mut out = Vec::with_capacity(128);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, HtmlSafeFormatter);
    value
        .serialize(&mut ser)
        .map_err(|e| LbcError::Encoding(e.to_string()))?;
    Ok(out)
}
