//! ASCII-only compact JSON.
//!
//! The delegated-signing digest is computed over JSON in which every
//! character above U+007F is written as a `\uXXXX` escape (UTF-16 surrogate
//! pairs for astral characters, lowercase hex). serde_json writes such
//! characters as raw UTF-8, so its formatter is wrapped here.

use std::fmt;
use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use serde_json::Value;

/// Compact formatter that escapes non-ASCII characters.
#[derive(Debug, Clone, Copy, Default)]
struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut run_start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[run_start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            run_start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[run_start..].as_bytes())
    }
}

/// Display adapter: `AsciiJson(&value).to_string()` is the ASCII-only
/// compact form of `value`.
#[derive(Debug, Clone, Copy)]
pub struct AsciiJson<'a>(pub &'a Value);

impl fmt::Display for AsciiJson<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut serializer = Serializer::with_formatter(FmtWriter(f), AsciiFormatter);
        self.0.serialize(&mut serializer).map_err(|_| fmt::Error)
    }
}

/// `io::Write` over a `fmt::Formatter`. Only ever receives ASCII.
struct FmtWriter<'a, 'b>(&'a mut fmt::Formatter<'b>);

impl io::Write for FmtWriter<'_, '_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let text =
            std::str::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.0
            .write_str(text)
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "formatter error"))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
