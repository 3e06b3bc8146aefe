//! Delimiter escaping for strings in the text stream form.
//!
//! Text-form strings are unquoted byte runs, so the stream delimiters must
//! be escaped inside them: `"`, `:`, `;`, `!` and `\` each get a `\` prefix.
//! Every other byte, including control bytes and non-ASCII, passes through
//! untouched.

/// Whether `byte` needs a `\` prefix in text form.
pub const fn needs_escape(byte: u8) -> bool {
    matches!(byte, b'"' | b':' | b';' | b'!' | b'\\')
}

/// Escape all delimiter bytes in `input`.
pub fn escape(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());

    for &byte in input {
        if needs_escape(byte) {
            out.push(b'\\');
        }
        out.push(byte);
    }

    out
}

/// Reverse [`escape`]: drop the `\` before any escaped byte. A trailing
/// lone `\` is preserved as-is; `escape` never produces one.
pub fn unescape(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut bytes = input.iter().copied();

    while let Some(byte) = bytes.next() {
        if byte != b'\\' {
            out.push(byte);
            continue;
        }
        match bytes.next() {
            Some(escaped) => out.push(escaped),
            None => out.push(byte),
        }
    }

    out
}
