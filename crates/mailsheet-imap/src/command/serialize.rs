//! Wire encoding of command arguments.

/// A command being encoded, split after each synchronizing literal
/// announcement. The server has to answer `+` before the next chunk is sent.
#[derive(Debug)]
pub struct Wire {
    chunks: Vec<Vec<u8>>,
}

impl Wire {
    pub fn new() -> Self {
        Self {
            chunks: vec![Vec::with_capacity(64)],
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        if let Some(chunk) = self.chunks.last_mut() {
            chunk.extend_from_slice(bytes);
        }
    }

    pub fn push(&mut self, byte: u8) {
        self.extend(&[byte]);
    }

    /// Announces `data` as `{n}` and starts the chunk that carries it.
    fn literal(&mut self, data: &[u8]) {
        self.extend(format!("{{{}}}\r\n", data.len()).as_bytes());
        self.chunks.push(data.to_vec());
    }

    pub fn into_chunks(self) -> Vec<Vec<u8>> {
        self.chunks
    }
}

impl Default for Wire {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes an astring: a bare atom when possible, a quoted string for 7-bit
/// text, and a literal for anything with 8-bit bytes (RFC 3501 `quoted` only
/// carries 7-bit characters).
pub fn write_astring(wire: &mut Wire, s: &str) {
    if !s.is_ascii() {
        wire.literal(s.as_bytes());
    } else if s.is_empty() || s.bytes().any(needs_quoting) {
        wire.push(b'"');
        for b in s.bytes() {
            if b == b'"' || b == b'\\' {
                wire.push(b'\\');
            }
            wire.push(b);
        }
        wire.push(b'"');
    } else {
        wire.extend(s.as_bytes());
    }
}

/// Bytes that may not appear in an atom: RFC 3501 `atom-specials` and
/// control characters.
const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b == 0x7F
}

#[cfg(test)]
mod tests {
    use super::*;

    fn astring(s: &str) -> Vec<Vec<u8>> {
        let mut wire = Wire::new();
        write_astring(&mut wire, s);
        wire.into_chunks()
    }

    fn single(s: &str) -> String {
        let chunks = astring(s);
        assert_eq!(chunks.len(), 1);
        String::from_utf8_lossy(&chunks[0]).into_owned()
    }

    #[test]
    fn atoms_are_written_bare() {
        assert_eq!(single("INBOX"), "INBOX");
        assert_eq!(single("user@example.com"), "user@example.com");
    }

    #[test]
    fn specials_force_quoting() {
        assert_eq!(single(""), "\"\"");
        assert_eq!(single("Sent Mail"), "\"Sent Mail\"");
        assert_eq!(single("p(w)"), "\"p(w)\"");
        assert_eq!(single("a\"b\\c"), "\"a\\\"b\\\\c\"");
        assert_eq!(single("tab\there"), "\"tab\there\"");
    }

    #[test]
    fn eight_bit_text_becomes_a_literal() {
        let chunks = astring("pässe");
        assert_eq!(chunks, vec![b"{6}\r\n".to_vec(), "pässe".as_bytes().to_vec()]);
    }
}
