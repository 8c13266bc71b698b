//! Line-ending translation for `TYPE A` transfers.

/// LF -> CRLF for bytes going out on the data connection.
#[derive(Debug, Default)]
pub struct AsciiEncoder {
    last_was_cr: bool,
}

impl AsciiEncoder {
    pub fn encode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if b == b'\n' && !self.last_was_cr {
                out.push(b'\r');
            }
            out.push(b);
            self.last_was_cr = b == b'\r';
        }
    }
}

/// CRLF -> LF for bytes arriving on the data connection. A CR split from its
/// LF across reads is held back until the next chunk.
#[derive(Debug, Default)]
pub struct AsciiDecoder {
    pending_cr: bool,
}

impl AsciiDecoder {
    pub fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) {
        for &b in input {
            if self.pending_cr {
                self.pending_cr = false;
                if b == b'\n' {
                    out.push(b'\n');
                    continue;
                }
                out.push(b'\r');
            }
            if b == b'\r' {
                self.pending_cr = true;
            } else {
                out.push(b);
            }
        }
    }

    pub fn finish(&mut self, out: &mut Vec<u8>) {
        if std::mem::take(&mut self.pending_cr) {
            out.push(b'\r');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_adds_cr_to_bare_lf_only() {
        let mut enc = AsciiEncoder::default();
        let mut out = Vec::new();
        enc.encode(b"a\nb\r\nc", &mut out);
        assert_eq!(out, b"a\r\nb\r\nc");
    }

    #[test]
    fn encoder_remembers_cr_across_chunks() {
        let mut enc = AsciiEncoder::default();
        let mut out = Vec::new();
        enc.encode(b"line\r", &mut out);
        enc.encode(b"\nnext\n", &mut out);
        assert_eq!(out, b"line\r\nnext\r\n");
    }

    #[test]
    fn decoder_joins_split_crlf() {
        let mut dec = AsciiDecoder::default();
        let mut out = Vec::new();
        dec.decode(b"one\r", &mut out);
        dec.decode(b"\ntwo\r\n", &mut out);
        dec.finish(&mut out);
        assert_eq!(out, b"one\ntwo\n");
    }

    #[test]
    fn decoder_keeps_lone_cr() {
        let mut dec = AsciiDecoder::default();
        let mut out = Vec::new();
        dec.decode(b"a\rb\r", &mut out);
        dec.finish(&mut out);
        assert_eq!(out, b"a\rb\r");
    }
}
