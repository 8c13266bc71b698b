use std::fmt;

/// A control-channel reply: a three-digit code and one or more text lines.
///
/// Single-line replies serialize as `CODE text\r\n`. Multi-line replies put
/// `CODE-` in front of every intermediate line and `CODE ` in front of the
/// last one. Intermediate lines that already start with a space (FEAT
/// feature lines) are sent as-is, which RFC 959 also allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: u16,
    lines: Vec<String>,
}

impl Reply {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![message.into()],
        }
    }

    pub fn multiline<I, S>(code: u16, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        Self { code, lines }
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_positive(&self) -> bool {
        self.code < 400
    }

    pub fn to_wire(&self) -> String {
        let mut out = String::new();
        let last = self.lines.len().saturating_sub(1);
        for (i, line) in self.lines.iter().enumerate() {
            if i == last {
                out.push_str(&format!("{} {}\r\n", self.code, line));
            } else if line.starts_with(' ') {
                out.push_str(&format!("{}\r\n", line));
            } else {
                out.push_str(&format!("{}-{}\r\n", self.code, line));
            }
        }
        out
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code, self.lines.join(" / "))
    }
}

/// Quotes a pathname for 257 replies; embedded quotes are doubled.
pub fn quote_path(path: &str) -> String {
    format!("\"{}\"", path.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_reply() {
        assert_eq!(Reply::new(200, "Command okay.").to_wire(), "200 Command okay.\r\n");
    }

    #[test]
    fn multi_line_reply_uses_continuation_marks() {
        let reply = Reply::multiline(220, ["Welcome", "to the", "server."]);
        assert_eq!(reply.to_wire(), "220-Welcome\r\n220-to the\r\n220 server.\r\n");
    }

    #[test]
    fn feature_lines_are_not_prefixed() {
        let reply = Reply::multiline(211, ["Features:", " EPSV", " SIZE", "End"]);
        assert_eq!(reply.to_wire(), "211-Features:\r\n EPSV\r\n SIZE\r\n211 End\r\n");
    }

    #[test]
    fn empty_multiline_still_has_one_line() {
        let reply = Reply::multiline(211, Vec::<String>::new());
        assert_eq!(reply.lines().len(), 1);
        assert_eq!(reply.code(), 211);
        assert_eq!(reply.to_wire(), "211 \r\n");
    }

    #[test]
    fn quotes_are_doubled_in_pathnames() {
        assert_eq!(quote_path("/a\"b"), "\"/a\"\"b\"");
    }
}
