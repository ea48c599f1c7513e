//! Reply framing for the control channel.
//!
//! A reply is one or more lines sharing a three digit code. Every line but the
//! last uses `-` after the code, the last one uses a space:
//!
//! ```text
//! 211-Features:
//! 211-EPSV
//! 211 End
//! ```
//!
//! Lines end with CRLF, but a bare CR or a bare LF is accepted as well.

use crate::core_protocol::error::ProtocolError;

/// A single reply line as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLine {
    pub code: u16,
    pub continuation: bool,
    pub text: String,
}

impl ResponseLine {
    pub fn to_wire(&self) -> String {
        format_line(self.code, &self.text, !self.continuation)
    }
}

/// A complete logical reply: one code, one or more text lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub lines: Vec<String>,
}

impl Response {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self {
            code,
            lines: vec![text.into()],
        }
    }

    pub fn multi<I, S>(code: u16, lines: I) -> Self
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

    /// Text of the final line.
    pub fn message(&self) -> &str {
        self.lines.last().map(String::as_str).unwrap_or("")
    }

    /// All lines joined with `\n`.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// 1xx: the action is starting, expect another reply.
    pub fn is_preliminary(&self) -> bool {
        (100..200).contains(&self.code)
    }

    /// 2xx
    pub fn is_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// 3xx: a follow-up command is required.
    pub fn is_intermediate(&self) -> bool {
        (300..400).contains(&self.code)
    }

    /// 4xx
    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    /// 5xx
    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }

    pub fn to_wire(&self) -> String {
        format_response(self.code, &self.lines)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.code, self.message())
    }
}

/// Result of feeding an accumulated buffer to [`parse_complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A full reply was found in the first `consumed` bytes of the buffer.
    Complete { response: Response, consumed: usize },
    NeedMoreData,
}

enum Line {
    Coded(ResponseLine),
    /// Continuation text without a code (RFC 959 indentation).
    Text(String),
}

/// Parses the first complete reply out of `buf`.
///
/// Returns [`ParseOutcome::NeedMoreData`] until the final line of the reply has
/// arrived. Bytes after the reply are left for the next call.
pub fn parse_complete(buf: &[u8]) -> Result<ParseOutcome, ProtocolError> {
    let mut pos = 0;
    let mut group: Option<(u16, Vec<String>)> = None;

    while let Some((raw, next)) = next_line(buf, pos) {
        pos = next;

        if raw.is_empty() {
            // Leftover LF of a CRLF split across reads, or a blank line.
            if let Some((_, lines)) = group.as_mut() {
                lines.push(String::new());
            }
            continue;
        }

        match parse_line(raw, group.is_some())? {
            Line::Coded(line) => match group.take() {
                None if !line.continuation => {
                    return Ok(ParseOutcome::Complete {
                        response: Response::new(line.code, line.text),
                        consumed: pos,
                    });
                }
                None => group = Some((line.code, vec![line.text])),
                Some((code, _)) if line.code != code => {
                    return Err(ProtocolError::UnexpectedCode {
                        expected: code,
                        found: line.code,
                    });
                }
                Some((code, mut lines)) => {
                    lines.push(line.text);
                    if !line.continuation {
                        return Ok(ParseOutcome::Complete {
                            response: Response { code, lines },
                            consumed: pos,
                        });
                    }
                    group = Some((code, lines));
                }
            },
            Line::Text(text) => match group.as_mut() {
                Some((_, lines)) => lines.push(text),
                None => return Err(ProtocolError::malformed(&text)),
            },
        }
    }

    Ok(ParseOutcome::NeedMoreData)
}

/// Finds the line starting at `start`. Returns the line without its
/// terminator and the offset of the following line.
fn next_line(buf: &[u8], start: usize) -> Option<(&[u8], usize)> {
    let rest = buf.get(start..)?;
    let idx = rest.iter().position(|&b| b == b'\r' || b == b'\n')?;
    let end = if rest[idx] == b'\r' && rest.get(idx + 1) == Some(&b'\n') {
        idx + 2
    } else {
        idx + 1
    };
    Some((&rest[..idx], start + end))
}

fn parse_line(raw: &[u8], in_group: bool) -> Result<Line, ProtocolError> {
    let text = std::str::from_utf8(raw).map_err(|_| ProtocolError::InvalidEncoding)?;

    if in_group && text.starts_with(' ') {
        return Ok(Line::Text(text.trim_start().to_string()));
    }

    let digits = text.get(..3).ok_or_else(|| ProtocolError::malformed(text))?;
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProtocolError::malformed(text));
    }
    let code: u16 = digits.parse().map_err(|_| ProtocolError::malformed(text))?;
    if !(100..=599).contains(&code) {
        return Err(ProtocolError::InvalidCode(code));
    }

    let rest = &text[3..];
    let (continuation, body) = match rest.as_bytes().first() {
        None => (false, ""),
        Some(b' ') => (false, &rest[1..]),
        Some(b'-') => (true, &rest[1..]),
        Some(_) => return Err(ProtocolError::malformed(text)),
    };

    Ok(Line::Coded(ResponseLine {
        code,
        continuation,
        text: body.to_string(),
    }))
}

/// Formats one reply line, `code-text` when more lines follow and
/// `code text` for the last one.
pub fn format_line(code: u16, text: &str, is_last: bool) -> String {
    let sep = if is_last { ' ' } else { '-' };
    let text = text.replace(['\r', '\n'], " ");
    format!("{}{}{}\r\n", code, sep, text)
}

/// Formats a whole reply.
pub fn format_response<S: AsRef<str>>(code: u16, lines: &[S]) -> String {
    if lines.is_empty() {
        return format_line(code, "", true);
    }
    let last = lines.len() - 1;
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format_line(code, line.as_ref(), i == last))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(buf: &[u8]) -> (Response, usize) {
        match parse_complete(buf).unwrap() {
            ParseOutcome::Complete { response, consumed } => (response, consumed),
            ParseOutcome::NeedMoreData => panic!("expected a complete reply"),
        }
    }

    #[test]
    fn test_single_line() {
        let (response, consumed) = complete(b"220 Service ready\r\n");
        assert_eq!(response.code, 220);
        assert_eq!(response.lines, vec!["Service ready"]);
        assert_eq!(consumed, 19);
    }

    #[test]
    fn test_multi_line_reply_is_one_response() {
        let buf = ["220-a", "220-b", "220 c"].join("\r\n") + "\r\n";
        let (response, consumed) = complete(buf.as_bytes());
        assert_eq!(response.code, 220);
        assert_eq!(response.lines, vec!["a", "b", "c"]);
        assert_eq!(consumed, buf.len());
    }

    #[test]
    fn test_stray_code_inside_group_is_rejected() {
        let buf = b"220-a\r\n230-b\r\n220 c\r\n";
        assert_eq!(
            parse_complete(buf),
            Err(ProtocolError::UnexpectedCode {
                expected: 220,
                found: 230
            })
        );
    }

    #[test]
    fn test_incomplete_group_needs_more_data() {
        assert_eq!(
            parse_complete(b"211-Features:\r\n EPSV\r\n").unwrap(),
            ParseOutcome::NeedMoreData
        );
        assert_eq!(parse_complete(b"226 Transfer comp").unwrap(), ParseOutcome::NeedMoreData);
        assert_eq!(parse_complete(b"").unwrap(), ParseOutcome::NeedMoreData);
    }

    #[test]
    fn test_indented_continuation_lines() {
        let (response, _) = complete(b"211-Features:\r\n EPSV\r\n MDTM\r\n211 End\r\n");
        assert_eq!(response.lines, vec!["Features:", "EPSV", "MDTM", "End"]);
    }

    #[test]
    fn test_bare_lf_and_bare_cr_terminators() {
        let (response, consumed) = complete(b"150-x\n150 y\n");
        assert_eq!(response.lines, vec!["x", "y"]);
        assert_eq!(consumed, 12);

        let (response, _) = complete(b"226-one\r226 two\r");
        assert_eq!(response.lines, vec!["one", "two"]);
    }

    #[test]
    fn test_split_crlf_leaves_lf_for_next_reply() {
        let buf = b"150 Opening\r";
        let (response, consumed) = complete(buf);
        assert_eq!(response.code, 150);
        assert_eq!(consumed, buf.len());

        let (response, _) = complete(b"\n226 Done\r\n");
        assert_eq!(response.code, 226);
    }

    #[test]
    fn test_trailing_bytes_are_not_consumed() {
        let buf = b"150 Opening data connection\r\n226 Transfer complete\r\n";
        let (first, consumed) = complete(buf);
        assert_eq!(first.code, 150);
        let (second, _) = complete(&buf[consumed..]);
        assert_eq!(second.code, 226);
    }

    #[test]
    fn test_malformed_leading_bytes() {
        assert!(matches!(
            parse_complete(b"hello\r\n"),
            Err(ProtocolError::MalformedLine(_))
        ));
        assert!(matches!(
            parse_complete(b"22\r\n"),
            Err(ProtocolError::MalformedLine(_))
        ));
        assert!(matches!(
            parse_complete(b"220*nope\r\n"),
            Err(ProtocolError::MalformedLine(_))
        ));
        assert_eq!(parse_complete(b"999 what\r\n"), Err(ProtocolError::InvalidCode(999)));
        assert!(matches!(
            parse_complete(b" indented\r\n"),
            Err(ProtocolError::MalformedLine(_))
        ));
    }

    #[test]
    fn test_code_without_text() {
        let (response, _) = complete(b"200\r\n");
        assert_eq!(response.code, 200);
        assert_eq!(response.message(), "");
    }

    #[test]
    fn test_format() {
        assert_eq!(format_line(220, "a", false), "220-a\r\n");
        assert_eq!(format_line(220, "c", true), "220 c\r\n");
        assert_eq!(
            format_response(211, &["Features:", "EPSV", "End"]),
            "211-Features:\r\n211-EPSV\r\n211 End\r\n"
        );
        assert_eq!(Response::new(226, "ok\r\ninjected").to_wire(), "226 ok  injected\r\n");
    }

    #[test]
    fn test_formatted_reply_parses_back() {
        let wire = Response::multi(220, ["Welcome", "to", "sandftp"]).to_wire();
        let (response, consumed) = complete(wire.as_bytes());
        assert_eq!(response.lines, vec!["Welcome", "to", "sandftp"]);
        assert_eq!(consumed, wire.len());
    }
}
