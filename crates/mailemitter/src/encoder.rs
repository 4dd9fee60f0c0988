use crate::sink::EmitSink;
use crate::{alphabet, MailEmitError, Result};
use std::str::FromStr;

static HEX_CHARS: &[u8] = b"0123456789ABCDEF";

pub(crate) fn hex_escape(escape: u8, b: u8) -> [u8; 3] {
    [
        escape,
        HEX_CHARS[(b as usize) >> 4],
        HEX_CHARS[(b as usize) & 0x0f],
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentTransferEncoding {
    SevenBit,
    EightBit,
    Binary,
    QuotedPrintable,
    Base64,
}

impl ContentTransferEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Binary => "binary",
            Self::QuotedPrintable => "quoted-printable",
            Self::Base64 => "base64",
        }
    }
}

impl std::fmt::Display for ContentTransferEncoding {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for ContentTransferEncoding {
    type Err = MailEmitError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("7bit") {
            Ok(Self::SevenBit)
        } else if s.eq_ignore_ascii_case("8bit") {
            Ok(Self::EightBit)
        } else if s.eq_ignore_ascii_case("binary") {
            Ok(Self::Binary)
        } else if s.eq_ignore_ascii_case("quoted-printable") {
            Ok(Self::QuotedPrintable)
        } else if s.eq_ignore_ascii_case("base64") {
            Ok(Self::Base64)
        } else {
            Err(MailEmitError::UnrepresentableValue(format!(
                "unknown Content-Transfer-Encoding {s:?}"
            )))
        }
    }
}

const DATA_AFTER_EOF: &str = "data delivered after the end of the stream";

/// Passes data through unchanged; used for 7bit, 8bit and binary
pub struct IdentityEncoder<S> {
    out: S,
    finished: bool,
}

impl<S: EmitSink> IdentityEncoder<S> {
    pub fn new(out: S) -> Self {
        Self {
            out,
            finished: false,
        }
    }
}

impl<S: EmitSink> EmitSink for IdentityEncoder<S> {
    fn deliver_data(&mut self, data: &[u8]) -> Result<()> {
        if self.finished {
            return Err(MailEmitError::ProtocolViolation(DATA_AFTER_EOF));
        }
        self.out.deliver_data(data)
    }

    fn deliver_eof(&mut self) -> Result<()> {
        if self.finished {
            return Err(MailEmitError::ProtocolViolation(DATA_AFTER_EOF));
        }
        self.finished = true;
        self.out.deliver_eof()
    }
}

/// RFC 2045 quoted-printable.
///
/// CRLF pairs in the input are hard line breaks and pass through;
/// lone CR and LF are escaped so that they survive decoding.
/// Whitespace is held back at the end of each chunk until we know
/// whether it ends a line, in which case it must be escaped.
pub struct QuotedPrintableEncoder<S> {
    out: S,
    max_line_length: usize,
    line_len: usize,
    pending_cr: bool,
    held_space: Option<u8>,
    finished: bool,
}

impl<S: EmitSink> QuotedPrintableEncoder<S> {
    pub const DEFAULT_LINE_LENGTH: usize = 76;

    pub fn new(out: S) -> Self {
        Self::with_max_line_length(out, Self::DEFAULT_LINE_LENGTH)
    }

    pub fn with_max_line_length(out: S, max_line_length: usize) -> Self {
        Self {
            out,
            // Room for an escape plus the soft break marker
            max_line_length: max_line_length.max(4),
            line_len: 0,
            pending_cr: false,
            held_space: None,
            finished: false,
        }
    }

    fn push_unit(&mut self, buf: &mut Vec<u8>, unit: &[u8]) {
        if self.line_len + unit.len() >= self.max_line_length {
            buf.extend_from_slice(b"=\r\n");
            self.line_len = 0;
        }
        self.line_len += unit.len();
        buf.extend_from_slice(unit);
    }

    /// Re-emits a trailing space or tab in `buf` as an escape
    fn escape_trailing_space(&mut self, buf: &mut Vec<u8>) {
        if let Some(&ws @ (b' ' | b'\t')) = buf.last() {
            buf.pop();
            // The literal already counted one column
            if self.line_len + 2 > self.max_line_length {
                buf.extend_from_slice(b"=\r\n");
                self.line_len = 0;
            } else {
                self.line_len -= 1;
            }
            let escape = hex_escape(b'=', ws);
            self.line_len += escape.len();
            buf.extend_from_slice(&escape);
        }
    }

    fn end_line(&mut self, buf: &mut Vec<u8>) {
        self.escape_trailing_space(buf);
        buf.extend_from_slice(b"\r\n");
        self.line_len = 0;
    }
}

impl<S: EmitSink> EmitSink for QuotedPrintableEncoder<S> {
    fn deliver_data(&mut self, data: &[u8]) -> Result<()> {
        if self.finished {
            return Err(MailEmitError::ProtocolViolation(DATA_AFTER_EOF));
        }

        let mut buf = Vec::with_capacity(data.len() + data.len() / 2 + 8);
        if let Some(ws) = self.held_space.take() {
            buf.push(ws);
        }

        for &b in data {
            if self.pending_cr {
                self.pending_cr = false;
                if b == b'\n' {
                    self.end_line(&mut buf);
                    continue;
                }
                self.push_unit(&mut buf, b"=0D");
            }

            match b {
                b'\r' => self.pending_cr = true,
                b'=' => self.push_unit(&mut buf, &hex_escape(b'=', b)),
                b' ' | b'\t' | 0x21..=0x7e => self.push_unit(&mut buf, &[b]),
                _ => self.push_unit(&mut buf, &hex_escape(b'=', b)),
            }
        }

        if matches!(buf.last(), Some(b' ' | b'\t')) {
            self.held_space = buf.pop();
        }

        if buf.is_empty() {
            Ok(())
        } else {
            self.out.deliver_data(&buf)
        }
    }

    fn deliver_eof(&mut self) -> Result<()> {
        if self.finished {
            return Err(MailEmitError::ProtocolViolation(DATA_AFTER_EOF));
        }
        self.finished = true;

        let mut buf = vec![];
        if let Some(ws) = self.held_space.take() {
            buf.push(ws);
        }
        if self.pending_cr {
            self.pending_cr = false;
            self.push_unit(&mut buf, b"=0D");
        }
        self.escape_trailing_space(&mut buf);

        if !buf.is_empty() {
            self.out.deliver_data(&buf)?;
        }
        self.out.deliver_eof()
    }
}

/// Number of input bytes that produce one 76 column line of base64
const BASE64_LINE_BYTES: usize = 57;

/// RFC 2045 base64 body encoding: 76 column lines, each terminated
/// by CRLF, including the last one.
pub struct Base64Encoder<S> {
    out: S,
    saved: Vec<u8>,
    finished: bool,
}

impl<S: EmitSink> Base64Encoder<S> {
    pub fn new(out: S) -> Self {
        Self {
            out,
            saved: Vec::with_capacity(BASE64_LINE_BYTES),
            finished: false,
        }
    }
}

fn push_base64_line(buf: &mut String, chunk: &[u8]) {
    buf.push_str(&alphabet::encode(chunk));
    buf.push_str("\r\n");
}

impl<S: EmitSink> EmitSink for Base64Encoder<S> {
    fn deliver_data(&mut self, mut data: &[u8]) -> Result<()> {
        if self.finished {
            return Err(MailEmitError::ProtocolViolation(DATA_AFTER_EOF));
        }

        // The final line is only written at the end of the stream,
        // so keep at least one byte back until then
        if self.saved.len() + data.len() <= BASE64_LINE_BYTES {
            self.saved.extend_from_slice(data);
            return Ok(());
        }

        let mut buf = String::new();
        if !self.saved.is_empty() {
            let (head, tail) = data.split_at(BASE64_LINE_BYTES - self.saved.len());
            self.saved.extend_from_slice(head);
            push_base64_line(&mut buf, &self.saved);
            self.saved.clear();
            data = tail;
        }

        while data.len() > BASE64_LINE_BYTES {
            let (line, tail) = data.split_at(BASE64_LINE_BYTES);
            push_base64_line(&mut buf, line);
            data = tail;
        }
        self.saved.extend_from_slice(data);

        self.out.deliver_data(buf.as_bytes())
    }

    fn deliver_eof(&mut self) -> Result<()> {
        if self.finished {
            return Err(MailEmitError::ProtocolViolation(DATA_AFTER_EOF));
        }
        self.finished = true;

        let mut buf = alphabet::encode(&self.saved);
        buf.push_str("\r\n");
        self.saved.clear();
        self.out.deliver_data(buf.as_bytes())?;
        self.out.deliver_eof()
    }
}

/// The body encoder selected for a particular Content-Transfer-Encoding
pub enum TransferEncoder<S> {
    Identity(IdentityEncoder<S>),
    QuotedPrintable(QuotedPrintableEncoder<S>),
    Base64(Base64Encoder<S>),
}

impl<S: EmitSink> TransferEncoder<S> {
    pub fn new(encoding: ContentTransferEncoding, out: S) -> Self {
        match encoding {
            ContentTransferEncoding::SevenBit
            | ContentTransferEncoding::EightBit
            | ContentTransferEncoding::Binary => Self::Identity(IdentityEncoder::new(out)),
            ContentTransferEncoding::QuotedPrintable => {
                Self::QuotedPrintable(QuotedPrintableEncoder::new(out))
            }
            ContentTransferEncoding::Base64 => Self::Base64(Base64Encoder::new(out)),
        }
    }
}

impl<S: EmitSink> EmitSink for TransferEncoder<S> {
    fn deliver_data(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Identity(e) => e.deliver_data(data),
            Self::QuotedPrintable(e) => e.deliver_data(data),
            Self::Base64(e) => e.deliver_data(data),
        }
    }

    fn deliver_eof(&mut self) -> Result<()> {
        match self {
            Self::Identity(e) => e.deliver_eof(),
            Self::QuotedPrintable(e) => e.deliver_eof(),
            Self::Base64(e) => e.deliver_eof(),
        }
    }
}
