use crate::{ContentTransferEncoding, FoldOptions, Result};

/// Summary of a body used to select its transfer encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodingStats {
    pub length: usize,
    /// Longest line, not counting its CRLF
    pub max_line: usize,
    /// NUL, or a CR or LF that is not part of a CRLF pair
    pub has_binary: bool,
    /// Any byte with the high bit set; implied by `has_binary`
    pub has_8bit: bool,
    /// Number of bytes that quoted-printable must escape
    pub num_qp_chars: usize,
}

impl EncodingStats {
    pub fn compute(data: &[u8]) -> Self {
        let mut stats = Self {
            length: data.len(),
            ..Default::default()
        };
        let mut line_len = 0;

        let mut i = 0;
        while i < data.len() {
            let b = data[i];
            if b == b'\r' && data.get(i + 1) == Some(&b'\n') {
                stats.max_line = stats.max_line.max(line_len);
                line_len = 0;
                i += 2;
                continue;
            }

            match b {
                0 | b'\r' | b'\n' => {
                    stats.has_binary = true;
                    stats.num_qp_chars += 1;
                }
                0x80..=0xff => {
                    stats.has_8bit = true;
                    stats.num_qp_chars += 1;
                }
                b'\t' => {}
                _ if b.is_ascii_control() => {
                    stats.num_qp_chars += 1;
                }
                _ => {}
            }
            line_len += 1;
            i += 1;
        }

        stats.max_line = stats.max_line.max(line_len);
        if stats.has_binary {
            stats.has_8bit = true;
        }
        stats
    }

    /// Size of the body once quoted-printable encoded, ignoring soft breaks
    pub fn qp_size(&self) -> usize {
        self.length + 2 * self.num_qp_chars
    }

    /// Size of the body once base64 encoded, ignoring line breaks
    pub fn base64_size(&self) -> usize {
        (self.length * 4).div_ceil(3)
    }

    /// Pick the cheapest transfer encoding that can carry this body
    /// under `options`
    pub fn select_encoding(&self, options: &FoldOptions) -> ContentTransferEncoding {
        let fits_line = self.max_line <= options.soft_margin;
        if !self.has_8bit && fits_line {
            ContentTransferEncoding::SevenBit
        } else if options.allow_8bit && !self.has_binary && fits_line {
            ContentTransferEncoding::EightBit
        } else if options.allow_binary {
            ContentTransferEncoding::Binary
        } else if self.qp_size() <= self.base64_size() {
            ContentTransferEncoding::QuotedPrintable
        } else {
            ContentTransferEncoding::Base64
        }
    }
}

/// Resolve the transfer encoding for a body: an explicitly requested
/// encoding always wins, otherwise one is chosen from `stats`.
pub fn decide_transfer_encoding(
    stats: &EncodingStats,
    options: &FoldOptions,
    explicit: Option<&str>,
) -> Result<ContentTransferEncoding> {
    let encoding = match explicit {
        Some(cte) => cte.parse()?,
        None => stats.select_encoding(options),
    };
    tracing::debug!(?stats, %encoding, explicit = explicit.is_some(), "selected transfer encoding");
    Ok(encoding)
}
