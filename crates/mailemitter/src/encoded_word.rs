//! RFC 2047 encoded words.
//!
//! Both schemes are measured as characters are added so that the
//! folder can decide where to end a word before rendering it.

use crate::alphabet;
use crate::encoder::hex_escape;

pub(crate) const CHARSET: &str = "UTF-8";

/// Length of `=?UTF-8?Q?` plus `?=`
pub(crate) const WORD_OVERHEAD: usize = CHARSET.len() + 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordScheme {
    /// RFC 2047 "Q", similar to quoted-printable
    Q,
    /// RFC 2047 "B", base64
    B,
}

impl WordScheme {
    fn as_char(self) -> char {
        match self {
            Self::Q => 'Q',
            Self::B => 'B',
        }
    }
}

/// Where an encoded word is placed. Inside a phrase (display names)
/// RFC 2047 section 5 (3) restricts the characters Q may leave as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WordContext {
    Phrase,
    Text,
}

impl WordContext {
    fn is_q_literal(self, b: u8) -> bool {
        match self {
            Self::Phrase => b.is_ascii_alphanumeric() || b"!*+-/".contains(&b),
            Self::Text => b.is_ascii_graphic() && !b"=?_".contains(&b),
        }
    }

    fn q_len(self, b: u8) -> usize {
        if b == b' ' || self.is_q_literal(b) {
            1
        } else {
            3
        }
    }
}

/// Running size of a prospective encoded word, in both schemes
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WordMeasure {
    bytes: usize,
    q_len: usize,
}

impl WordMeasure {
    pub fn with_char(self, c: char, context: WordContext) -> Self {
        let mut buf = [0u8; 4];
        let q_len: usize = c
            .encode_utf8(&mut buf)
            .bytes()
            .map(|b| context.q_len(b))
            .sum();
        Self {
            bytes: self.bytes + c.len_utf8(),
            q_len: self.q_len + q_len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes == 0
    }

    fn b_len(&self) -> usize {
        4 * self.bytes.div_ceil(3)
    }

    /// Ties go to Q, which stays legible
    pub fn scheme(&self) -> WordScheme {
        if self.b_len() < self.q_len {
            WordScheme::B
        } else {
            WordScheme::Q
        }
    }

    /// Length of the encoded payload in the cheaper scheme
    pub fn payload_len(&self) -> usize {
        self.b_len().min(self.q_len)
    }
}

/// A single rendered `=?UTF-8?X?...?=` word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedWord {
    scheme: WordScheme,
    rendered: String,
}

impl EncodedWord {
    /// Encode `text` for use in unstructured header text
    pub fn for_text(text: &str) -> Self {
        Self::encode(text, WordContext::Text)
    }

    /// Encode `text` for use as (part of) a display name
    pub fn for_phrase(text: &str) -> Self {
        Self::encode(text, WordContext::Phrase)
    }

    pub(crate) fn encode(text: &str, context: WordContext) -> Self {
        let measure = text
            .chars()
            .fold(WordMeasure::default(), |m, c| m.with_char(c, context));
        let scheme = measure.scheme();

        let mut rendered = String::with_capacity(WORD_OVERHEAD + measure.payload_len());
        rendered.push_str("=?");
        rendered.push_str(CHARSET);
        rendered.push('?');
        rendered.push(scheme.as_char());
        rendered.push('?');
        match scheme {
            WordScheme::B => rendered.push_str(&alphabet::encode(text.as_bytes())),
            WordScheme::Q => {
                for b in text.bytes() {
                    if b == b' ' {
                        rendered.push('_');
                    } else if context.is_q_literal(b) {
                        rendered.push(b as char);
                    } else {
                        for e in hex_escape(b'=', b) {
                            rendered.push(e as char);
                        }
                    }
                }
            }
        }
        rendered.push_str("?=");

        Self { scheme, rendered }
    }

    pub fn charset(&self) -> &'static str {
        CHARSET
    }

    pub fn scheme(&self) -> WordScheme {
        self.scheme
    }

    pub fn rendered_len(&self) -> usize {
        self.rendered.len()
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl std::fmt::Display for EncodedWord {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        fmt.write_str(&self.rendered)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn q_or_b() {
        let word = EncodedWord::for_phrase("dioxyg\u{e8}ne");
        k9::assert_equal!(word.as_str(), "=?UTF-8?Q?dioxyg=C3=A8ne?=");
        k9::assert_equal!(word.scheme(), WordScheme::Q);

        // 12 payload octets either way
        k9::assert_equal!(
            EncodedWord::for_phrase("oxyg\u{e8}ne").as_str(),
            "=?UTF-8?Q?oxyg=C3=A8ne?="
        );

        let word = EncodedWord::for_phrase("\u{1f4a9}\u{1f4a9}\u{1f4a9}");
        k9::assert_equal!(word.as_str(), "=?UTF-8?B?8J+SqfCfkqnwn5Kp?=");
        k9::assert_equal!(word.rendered_len(), 28);
        k9::assert_equal!(word.charset(), "UTF-8");
    }

    #[test]
    fn text_controls() {
        k9::assert_equal!(EncodedWord::for_text("\x1f").as_str(), "=?UTF-8?Q?=1F?=");
        k9::assert_equal!(EncodedWord::for_text("\x1fa").as_str(), "=?UTF-8?Q?=1Fa?=");
        k9::assert_equal!(EncodedWord::for_text("\x1faa").as_str(), "=?UTF-8?B?H2Fh?=");
    }

    #[test]
    fn q_alphabets() {
        // Punctuation is literal in text but escaped in a phrase
        k9::assert_equal!(
            EncodedWord::for_text("caf\u{e9}, s'il vous pla\u{ee}t").as_str(),
            "=?UTF-8?Q?caf=C3=A9,_s'il_vous_pla=C3=AEt?="
        );
        k9::assert_equal!(
            EncodedWord::for_phrase("caf\u{e9}, okay then").as_str(),
            "=?UTF-8?Q?caf=C3=A9=2C_okay_then?="
        );
        k9::assert_equal!(
            EncodedWord::for_text("x_y=z plus some plain words \u{e9}").as_str(),
            "=?UTF-8?Q?x=5Fy=3Dz_plus_some_plain_words_=C3=A9?="
        );
    }

    #[test]
    fn measure_matches_rendering() {
        for text in ["plain", "\u{e9}t\u{e9}", "\u{1f600} smile", "a=b?c_d", "\x00\x01"] {
            for context in [WordContext::Phrase, WordContext::Text] {
                let measure = text
                    .chars()
                    .fold(WordMeasure::default(), |m, c| m.with_char(c, context));
                let word = EncodedWord::encode(text, context);
                k9::assert_equal!(word.rendered_len(), WORD_OVERHEAD + measure.payload_len());
                k9::assert_equal!(word.scheme(), measure.scheme());
            }
        }
    }
}
