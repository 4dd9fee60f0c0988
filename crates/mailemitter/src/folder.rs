//! Folding of structured header values.
//!
//! Output is built a line at a time. Tokens are appended to the current
//! line, and the folder remembers a single preferred breakpoint: the
//! position just after the most recent token that was added with
//! `may_break_after`. When a token does not fit within the soft margin,
//! the line is committed at that breakpoint and the remainder carries on
//! as a continuation line that starts with a single space.

use crate::encoded_word::{EncodedWord, WordContext, WordMeasure, WORD_OVERHEAD};
use crate::{
    Address, ContentDisposition, ContentType, FoldOptions, HeaderMap, HeaderValue, MailEmitError,
    Mailbox, MimeParameters, Result,
};
use chrono::{DateTime, Datelike, FixedOffset};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;

/// RFC 5322 specials; a display name containing any of them is quoted
const PHRASE_SPECIALS: &str = "()<>[]:;@\\,.\"";
/// Characters that require the local part of an address to be quoted
const LOCAL_PART_SPECIALS: &str = "()<>[]:;@\\,\" ";
/// RFC 2045 tspecials plus whitespace
const PARAM_SPECIALS: &str = "()<>@,;:\\\"/[]?= \t";

/// RFC 2231 values leave only the RFC 3986 unreserved set unescaped
const RFC2231_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Room an encoded word needs to be worth starting on the current line
const MIN_ENCODED_WORD: usize = WORD_OVERHEAD + 8;
/// RFC 2047 limit on the length of a single encoded word
const MAX_ENCODED_WORD: usize = 75;

fn is_printable_ascii(b: u8) -> bool {
    (0x20..0x7f).contains(&b)
}

/// Whether `word` must be sent as an encoded word: either it is not
/// printable ASCII, or a decoder would mistake it for an encoded word
fn needs_encoding(word: &str) -> bool {
    !word.bytes().all(is_printable_ascii) || (word.starts_with("=?") && word.ends_with("?="))
}

fn collapse_whitespace(text: &str) -> String {
    text.split([' ', '\t', '\r', '\n'])
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn quote_string(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 4);
    result.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            result.push('\\');
        }
        result.push(c);
    }
    result.push('"');
    result
}

/// `text` as `add_quotable` renders it
fn quotable<'a>(text: &'a str, specials: &str) -> Cow<'a, str> {
    let already_quoted = text.len() >= 2 && text.starts_with('"') && text.ends_with('"');
    if !already_quoted && text.chars().any(|c| specials.contains(c)) {
        Cow::Owned(quote_string(text))
    } else {
        Cow::Borrowed(text)
    }
}

fn quote_if_needed<'a>(text: &'a str, specials: &str) -> Cow<'a, str> {
    if text.is_empty() || text.chars().any(|c| specials.contains(c) || c.is_control()) {
        Cow::Owned(quote_string(text))
    } else {
        Cow::Borrowed(text)
    }
}

/// Returns the conventional capitalization of a header name
pub fn preferred_spelling(name: &str) -> Cow<'_, str> {
    const SPELLINGS: &[&str] = &[
        "Bcc",
        "Cc",
        "Content-Description",
        "Content-Disposition",
        "Content-ID",
        "Content-Language",
        "Content-Location",
        "Content-Transfer-Encoding",
        "Content-Type",
        "Date",
        "From",
        "In-Reply-To",
        "Message-ID",
        "MIME-Version",
        "References",
        "Reply-To",
        "Resent-Bcc",
        "Resent-Cc",
        "Resent-Date",
        "Resent-From",
        "Resent-Message-ID",
        "Resent-Sender",
        "Resent-To",
        "Return-Path",
        "Sender",
        "Subject",
        "To",
    ];

    if let Some(spelling) = SPELLINGS.iter().find(|s| s.eq_ignore_ascii_case(name)) {
        return Cow::Borrowed(spelling);
    }

    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        return Cow::Borrowed(name);
    }

    let mut result = String::with_capacity(name.len());
    let mut start_of_word = true;
    for c in name.chars() {
        if start_of_word {
            result.push(c.to_ascii_uppercase());
        } else {
            result.push(c);
        }
        start_of_word = c == '-';
    }
    Cow::Owned(result)
}

/// Folds one or more headers to the configured margins.
///
/// Nothing is released until `finish`; an error while adding a value
/// leaves no partial header behind.
pub struct HeaderFolder {
    options: FoldOptions,
    line: String,
    /// Index into `line` of the preferred fold point; 0 means none
    breakpoint: usize,
    output: String,
}

impl HeaderFolder {
    pub fn new(options: &FoldOptions) -> Self {
        Self {
            options: options.validated(),
            line: String::new(),
            breakpoint: 0,
            output: String::new(),
        }
    }

    fn line_has_content(&self) -> bool {
        self.line.bytes().any(|b| b != b' ' && b != b'\t')
    }

    /// Terminate the current line. With `at`, the text following
    /// that index becomes a continuation line.
    fn commit_line(&mut self, at: Option<usize>) {
        let (first, rest) = match at {
            Some(idx) => self.line.split_at(idx),
            None => (self.line.as_str(), ""),
        };
        self.output.push_str(first.trim_end_matches([' ', '\t']));
        self.output.push_str("\r\n");
        let next = match at {
            Some(_) => format!(" {}", rest.trim_start_matches([' ', '\t'])),
            None => String::new(),
        };
        self.line = next;
        self.breakpoint = 0;
    }

    /// Fold at the breakpoint if `len` more octets would pass the soft margin
    fn prefer_fresh_line(&mut self, len: usize) {
        if self.line.len() + len > self.options.soft_margin && self.breakpoint > 0 {
            self.commit_line(Some(self.breakpoint));
        }
    }

    /// Whether `len` more octets fit within the soft margin,
    /// folding at the breakpoint if that is what it takes
    fn fits(&mut self, len: usize) -> bool {
        self.prefer_fresh_line(len);
        self.line.len() + len <= self.options.soft_margin
    }

    /// Make room for an unbreakable token of `len` octets
    fn reserve(&mut self, len: usize) -> Result<()> {
        if self.fits(len) || self.line.len() + len <= self.options.hard_margin {
            return Ok(());
        }

        // No breakpoint helped; fold wherever we are. CFWS is allowed
        // between any two tokens, including a local part and its @domain
        if self.line_has_content() {
            self.commit_line(Some(self.line.len()));
        }

        if self.line.len() + len <= self.options.hard_margin {
            Ok(())
        } else {
            Err(MailEmitError::UnrepresentableValue(format!(
                "a {len} octet token cannot be folded to fit within {} columns",
                self.options.hard_margin
            )))
        }
    }

    /// Append `text` without modification. When `may_break_after` is
    /// set, a space follows it and the line may be folded there.
    pub fn add_text(&mut self, text: &str, may_break_after: bool) -> Result<()> {
        self.reserve(text.len())?;
        self.line.push_str(text);
        if may_break_after {
            self.breakpoint = self.line.len();
            self.line.push(' ');
        }
        Ok(())
    }

    /// Append `text`, as a quoted-string if it contains any of `specials`
    pub fn add_quotable(&mut self, text: &str, specials: &str, may_break_after: bool) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.add_text(&quotable(text, specials), may_break_after)
    }

    /// Finish any header in progress, then start a new one called `name`
    pub fn add_header_name(&mut self, name: &str) -> Result<()> {
        if self.line_has_content() {
            self.commit_line(None);
        } else {
            self.line.clear();
            self.breakpoint = 0;
        }
        self.add_text(&format!("{name}:"), true)
    }

    /// Append a display name
    pub fn add_phrase(&mut self, text: &str, may_break_after: bool) -> Result<()> {
        self.add_words(text, PHRASE_SPECIALS, WordContext::Phrase, may_break_after)
    }

    /// Append free text, such as the value of a Subject header
    pub fn add_unstructured(&mut self, text: &str) -> Result<()> {
        self.add_words(text, "", WordContext::Text, false)
    }

    fn add_words(
        &mut self,
        text: &str,
        specials: &str,
        context: WordContext,
        may_break_after: bool,
    ) -> Result<()> {
        let text = collapse_whitespace(text);
        if text.is_empty() {
            return Ok(());
        }

        if self.options.use_ascii && text.split(' ').any(needs_encoding) {
            return self.add_mixed_words(&text, specials, context, may_break_after);
        }

        let rendered = quotable(&text, specials);
        if self.line.len() + rendered.len() < self.options.soft_margin {
            self.add_text(&rendered, may_break_after)?;
            // Keep the option of folding inside the text later on
            if self.breakpoint == 0 && text.contains(' ') && !self.line.ends_with('"') {
                if let Some(idx) = self.line.rfind(' ') {
                    self.breakpoint = idx;
                }
            }
            return Ok(());
        }

        let mut words = text.split(' ').peekable();
        while let Some(word) = words.next() {
            let may_break = words.peek().is_some() || may_break_after;
            self.add_quotable(word, specials, may_break)?;
        }
        Ok(())
    }

    /// Words that need encoding are merged with their neighbours that
    /// also need encoding, so that the spaces between them are carried
    /// inside the encoded words.
    fn add_mixed_words(
        &mut self,
        text: &str,
        specials: &str,
        context: WordContext,
        may_break_after: bool,
    ) -> Result<()> {
        // (start, end, encode)
        let mut runs: Vec<(usize, usize, bool)> = vec![];
        let mut start = 0;
        for word in text.split(' ') {
            let end = start + word.len();
            let encode = needs_encoding(word);
            match runs.last_mut() {
                Some((_, run_end, true)) if encode => *run_end = end,
                _ => runs.push((start, end, encode)),
            }
            start = end + 1;
        }

        let last = runs.len() - 1;
        for (idx, &(start, end, encode)) in runs.iter().enumerate() {
            let may_break = idx < last || may_break_after;
            let run = &text[start..end];
            if encode {
                self.add_encoded_run(run, context, may_break)?;
            } else {
                self.add_quotable(run, specials, may_break)?;
            }
        }
        Ok(())
    }

    /// Emit `text` as one or more encoded words, splitting only between
    /// characters so that every word decodes on its own
    fn add_encoded_run(
        &mut self,
        text: &str,
        context: WordContext,
        may_break_after: bool,
    ) -> Result<()> {
        self.prefer_fresh_line(MIN_ENCODED_WORD);
        let soft_margin = self.options.soft_margin;
        let max_payload = MAX_ENCODED_WORD - WORD_OVERHEAD;
        let mut budget = soft_margin
            .saturating_sub(self.line.len() + WORD_OVERHEAD)
            .min(max_payload);

        let mut start = 0;
        let mut measure = WordMeasure::default();
        for (idx, c) in text.char_indices() {
            let next = measure.with_char(c, context);
            if next.payload_len() > budget && !measure.is_empty() {
                tracing::trace!(at = idx, "splitting encoded word");
                self.add_text(EncodedWord::encode(&text[start..idx], context).as_str(), true)?;
                start = idx;
                measure = WordMeasure::default().with_char(c, context);
                budget = soft_margin
                    .saturating_sub(1 + WORD_OVERHEAD)
                    .min(max_payload);
            } else {
                measure = next;
            }
        }

        self.add_text(
            EncodedWord::encode(&text[start..], context).as_str(),
            may_break_after,
        )
    }

    pub fn add_addresses(&mut self, addresses: &[Address]) -> Result<()> {
        for (idx, address) in addresses.iter().enumerate() {
            if idx > 0 {
                self.add_text(",", true)?;
            }
            match address {
                Address::Mailbox(mailbox) => self.add_mailbox(mailbox)?,
                Address::Group { name, entries } => {
                    self.add_phrase(name, false)?;
                    self.add_text(":", true)?;
                    self.add_mailboxes(entries)?;
                    self.add_text(";", true)?;
                }
            }
        }
        Ok(())
    }

    pub fn add_mailboxes(&mut self, mailboxes: &[Mailbox]) -> Result<()> {
        for (idx, mailbox) in mailboxes.iter().enumerate() {
            if idx > 0 {
                self.add_text(",", true)?;
            }
            self.add_mailbox(mailbox)?;
        }
        Ok(())
    }

    pub fn add_mailbox(&mut self, mailbox: &Mailbox) -> Result<()> {
        let name = mailbox.name.as_deref().filter(|name| !name.is_empty());
        let email = mailbox.email.as_str();

        if let Some(name) = name {
            self.prefer_fresh_line(name.len() + email.len() + 3);
            self.add_phrase(name, true)?;
            if email.is_empty() {
                return Ok(());
            }
            self.add_text("<", false)?;
        }

        let (local_part, domain) = match email.rfind('@') {
            Some(idx) => email.split_at(idx),
            None => (email, ""),
        };
        self.add_quotable(local_part, LOCAL_PART_SPECIALS, false)?;

        if name.is_some() {
            self.add_text(&format!("{domain}>"), false)
        } else if !domain.is_empty() {
            self.add_text(domain, false)
        } else {
            Ok(())
        }
    }

    /// Append an RFC 5322 date-time
    pub fn add_date(&mut self, date: &DateTime<FixedOffset>) -> Result<()> {
        let year = date.year();
        if !(1900..=9999).contains(&year) {
            return Err(MailEmitError::UnrepresentableValue(format!(
                "the year {year} cannot be expressed in an RFC 5322 date"
            )));
        }
        self.add_text(
            &date.format("%a, %-d %b %Y %H:%M:%S %z").to_string(),
            false,
        )
    }

    /// Append the date for a unix timestamp, as seen from a timezone
    /// `offset_seconds` east of UTC
    pub fn add_timestamp(&mut self, seconds: i64, offset_seconds: i32) -> Result<()> {
        let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
            MailEmitError::UnrepresentableValue(format!(
                "{offset_seconds} seconds is not a valid timezone offset"
            ))
        })?;
        let date = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            MailEmitError::UnrepresentableValue(format!("{seconds} is not a valid timestamp"))
        })?;
        self.add_date(&date.with_timezone(&offset))
    }

    /// Append `; name=value`, using RFC 2231 continuations and
    /// extended values when the value is too long or not ASCII
    pub fn add_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        self.add_text(";", true)?;

        let is_ascii = value.bytes().all(is_printable_ascii);
        if is_ascii || !self.options.use_ascii {
            let token = format!("{name}={}", quote_if_needed(value, PARAM_SPECIALS));
            if !self.options.use_ascii || self.fits(token.len()) {
                return self.add_text(&token, false);
            }
            return self.add_ascii_continuations(name, value);
        }

        let token = format!(
            "{name}*=UTF-8''{}",
            utf8_percent_encode(value, RFC2231_VALUE)
        );
        if self.fits(token.len()) {
            return self.add_text(&token, false);
        }
        self.add_encoded_continuations(name, value)
    }

    /// Octets available on the current line for a continuation value
    /// that follows `prefix_len` octets of `name*N=`, keeping room for
    /// the `;` that introduces the next section
    fn continuation_room(&mut self, prefix_len: usize, first_unit: usize) -> usize {
        self.prefer_fresh_line(prefix_len + first_unit + 1);
        self.options
            .soft_margin
            .saturating_sub(self.line.len() + prefix_len + 1)
    }

    /// `name*0="..."; name*1="..."`, each section quoted on its own
    fn add_ascii_continuations(&mut self, name: &str, value: &str) -> Result<()> {
        let mut remaining = value;
        let mut section = 0;
        while !remaining.is_empty() {
            if section > 0 {
                self.add_text(";", true)?;
            }
            let prefix = format!("{name}*{section}=");
            let room = self.continuation_room(prefix.len(), 1);

            // Value octets may be ASCII only, so chars and bytes agree
            let mut take = 0;
            let mut escapes = 0;
            let mut quoted = false;
            for c in remaining.chars() {
                let quote_now = quoted || PARAM_SPECIALS.contains(c);
                let escapes_now = escapes + usize::from(c == '"' || c == '\\');
                let len = take + 1 + if quote_now { escapes_now + 2 } else { 0 };
                if len > room && take > 0 {
                    break;
                }
                take += 1;
                escapes = escapes_now;
                quoted = quote_now;
            }

            let (chunk, rest) = remaining.split_at(take);
            tracing::trace!(name, section, chunk, "parameter continuation");
            self.add_text(
                &format!("{prefix}{}", quote_if_needed(chunk, PARAM_SPECIALS)),
                false,
            )?;
            remaining = rest;
            section += 1;
        }
        Ok(())
    }

    /// `name*0*=UTF-8''...; name*1*=...`, where sections only end
    /// between the percent-encodings of whole characters
    fn add_encoded_continuations(&mut self, name: &str, value: &str) -> Result<()> {
        let units: Vec<String> = value
            .chars()
            .map(|c| {
                let mut buf = [0u8; 4];
                utf8_percent_encode(c.encode_utf8(&mut buf), RFC2231_VALUE).to_string()
            })
            .collect();

        let mut remaining = units.as_slice();
        let mut section = 0;
        while let Some(first) = remaining.first() {
            if section > 0 {
                self.add_text(";", true)?;
            }
            let prefix = if section == 0 {
                format!("{name}*{section}*=UTF-8''")
            } else {
                format!("{name}*{section}*=")
            };
            let room = self.continuation_room(prefix.len(), first.len());

            let mut take = 0;
            let mut len = 0;
            for unit in remaining {
                if len + unit.len() > room && take > 0 {
                    break;
                }
                len += unit.len();
                take += 1;
            }

            let (chunk, rest) = remaining.split_at(take);
            tracing::trace!(name, section, octets = len, "encoded parameter continuation");
            self.add_text(&format!("{prefix}{}", chunk.concat()), false)?;
            remaining = rest;
            section += 1;
        }
        Ok(())
    }

    fn add_parameters(&mut self, parameters: &MimeParameters) -> Result<()> {
        for param in parameters.iter() {
            self.add_parameter(&param.name, &param.value)?;
        }
        Ok(())
    }

    pub fn add_content_type(&mut self, content_type: &ContentType) -> Result<()> {
        self.add_text(&content_type.essence(), false)?;
        self.add_parameters(&content_type.parameters)
    }

    pub fn add_content_disposition(&mut self, disposition: &ContentDisposition) -> Result<()> {
        self.add_text(disposition.kind.as_str(), false)?;
        self.add_parameters(&disposition.parameters)
    }

    /// Add a complete header, choosing the folding rules from the
    /// kind of value
    pub fn add_structured_header(&mut self, name: &str, value: &HeaderValue) -> Result<()> {
        self.add_header_name(&preferred_spelling(name))?;
        match value {
            HeaderValue::Unstructured(text) => self.add_unstructured(text),
            HeaderValue::Addresses(addresses) => self.add_addresses(addresses),
            HeaderValue::Date(date) => self.add_date(date),
            HeaderValue::ContentType(ct) => self.add_content_type(ct),
            HeaderValue::ContentDisposition(cd) => self.add_content_disposition(cd),
            HeaderValue::Token(token) => self.add_text(token, false),
        }
    }

    /// Returns everything that was added, with each line CRLF terminated
    pub fn finish(mut self) -> String {
        if self.line_has_content() {
            self.commit_line(None);
        }
        self.output
    }
}

/// Fold a single header, returning `Name: value\r\n`
pub fn emit_structured_header(
    name: &str,
    value: &HeaderValue,
    options: &FoldOptions,
) -> Result<String> {
    let mut folder = HeaderFolder::new(options);
    folder.add_structured_header(name, value)?;
    Ok(folder.finish())
}

/// Fold every header in `headers`, in order
pub fn emit_structured_headers(headers: &HeaderMap, options: &FoldOptions) -> Result<String> {
    let mut folder = HeaderFolder::new(options);
    for header in headers.iter() {
        folder.add_structured_header(header.get_name(), header.get_value())?;
    }
    Ok(folder.finish())
}
