use crate::{ContentTransferEncoding, MailEmitError, Result};
use chrono::{DateTime, FixedOffset, Utc};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: Option<String>,
    pub email: String,
}

impl Mailbox {
    pub fn new(name: Option<&str>, email: &str) -> Self {
        Self {
            name: name.map(|n| n.to_string()),
            email: email.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Mailbox(Mailbox),
    Group { name: String, entries: Vec<Mailbox> },
}

impl From<Mailbox> for Address {
    fn from(mailbox: Mailbox) -> Self {
        Self::Mailbox(mailbox)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeParameter {
    pub name: String,
    pub value: String,
}

/// The `name=value` parameters of a structured MIME header,
/// in insertion order. Names are matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeParameters {
    parameters: Vec<MimeParameter>,
}

impl MimeParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .map(|p| p.value.as_str())
    }

    /// Set the value of a parameter. An existing parameter keeps
    /// its position.
    pub fn set(&mut self, name: &str, value: &str) {
        match self
            .parameters
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
        {
            Some(p) => p.value = value.to_string(),
            None => self.parameters.push(MimeParameter {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.parameters
            .retain(|p| !p.name.eq_ignore_ascii_case(name));
    }

    pub fn iter(&self) -> impl Iterator<Item = &MimeParameter> {
        self.parameters.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?=".contains(&b))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// The top level type, such as `text`, in lowercase
    pub media_type: String,
    pub subtype: String,
    pub parameters: MimeParameters,
}

impl ContentType {
    pub fn new(media_type: &str, subtype: &str) -> Self {
        Self {
            media_type: media_type.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters: MimeParameters::new(),
        }
    }

    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters.set(name, value);
        self
    }

    pub fn is_multipart(&self) -> bool {
        self.media_type == "multipart"
    }

    pub fn is_text(&self) -> bool {
        self.media_type == "text"
    }

    /// `type/subtype`, without parameters
    pub fn essence(&self) -> String {
        format!("{}/{}", self.media_type, self.subtype)
    }
}

/// Accepts only the bare `type/subtype` form; parameters
/// are supplied through `MimeParameters`.
impl FromStr for ContentType {
    type Err = MailEmitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().split_once('/') {
            Some((media_type, subtype)) if is_token(media_type) && is_token(subtype) => {
                Ok(Self::new(media_type, subtype))
            }
            _ => Err(MailEmitError::InputShape(format!(
                "{s:?} is not a type/subtype content type"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispositionKind {
    Inline,
    Attachment,
    Other(String),
}

impl DispositionKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Inline => "inline",
            Self::Attachment => "attachment",
            Self::Other(kind) => kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDisposition {
    pub kind: DispositionKind,
    pub parameters: MimeParameters,
}

impl ContentDisposition {
    pub fn new(kind: DispositionKind) -> Self {
        Self {
            kind,
            parameters: MimeParameters::new(),
        }
    }

    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.parameters.set(name, value);
        self
    }
}

impl FromStr for ContentDisposition {
    type Err = MailEmitError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let kind = if s.eq_ignore_ascii_case("inline") {
            DispositionKind::Inline
        } else if s.eq_ignore_ascii_case("attachment") {
            DispositionKind::Attachment
        } else if is_token(s) {
            DispositionKind::Other(s.to_ascii_lowercase())
        } else {
            return Err(MailEmitError::InputShape(format!(
                "{s:?} is not a disposition type"
            )));
        };
        Ok(Self::new(kind))
    }
}

/// An already-structured header value, ready to be folded
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// Free text, RFC 2047 encoded as needed
    Unstructured(String),
    Addresses(Vec<Address>),
    Date(DateTime<FixedOffset>),
    ContentType(ContentType),
    ContentDisposition(ContentDisposition),
    /// Emitted verbatim, eg: `1.0` or `<id@example.com>`
    Token(String),
}

impl HeaderValue {
    /// The textual value of an unstructured or token header
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Unstructured(s) | Self::Token(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for HeaderValue {
    fn from(s: &str) -> Self {
        Self::Unstructured(s.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        Self::Unstructured(s)
    }
}

impl From<Mailbox> for HeaderValue {
    fn from(mailbox: Mailbox) -> Self {
        Self::Addresses(vec![mailbox.into()])
    }
}

impl From<Address> for HeaderValue {
    fn from(address: Address) -> Self {
        Self::Addresses(vec![address])
    }
}

impl From<Vec<Address>> for HeaderValue {
    fn from(addresses: Vec<Address>) -> Self {
        Self::Addresses(addresses)
    }
}

impl From<Vec<Mailbox>> for HeaderValue {
    fn from(mailboxes: Vec<Mailbox>) -> Self {
        Self::Addresses(mailboxes.into_iter().map(Address::Mailbox).collect())
    }
}

impl From<DateTime<FixedOffset>> for HeaderValue {
    fn from(date: DateTime<FixedOffset>) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<Utc>> for HeaderValue {
    fn from(date: DateTime<Utc>) -> Self {
        Self::Date(date.into())
    }
}

impl From<ContentType> for HeaderValue {
    fn from(ct: ContentType) -> Self {
        Self::ContentType(ct)
    }
}

impl From<ContentDisposition> for HeaderValue {
    fn from(cd: ContentDisposition) -> Self {
        Self::ContentDisposition(cd)
    }
}

impl From<ContentTransferEncoding> for HeaderValue {
    fn from(cte: ContentTransferEncoding) -> Self {
        Self::Token(cte.as_str().to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn content_type_from_str() {
        let ct: ContentType = "Text/HTML".parse().unwrap();
        k9::assert_equal!(ct, ContentType::new("text", "html"));
        k9::assert_equal!(ct.essence(), "text/html");
        assert!(ct.is_text());
        assert!(!ct.is_multipart());
        assert!(" multipart/mixed ".parse::<ContentType>().unwrap().is_multipart());

        for bad in ["text", "text/", "/plain", "text/plain; charset=utf-8", "te xt/plain"] {
            assert!(
                matches!(bad.parse::<ContentType>(), Err(MailEmitError::InputShape(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn parameters_keep_their_position() {
        let mut params = MimeParameters::new();
        params.set("charset", "us-ascii");
        params.set("format", "flowed");
        params.set("CHARSET", "UTF-8");
        k9::assert_equal!(params.get("Charset"), Some("UTF-8"));
        let names: Vec<&str> = params.iter().map(|p| p.name.as_str()).collect();
        k9::assert_equal!(names, vec!["charset", "format"]);

        params.remove("charset");
        k9::assert_equal!(params.get("charset"), None);
        assert!(!params.is_empty());
    }

    #[test]
    fn disposition_from_str() {
        k9::assert_equal!(
            "Attachment".parse::<ContentDisposition>().unwrap().kind,
            DispositionKind::Attachment
        );
        k9::assert_equal!(
            "x-custom".parse::<ContentDisposition>().unwrap().kind.as_str(),
            "x-custom"
        );
        assert!("not a token".parse::<ContentDisposition>().is_err());
    }
}
