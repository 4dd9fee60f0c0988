use crate::sink::NestedSink;
use crate::{
    alphabet, decide_transfer_encoding, normalize_line_endings, ContentDisposition, ContentType,
    DispositionKind, EmitSink, EncodingStats, FoldOptions, HeaderFolder, HeaderMap, HeaderValue,
    MailEmitError, Result, TransferEncoder,
};
use serde::{Deserialize, Serialize};

const CONTENT_TYPE: &str = "Content-Type";
const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
const CONTENT_DISPOSITION: &str = "Content-Disposition";

/// The content of a leaf part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    Bytes(Vec<u8>),
    /// Text is sent as UTF-8 with CRLF line endings
    Text(String),
}

impl Body {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(b) => b,
            Self::Text(t) => t.as_bytes(),
        }
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&[u8]> for Body {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PartBody {
    Leaf(Body),
    Children(Vec<MimePart>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartState {
    /// Headers, body and children may still be changed
    Building,
    /// Output has started; the part is frozen
    Streaming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentOptions {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub inline: bool,
    #[serde(default)]
    pub content_id: Option<String>,
}

/// A MIME part under construction. Headers, a body or child parts are
/// added while it is being built; `write_output` then serializes the
/// whole tree, after which the part can no longer be changed.
#[derive(Debug, Clone, PartialEq)]
pub struct MimePart {
    content_type: ContentType,
    /// Every header other than Content-Type, in insertion order
    headers: HeaderMap,
    body: Option<PartBody>,
    state: PartState,
}

fn generate_boundary() -> String {
    let payload: [u8; 15] = rand::random();
    format!("--_:{}_--", alphabet::encode(&payload))
}

impl MimePart {
    pub fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            headers: HeaderMap::new(),
            body: None,
            state: PartState::Building,
        }
    }

    /// Constructs a new part with textual content
    pub fn new_text(content_type: &str, content: &str) -> Result<Self> {
        let mut part = Self::new(content_type.parse()?);
        part.set_body(content)?;
        Ok(part)
    }

    pub fn new_text_plain(content: &str) -> Result<Self> {
        Self::new_text("text/plain", content)
    }

    pub fn new_html(content: &str) -> Result<Self> {
        Self::new_text("text/html", content)
    }

    /// Constructs a multipart part from `parts`. When `boundary` is
    /// `None`, a random boundary is generated when the part is written.
    pub fn new_multipart(
        content_type: &str,
        parts: Vec<Self>,
        boundary: Option<&str>,
    ) -> Result<Self> {
        let mut ct: ContentType = content_type.parse()?;
        if let Some(boundary) = boundary {
            ct.parameters.set("boundary", boundary);
        }
        let mut part = Self::new(ct);
        for child in parts {
            part.add_child(child)?;
        }
        Ok(part)
    }

    /// Constructs a part holding arbitrary bytes, such as an attachment
    pub fn new_binary(
        content_type: &str,
        content: &[u8],
        options: Option<&AttachmentOptions>,
    ) -> Result<Self> {
        let mut ct: ContentType = content_type.parse()?;
        let mut disposition = None;
        let mut content_id = None;

        if let Some(opts) = options {
            let mut cd = ContentDisposition::new(if opts.inline {
                DispositionKind::Inline
            } else {
                DispositionKind::Attachment
            });
            if let Some(name) = &opts.file_name {
                cd.parameters.set("filename", name);
                ct.parameters.set("name", name);
            }
            disposition.replace(cd);
            content_id = opts.content_id.as_ref().map(|id| format!("<{id}>"));
        }

        let mut part = Self::new(ct);
        if let Some(cd) = disposition {
            part.add_header(CONTENT_DISPOSITION, cd)?;
        }
        if let Some(id) = content_id {
            part.add_header("Content-ID", HeaderValue::Token(id))?;
        }
        part.set_body(content)?;
        Ok(part)
    }

    pub fn content_type(&self) -> &ContentType {
        &self.content_type
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the child parts of a multipart part
    pub fn children(&self) -> &[MimePart] {
        match &self.body {
            Some(PartBody::Children(children)) => children,
            _ => &[],
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.state == PartState::Streaming
    }

    fn ensure_building(&self) -> Result<()> {
        match self.state {
            PartState::Building => Ok(()),
            PartState::Streaming => Err(MailEmitError::ProtocolViolation(
                "the part cannot be changed once it is being written",
            )),
        }
    }

    /// Set a header, replacing any existing header with the same name.
    /// Content-Type may be given as a `ContentType` or a `type/subtype`
    /// string, and may only be changed until a body or child is present.
    pub fn add_header(&mut self, name: &str, value: impl Into<HeaderValue>) -> Result<()> {
        self.ensure_building()?;
        let value = value.into();

        if name.eq_ignore_ascii_case(CONTENT_TYPE) {
            if self.body.is_some() {
                return Err(MailEmitError::ProtocolViolation(
                    "Content-Type cannot be changed once a body or child part is present",
                ));
            }
            self.content_type = match value {
                HeaderValue::ContentType(ct) => ct,
                HeaderValue::Unstructured(s) | HeaderValue::Token(s) => s.parse()?,
                other => {
                    return Err(MailEmitError::InputShape(format!(
                        "Content-Type cannot be set from {other:?}"
                    )))
                }
            };
            return Ok(());
        }

        let value = if name.eq_ignore_ascii_case(CONTENT_DISPOSITION) {
            match value {
                HeaderValue::Unstructured(s) | HeaderValue::Token(s) => {
                    HeaderValue::ContentDisposition(s.parse()?)
                }
                value @ HeaderValue::ContentDisposition(_) => value,
                other => {
                    return Err(MailEmitError::InputShape(format!(
                        "Content-Disposition cannot be set from {other:?}"
                    )))
                }
            }
        } else {
            value
        };

        self.headers.set(name, value);
        Ok(())
    }

    pub fn add_headers<I, N, V>(&mut self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<HeaderValue>,
    {
        for (name, value) in headers {
            self.add_header(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Append a child part; only valid for multipart content types
    pub fn add_child(&mut self, child: MimePart) -> Result<()> {
        self.ensure_building()?;
        if !self.content_type.is_multipart() {
            return Err(MailEmitError::ProtocolViolation(
                "child parts can only be added to a multipart part",
            ));
        }
        match &mut self.body {
            Some(PartBody::Children(children)) => children.push(child),
            Some(PartBody::Leaf(_)) => {
                return Err(MailEmitError::ProtocolViolation(
                    "a part cannot have both a body and child parts",
                ))
            }
            None => self.body = Some(PartBody::Children(vec![child])),
        }
        Ok(())
    }

    /// Set the body of a leaf part, replacing any previous body
    pub fn set_body(&mut self, body: impl Into<Body>) -> Result<()> {
        self.ensure_building()?;
        if self.content_type.is_multipart() {
            return Err(MailEmitError::ProtocolViolation(
                "a multipart part cannot have a body",
            ));
        }
        self.body = Some(PartBody::Leaf(body.into()));
        Ok(())
    }

    /// Serialize the part, and any children, to `sink`.
    /// The end of the stream is signalled once everything is written.
    pub fn write_output<S: EmitSink + ?Sized>(
        &mut self,
        sink: &mut S,
        options: &FoldOptions,
    ) -> Result<()> {
        let options = options.validated();
        self.write_part(sink, &options)?;
        sink.deliver_eof()
    }

    /// Convenience method wrapping write_output that returns
    /// the formatted message bytes
    pub fn to_message_bytes(&mut self, options: &FoldOptions) -> Result<Vec<u8>> {
        let mut out = vec![];
        self.write_output(&mut out, options)?;
        Ok(out)
    }

    fn write_part<S: EmitSink + ?Sized>(&mut self, sink: &mut S, options: &FoldOptions) -> Result<()> {
        if self.state == PartState::Streaming {
            return Err(MailEmitError::ProtocolViolation(
                "the part has already been written",
            ));
        }
        let is_multipart = match &self.body {
            Some(PartBody::Children(_)) => true,
            Some(PartBody::Leaf(_)) => false,
            None => {
                return Err(MailEmitError::InputShape(
                    "MIME parts need either a body or a child part".to_string(),
                ))
            }
        };
        self.state = PartState::Streaming;

        if is_multipart {
            self.write_multipart(sink, options)
        } else {
            self.write_leaf(sink, options)
        }
    }

    fn write_headers<S: EmitSink + ?Sized>(&self, sink: &mut S, options: &FoldOptions) -> Result<()> {
        let mut folder = HeaderFolder::new(options);
        folder.add_header_name(CONTENT_TYPE)?;
        folder.add_content_type(&self.content_type)?;
        for header in self.headers.iter() {
            folder.add_structured_header(header.get_name(), header.get_value())?;
        }
        sink.deliver_data(folder.finish().as_bytes())?;
        sink.deliver_data(b"\r\n")
    }

    fn write_multipart<S: EmitSink + ?Sized>(
        &mut self,
        sink: &mut S,
        options: &FoldOptions,
    ) -> Result<()> {
        if self.headers.contains(CONTENT_TRANSFER_ENCODING) {
            return Err(MailEmitError::ProtocolViolation(
                "multipart parts cannot have a Content-Transfer-Encoding",
            ));
        }

        let boundary = match self.content_type.parameters.get("boundary") {
            Some(boundary) => boundary.to_string(),
            None => {
                let boundary = generate_boundary();
                tracing::debug!(%boundary, "generated multipart boundary");
                self.content_type.parameters.set("boundary", &boundary);
                boundary
            }
        };

        self.write_headers(sink, options)?;

        if let Some(PartBody::Children(children)) = &mut self.body {
            for child in children.iter_mut() {
                sink.deliver_data(format!("\r\n--{boundary}\r\n").as_bytes())?;
                child.write_part(sink, options)?;
            }
        }
        sink.deliver_data(format!("\r\n--{boundary}--\r\n").as_bytes())
    }

    fn write_leaf<S: EmitSink + ?Sized>(&mut self, sink: &mut S, options: &FoldOptions) -> Result<()> {
        if let Some(PartBody::Leaf(Body::Text(text))) = &mut self.body {
            if !self.content_type.is_text() {
                return Err(MailEmitError::InputShape(format!(
                    "a text body requires a text/* content type, not {}",
                    self.content_type.essence()
                )));
            }
            if let Some(charset) = self.content_type.parameters.get("charset") {
                if !charset.eq_ignore_ascii_case("utf-8") {
                    return Err(MailEmitError::InputShape(format!(
                        "text bodies are sent as UTF-8, but the charset is {charset}"
                    )));
                }
            }
            *text = normalize_line_endings(text);
            self.content_type.parameters.set("charset", "UTF-8");
        }

        let explicit = match self.headers.get(CONTENT_TRANSFER_ENCODING) {
            None => None,
            Some(value) => Some(
                value
                    .as_text()
                    .ok_or_else(|| {
                        MailEmitError::InputShape(format!(
                            "{CONTENT_TRANSFER_ENCODING} must be a token, not {value:?}"
                        ))
                    })?
                    .to_string(),
            ),
        };
        let stats = EncodingStats::compute(self.body_bytes());
        let encoding = decide_transfer_encoding(&stats, options, explicit.as_deref())?;
        self.headers.set(CONTENT_TRANSFER_ENCODING, encoding);

        self.write_headers(sink, options)?;

        let mut encoder = TransferEncoder::new(encoding, NestedSink::new(sink));
        encoder.deliver_data(self.body_bytes())?;
        encoder.deliver_eof()
    }

    fn body_bytes(&self) -> &[u8] {
        match &self.body {
            Some(PartBody::Leaf(body)) => body.as_bytes(),
            _ => &[],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Address, Mailbox};

    fn write(part: &mut MimePart) -> String {
        String::from_utf8(part.to_message_bytes(&FoldOptions::default()).unwrap()).unwrap()
    }

    fn text_part(body: &str) -> MimePart {
        let mut part = MimePart::new(ContentType::new("text", "plain"));
        part.set_body(body).unwrap();
        part
    }

    struct CountingSink {
        data: Vec<u8>,
        eofs: usize,
    }

    impl EmitSink for CountingSink {
        fn deliver_data(&mut self, data: &[u8]) -> Result<()> {
            assert_eq!(self.eofs, 0, "data delivered after end of stream");
            self.data.extend_from_slice(data);
            Ok(())
        }

        fn deliver_eof(&mut self) -> Result<()> {
            self.eofs += 1;
            Ok(())
        }
    }

    #[test]
    fn plain_text() {
        k9::assert_equal!(
            write(&mut text_part("This is some text.\r\n")),
            "Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             This is some text.\r\n"
        );
    }

    #[test]
    fn nul_and_crlf_as_base64() {
        let mut part = MimePart::new(ContentType::new("application", "octet-stream"));
        part.set_body(&b"\0\r\n"[..]).unwrap();
        k9::assert_equal!(
            write(&mut part),
            "Content-Type: application/octet-stream\r\n\
             Content-Transfer-Encoding: base64\r\n\
             \r\n\
             AA0K\r\n"
        );
    }

    #[test]
    fn text_bodies() {
        k9::assert_equal!(
            write(&mut text_part("Text\nthat\r\nneeds\rconverting\n")),
            "Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             Text\r\nthat\r\nneeds\r\nconverting\r\n"
        );
        k9::assert_equal!(
            write(&mut text_part("dioxyg\u{e8}ne\r\n")),
            "Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n\
             dioxyg\u{e8}ne\r\n"
        );
        k9::assert_equal!(
            write(&mut text_part("\0Text with null\r\n")),
            "Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             =00Text with null\r\n"
        );

        let mut html = MimePart::new_html("<blink>\u{1f4a9}</blink>\n").unwrap();
        k9::assert_equal!(
            write(&mut html),
            "Content-Type: text/html; charset=UTF-8\r\n\
             Content-Transfer-Encoding: 8bit\r\n\
             \r\n\
             <blink>\u{1f4a9}</blink>\r\n"
        );

        let mut part = MimePart::new(ContentType::new("text", "plain").with_parameter("charset", "utf-8"));
        part.set_body("ok").unwrap();
        k9::assert_equal!(
            write(&mut part),
            "Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             ok"
        );
    }

    #[test]
    fn explicit_transfer_encoding() {
        let mut part = text_part("h\u{e9}llo\r\n");
        part.add_header("content-transfer-encoding", "Quoted-Printable")
            .unwrap();
        k9::assert_equal!(
            write(&mut part),
            "Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: quoted-printable\r\n\
             \r\n\
             h=C3=A9llo\r\n"
        );

        let mut part = text_part("hello");
        part.add_header("Content-Transfer-Encoding", "x-rot13").unwrap();
        assert!(matches!(
            part.to_message_bytes(&FoldOptions::default()),
            Err(MailEmitError::UnrepresentableValue(_))
        ));
    }

    #[test]
    fn raw_bytes_are_preserved() {
        let data = b"bare\nnewlines\rand\0nul\r\n".to_vec();
        let mut part = MimePart::new(ContentType::new("application", "x-raw"));
        part.set_body(data.clone()).unwrap();
        let opts = FoldOptions {
            allow_binary: true,
            ..Default::default()
        };
        let output = part.to_message_bytes(&opts).unwrap();
        let header = b"Content-Type: application/x-raw\r\n\
                       Content-Transfer-Encoding: binary\r\n\
                       \r\n";
        k9::assert_equal!(output, [&header[..], &data[..]].concat());
    }

    #[test]
    fn multipart_with_boundary() {
        let mut part = MimePart::new_multipart(
            "multipart/mixed",
            vec![
                MimePart::new_text_plain("Hello").unwrap(),
                MimePart::new_html("<b>Hi</b>").unwrap(),
            ],
            Some("simple"),
        )
        .unwrap();
        part.add_header("Subject", "Greetings").unwrap();
        k9::assert_equal!(
            write(&mut part),
            "Content-Type: multipart/mixed; boundary=simple\r\n\
             Subject: Greetings\r\n\
             \r\n\
             \r\n--simple\r\n\
             Content-Type: text/plain; charset=UTF-8\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             Hello\
             \r\n--simple\r\n\
             Content-Type: text/html; charset=UTF-8\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             <b>Hi</b>\
             \r\n--simple--\r\n"
        );
        assert!(part.is_streaming());
        assert!(part.children().iter().all(|child| child.is_streaming()));
    }

    #[test_log::test]
    fn generated_boundary() {
        let mut inner = MimePart::new(ContentType::new("multipart", "alternative"));
        inner.add_child(text_part("plain")).unwrap();
        inner.add_child(MimePart::new_html("<i>html</i>").unwrap()).unwrap();

        let mut outer = MimePart::new(ContentType::new("multipart", "mixed"));
        outer.add_child(inner).unwrap();
        outer
            .add_child(MimePart::new_binary("image/png", b"\x89PNG\r\n\x1a\n", None).unwrap())
            .unwrap();

        let mut sink = CountingSink {
            data: vec![],
            eofs: 0,
        };
        outer.write_output(&mut sink, &FoldOptions::default()).unwrap();
        k9::assert_equal!(sink.eofs, 1);

        let boundary = outer
            .content_type()
            .parameters
            .get("boundary")
            .unwrap()
            .to_string();
        assert!(boundary.starts_with("--_:") && boundary.ends_with("_--"));
        k9::assert_equal!(boundary.len(), 4 + 20 + 3);

        let output = String::from_utf8(sink.data).unwrap();
        assert!(output.starts_with(&format!(
            "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
        )));
        assert!(output.ends_with(&format!("\r\n--{boundary}--\r\n")));
        k9::assert_equal!(output.matches(&format!("\r\n--{boundary}\r\n")).count(), 2);

        let inner_boundary = outer.children()[0]
            .content_type()
            .parameters
            .get("boundary")
            .unwrap()
            .to_string();
        assert_ne!(boundary, inner_boundary);
        k9::assert_equal!(
            output
                .matches(&format!("\r\n--{inner_boundary}\r\n"))
                .count(),
            2
        );
        assert!(output.contains("Content-Transfer-Encoding: base64\r\n\r\niVBORw0KGgo=\r\n"));
    }

    #[test]
    fn structured_headers() {
        let mut part = text_part("Hi");
        part.add_headers([
            (
                "From",
                HeaderValue::from(Mailbox::new(Some("Jos\u{e9} Garcia"), "jose@example.com")),
            ),
            (
                "to",
                HeaderValue::from(vec![
                    Address::Mailbox(Mailbox::new(None, "a@example.com")),
                    Address::Group {
                        name: "Friends".to_string(),
                        entries: vec![Mailbox::new(Some("Bob"), "bob@example.com")],
                    },
                ]),
            ),
            ("subject", HeaderValue::from("Qu\u{e9} tal?")),
            ("message-id", HeaderValue::Token("<1234@example.com>".to_string())),
        ])
        .unwrap();
        k9::assert_equal!(
            write(&mut part),
            "Content-Type: text/plain; charset=UTF-8\r\n\
             From: =?UTF-8?Q?Jos=C3=A9_Garcia?= <jose@example.com>\r\n\
             To: a@example.com, Friends: Bob <bob@example.com>;\r\n\
             Subject: =?UTF-8?Q?Qu=C3=A9?= tal?\r\n\
             Message-ID: <1234@example.com>\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             Hi"
        );
    }

    #[test]
    fn content_type_rules() {
        let mut part = MimePart::new(ContentType::new("text", "plain"));
        part.add_header("Content-Type", "text/html").unwrap();
        k9::assert_equal!(part.content_type().essence(), "text/html");

        assert!(matches!(
            part.add_header("content-type", "text"),
            Err(MailEmitError::InputShape(_))
        ));

        part.set_body("<p>hi</p>").unwrap();
        assert!(matches!(
            part.add_header("Content-Type", "text/plain"),
            Err(MailEmitError::ProtocolViolation(_))
        ));
        // Other headers are fine until the part is written
        part.add_header("Content-Disposition", "inline").unwrap();
        k9::assert_equal!(
            part.headers().get("content-disposition"),
            Some(&HeaderValue::ContentDisposition(ContentDisposition::new(
                DispositionKind::Inline
            )))
        );
    }

    #[test]
    fn lifecycle_violations() {
        let mut multi = MimePart::new(ContentType::new("multipart", "mixed"));
        assert!(matches!(
            multi.set_body("text"),
            Err(MailEmitError::ProtocolViolation(_))
        ));

        let mut leaf = text_part("text");
        assert!(matches!(
            leaf.add_child(text_part("child")),
            Err(MailEmitError::ProtocolViolation(_))
        ));

        write(&mut leaf);
        assert!(leaf.is_streaming());
        assert!(matches!(
            leaf.add_header("Subject", "late"),
            Err(MailEmitError::ProtocolViolation(_))
        ));
        assert!(matches!(
            leaf.set_body("late"),
            Err(MailEmitError::ProtocolViolation(_))
        ));
        assert!(matches!(
            leaf.to_message_bytes(&FoldOptions::default()),
            Err(MailEmitError::ProtocolViolation(_))
        ));

        multi.add_child(text_part("child")).unwrap();
        multi
            .add_header("Content-Transfer-Encoding", "base64")
            .unwrap();
        assert!(matches!(
            multi.to_message_bytes(&FoldOptions::default()),
            Err(MailEmitError::ProtocolViolation(_))
        ));
    }

    #[test]
    fn input_shape_errors() {
        let mut empty = MimePart::new(ContentType::new("text", "plain"));
        assert!(matches!(
            empty.to_message_bytes(&FoldOptions::default()),
            Err(MailEmitError::InputShape(_))
        ));

        let mut image = MimePart::new(ContentType::new("image", "png"));
        image.set_body("not really a png").unwrap();
        assert!(matches!(
            image.to_message_bytes(&FoldOptions::default()),
            Err(MailEmitError::InputShape(_))
        ));

        let mut latin1 = MimePart::new(
            ContentType::new("text", "plain").with_parameter("charset", "iso-8859-1"),
        );
        latin1.set_body("caf\u{e9}").unwrap();
        assert!(matches!(
            latin1.to_message_bytes(&FoldOptions::default()),
            Err(MailEmitError::InputShape(_))
        ));

        assert!(matches!(
            MimePart::new_text("plain", "text"),
            Err(MailEmitError::InputShape(_))
        ));
    }

    #[test]
    fn attachment_options() {
        let opts: AttachmentOptions = serde_json::from_str(
            r#"{"file_name": "résumé.pdf", "content_id": "cv@example.com"}"#,
        )
        .unwrap();
        let mut part = MimePart::new_binary("application/pdf", b"%PDF-1.4", Some(&opts)).unwrap();
        k9::assert_equal!(
            write(&mut part),
            "Content-Type: application/pdf; name*=UTF-8''r%C3%A9sum%C3%A9.pdf\r\n\
             Content-Disposition: attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf\r\n\
             Content-ID: <cv@example.com>\r\n\
             Content-Transfer-Encoding: 7bit\r\n\
             \r\n\
             %PDF-1.4"
        );
    }
}
