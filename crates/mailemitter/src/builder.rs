use crate::{AttachmentOptions, HeaderMap, HeaderValue, MailEmitError, MimePart, Result};

/// Convenience layer over `MimePart` for the common message shapes:
/// text and/or html bodies with optional inline parts and attachments.
/// Derefs to the `HeaderMap` that is applied to the top level part.
#[derive(Default)]
pub struct MessageBuilder {
    text: Option<String>,
    html: Option<String>,
    headers: HeaderMap,
    inline: Vec<MimePart>,
    attached: Vec<MimePart>,
    stable_boundaries: bool,
}

impl MessageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use fixed boundary strings, so that the output is reproducible
    pub fn set_stable_boundaries(&mut self, v: bool) {
        self.stable_boundaries = v;
    }

    pub fn text_plain(&mut self, text: &str) {
        self.text.replace(text.to_string());
    }

    pub fn text_html(&mut self, html: &str) {
        self.html.replace(html.to_string());
    }

    pub fn set_header(&mut self, name: &str, value: impl Into<HeaderValue>) {
        self.headers.set(name, value);
    }

    pub fn attach(
        &mut self,
        content_type: &str,
        data: &[u8],
        opts: Option<&AttachmentOptions>,
    ) -> Result<()> {
        let is_inline = opts.map(|opt| opt.inline).unwrap_or(false);

        let part = MimePart::new_binary(content_type, data, opts)?;

        if is_inline {
            self.inline.push(part);
        } else {
            self.attached.push(part);
        }
        Ok(())
    }

    pub fn build(self) -> Result<MimePart> {
        let stable = self.stable_boundaries;
        let boundary = |name: &'static str| stable.then_some(name);

        let text = self.text.as_deref().map(MimePart::new_text_plain).transpose()?;
        let html = self.html.as_deref().map(MimePart::new_html).transpose()?;

        let content_node = match (text, html) {
            (Some(t), Some(h)) => MimePart::new_multipart(
                "multipart/alternative",
                vec![t, h],
                boundary("ma-boundary"),
            )?,
            (Some(t), None) => t,
            (None, Some(h)) => h,
            (None, None) => {
                return Err(MailEmitError::InputShape(
                    "no text or html part was specified".to_string(),
                ))
            }
        };

        let content_node = if !self.inline.is_empty() {
            let mut parts = Vec::with_capacity(self.inline.len() + 1);
            parts.push(content_node);
            parts.extend(self.inline);
            MimePart::new_multipart(
                "multipart/related",
                parts,
                boundary("mr-boundary"),
            )?
        } else {
            content_node
        };

        let mut root = if !self.attached.is_empty() {
            let mut parts = Vec::with_capacity(self.attached.len() + 1);
            parts.push(content_node);
            parts.extend(self.attached);
            MimePart::new_multipart("multipart/mixed", parts, boundary("mm-boundary"))?
        } else {
            content_node
        };

        for header in self.headers.iter() {
            root.add_header(header.get_name(), header.get_value().clone())?;
        }

        if !root.headers().contains("MIME-Version") {
            root.add_header("MIME-Version", HeaderValue::Token("1.0".to_string()))?;
        }

        Ok(root)
    }
}

impl std::ops::Deref for MessageBuilder {
    type Target = HeaderMap;
    fn deref(&self) -> &HeaderMap {
        &self.headers
    }
}

impl std::ops::DerefMut for MessageBuilder {
    fn deref_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
}
