use crate::HeaderValue;

#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    name: String,
    value: HeaderValue,
}

impl Header {
    pub fn new(name: &str, value: impl Into<HeaderValue>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_value(&self) -> &HeaderValue {
        &self.value
    }
}

/// Represents an ordered set of headers, keyed case-insensitively.
/// Setting a header that is already present replaces its value but
/// keeps its original position. Derefs to the underlying `Vec<Header>`
/// for read access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderMap {
    headers: Vec<Header>,
}

impl std::ops::Deref for HeaderMap {
    type Target = Vec<Header>;
    fn deref(&self) -> &Vec<Header> {
        &self.headers
    }
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|header| header.name.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.position(name).map(|idx| &self.headers[idx].value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn set(&mut self, name: &str, value: impl Into<HeaderValue>) {
        let value = value.into();
        match self.position(name) {
            Some(idx) => self.headers[idx].value = value,
            None => self.headers.push(Header::new(name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.position(name)
            .map(|idx| self.headers.remove(idx).value)
    }
}
