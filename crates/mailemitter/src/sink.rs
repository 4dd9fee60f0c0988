use crate::Result;
use std::io::Write;

/// Receives the serialized output of an emission, in order.
/// `deliver_eof` is called exactly once, after the last data.
pub trait EmitSink {
    fn deliver_data(&mut self, data: &[u8]) -> Result<()>;
    fn deliver_eof(&mut self) -> Result<()>;
}

impl<S: EmitSink + ?Sized> EmitSink for &mut S {
    fn deliver_data(&mut self, data: &[u8]) -> Result<()> {
        (**self).deliver_data(data)
    }

    fn deliver_eof(&mut self) -> Result<()> {
        (**self).deliver_eof()
    }
}

impl EmitSink for Vec<u8> {
    fn deliver_data(&mut self, data: &[u8]) -> Result<()> {
        self.extend_from_slice(data);
        Ok(())
    }

    fn deliver_eof(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Adapts any `std::io::Write` into an `EmitSink`.
/// The end of the stream flushes the writer.
pub struct WriteSink<W> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> EmitSink for WriteSink<W> {
    fn deliver_data(&mut self, data: &[u8]) -> Result<()> {
        self.inner.write_all(data)?;
        Ok(())
    }

    fn deliver_eof(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}

/// Shares a sink between nested emissions: data is forwarded,
/// but the end of the stream is left for the outermost writer.
pub(crate) struct NestedSink<'a, S: ?Sized> {
    inner: &'a mut S,
}

impl<'a, S: EmitSink + ?Sized> NestedSink<'a, S> {
    pub fn new(inner: &'a mut S) -> Self {
        Self { inner }
    }
}

impl<S: EmitSink + ?Sized> EmitSink for NestedSink<'_, S> {
    fn deliver_data(&mut self, data: &[u8]) -> Result<()> {
        self.inner.deliver_data(data)
    }

    fn deliver_eof(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn write_sink() {
        let mut sink = WriteSink::new(vec![]);
        sink.deliver_data(b"hello ").unwrap();
        sink.deliver_data(b"there").unwrap();
        sink.deliver_eof().unwrap();
        k9::assert_equal!(sink.into_inner(), b"hello there".to_vec());
    }

    #[test]
    fn nested_swallows_eof() {
        struct Counting {
            data: Vec<u8>,
            eofs: usize,
        }
        impl EmitSink for Counting {
            fn deliver_data(&mut self, data: &[u8]) -> Result<()> {
                self.data.extend_from_slice(data);
                Ok(())
            }
            fn deliver_eof(&mut self) -> Result<()> {
                self.eofs += 1;
                Ok(())
            }
        }

        let mut sink = Counting {
            data: vec![],
            eofs: 0,
        };
        {
            let mut nested = NestedSink::new(&mut sink);
            nested.deliver_data(b"inner").unwrap();
            nested.deliver_eof().unwrap();
        }
        k9::assert_equal!(sink.eofs, 0);
        k9::assert_equal!(sink.data, b"inner".to_vec());
    }
}
