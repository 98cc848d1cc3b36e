use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_value, VALUE_WIDTH};
use crate::error::{ChannelError, Result};

/// Writes fixed-width values to any `Write` stream.
///
/// Each value goes out in a single `write` call. A call that transfers fewer
/// than [`VALUE_WIDTH`] bytes is an error and is not retried.
pub struct ValueWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> ValueWriter<T> {
    /// Create a new value writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(VALUE_WIDTH),
        }
    }

    /// Encode and send one value (blocking).
    pub fn send(&mut self, value: i32) -> Result<()> {
        self.buf.clear();
        encode_value(value, &mut self.buf);

        let written = loop {
            match self.inner.write(&self.buf) {
                Ok(n) => break n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ChannelError::Io(err)),
            }
        };

        if written != VALUE_WIDTH {
            return Err(ChannelError::ShortWrite {
                written,
                expected: VALUE_WIDTH,
            });
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ChannelError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts at most `limit` bytes per write call.
    struct Capped {
        limit: usize,
        data: Vec<u8>,
        calls: usize,
    }

    impl Write for Capped {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.calls += 1;
            let n = buf.len().min(self.limit);
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sends_each_value_in_one_write() {
        let mut writer = ValueWriter::new(Capped {
            limit: usize::MAX,
            data: Vec::new(),
            calls: 0,
        });
        writer.send(1).unwrap();
        writer.send(2).unwrap();

        let sink = writer.into_inner();
        assert_eq!(sink.calls, 2);
        let mut expected = 1i32.to_ne_bytes().to_vec();
        expected.extend_from_slice(&2i32.to_ne_bytes());
        assert_eq!(sink.data, expected);
    }

    #[test]
    fn short_write_is_fatal_and_not_retried() {
        let mut writer = ValueWriter::new(Capped {
            limit: 3,
            data: Vec::new(),
            calls: 0,
        });

        let err = writer.send(42).unwrap_err();
        assert!(matches!(
            err,
            ChannelError::ShortWrite {
                written: 3,
                expected: VALUE_WIDTH
            }
        ));
        assert_eq!(writer.get_ref().calls, 1);
    }

    #[test]
    fn broken_pipe_surfaces_as_io_error() {
        let mut writer = ValueWriter::new(Closed);
        let err = writer.send(1).unwrap_err();
        assert!(matches!(err, ChannelError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }
}
