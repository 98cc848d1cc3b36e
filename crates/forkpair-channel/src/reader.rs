use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{decode_value, VALUE_WIDTH};
use crate::error::{ChannelError, Result};

const READ_CHUNK_SIZE: usize = 64 * VALUE_WIDTH;

/// Reads fixed-width values from any `Read` stream.
///
/// Short reads are reassembled internally; callers always get whole values.
pub struct ValueReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> ValueReader<T> {
    /// Create a new value reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Read the next value (blocking).
    ///
    /// Returns `Ok(None)` on a clean end-of-stream at a value boundary and
    /// `Err(ChannelError::Truncated)` if the stream ends mid-value.
    pub fn read_value(&mut self) -> Result<Option<i32>> {
        loop {
            if let Some(value) = decode_value(&mut self.buf) {
                return Ok(Some(value));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ChannelError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(ChannelError::Truncated {
                    received: self.buf.len(),
                    expected: VALUE_WIDTH,
                });
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::encode_value;

    /// Yields at most one byte per read call.
    struct Trickle<R>(R);

    impl<R: Read> Read for Trickle<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let len = buf.len().min(1);
            self.0.read(&mut buf[..len])
        }
    }

    /// Fails with `Interrupted` on every other call.
    struct Flaky<R> {
        inner: R,
        interrupt_next: bool,
    }

    impl<R: Read> Read for Flaky<R> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.interrupt_next = !self.interrupt_next;
            if !self.interrupt_next {
                return Err(ErrorKind::Interrupted.into());
            }
            self.inner.read(buf)
        }
    }

    fn wire(values: &[i32]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for v in values {
            encode_value(*v, &mut buf);
        }
        buf.to_vec()
    }

    #[test]
    fn reads_values_until_end_of_stream() {
        let mut reader = ValueReader::new(Cursor::new(wire(&[1, 2, 3])));

        assert_eq!(reader.read_value().unwrap(), Some(1));
        assert_eq!(reader.read_value().unwrap(), Some(2));
        assert_eq!(reader.read_value().unwrap(), Some(3));
        assert_eq!(reader.read_value().unwrap(), None);
    }

    #[test]
    fn empty_stream_is_clean_end() {
        let mut reader = ValueReader::new(Cursor::new(Vec::new()));
        assert_eq!(reader.read_value().unwrap(), None);
    }

    #[test]
    fn reassembles_values_split_across_reads() {
        let mut reader = ValueReader::new(Trickle(Cursor::new(wire(&[40, -7]))));

        assert_eq!(reader.read_value().unwrap(), Some(40));
        assert_eq!(reader.read_value().unwrap(), Some(-7));
        assert_eq!(reader.read_value().unwrap(), None);
    }

    #[test]
    fn partial_trailing_value_is_truncated() {
        let mut bytes = wire(&[5]);
        bytes.extend_from_slice(&[0x01, 0x02]);
        let mut reader = ValueReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_value().unwrap(), Some(5));
        let err = reader.read_value().unwrap_err();
        assert!(matches!(
            err,
            ChannelError::Truncated {
                received: 2,
                expected: VALUE_WIDTH
            }
        ));
    }

    #[test]
    fn retries_interrupted_reads() {
        let mut reader = ValueReader::new(Flaky {
            inner: Cursor::new(wire(&[9, 10])),
            interrupt_next: false,
        });

        assert_eq!(reader.read_value().unwrap(), Some(9));
        assert_eq!(reader.read_value().unwrap(), Some(10));
        assert_eq!(reader.read_value().unwrap(), None);
    }
}
